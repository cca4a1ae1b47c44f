pub mod telegram;

use crate::db::ChannelStore;
use crate::error::{JobError, StoreError};
use crate::models::Channel;
use crate::services::analyzer::Analyzer;
use crate::services::job_runner::{fetch_and_analyze, UNKNOWN_CHANNEL_NAME};
use crate::services::youtube::{VideoSource, RECENT_WINDOW_DAYS};
use crate::utils::truncate_utf16;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use telegram::{
    CallbackQuery, InlineKeyboardButton, InlineKeyboardMarkup, Message, TelegramClient, Update,
    MAX_MESSAGE_LEN,
};

/// Pause after a failed `getUpdates` before polling again.
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

#[derive(Debug, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            keyboard: None,
        }
    }
}

/// `/start` and `/start@SomeBot` both count.
pub fn is_start_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .is_some_and(|command| command == "/start" || command.starts_with("/start@"))
}

pub fn start_reply(channels: Result<Vec<Channel>, StoreError>) -> Reply {
    match channels {
        Ok(channels) if channels.is_empty() => Reply::text(
            "No se encontraron canales en la base de datos. Añade alguno con el comando `channels add`.",
        ),
        Ok(channels) => {
            let inline_keyboard = channels
                .into_iter()
                .map(|channel| {
                    vec![InlineKeyboardButton {
                        text: channel.channel_name,
                        callback_data: channel.channel_id,
                    }]
                })
                .collect();
            Reply {
                text: "¡Hola! Selecciona un canal para analizar:".to_string(),
                keyboard: Some(InlineKeyboardMarkup { inline_keyboard }),
            }
        }
        Err(e) => Reply::text(format!("Error al conectar con la base de datos: {e}")),
    }
}

pub fn analysis_reply(channel_name: &str, outcome: Result<String, JobError>) -> String {
    let text = match outcome {
        Ok(analysis) => analysis,
        Err(JobError::NoVideos(_)) => format!(
            "No se encontraron videos recientes (últimos {RECENT_WINDOW_DAYS} días) para '{channel_name}'."
        ),
        Err(e) => format!("Lo siento, ocurrió un error inesperado. Detalles: {e}"),
    };
    truncate_utf16(&text, MAX_MESSAGE_LEN)
}

/// Long-polling Telegram front end. Each button press runs the whole
/// fetch-and-analyze sequence inside that chat turn.
#[derive(Clone)]
pub struct Bot {
    telegram: TelegramClient,
    channels: ChannelStore,
    videos: Arc<dyn VideoSource>,
    analyzer: Arc<dyn Analyzer>,
}

impl Bot {
    pub fn new(
        telegram: TelegramClient,
        channels: ChannelStore,
        videos: Arc<dyn VideoSource>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        Self {
            telegram,
            channels,
            videos,
            analyzer,
        }
    }

    pub async fn run(&self) {
        info!("Bot polling for updates...");
        let mut offset: Option<i64> = None;

        loop {
            let updates = match self.telegram.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    error!("Failed to fetch updates: {e}");
                    tokio::time::sleep(POLL_ERROR_PAUSE).await;
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                let bot = self.clone();
                tokio::spawn(async move { bot.handle_update(update).await });
            }
        }
    }

    async fn handle_update(&self, update: Update) {
        let result = if let Some(query) = update.callback_query {
            self.handle_callback(query).await
        } else if let Some(message) = update.message {
            self.handle_message(message).await
        } else {
            Ok(())
        };

        if let Err(e) = result {
            error!("Failed to handle update {}: {e}", update.update_id);
        }
    }

    async fn handle_message(&self, message: Message) -> anyhow::Result<()> {
        if !message.text.as_deref().is_some_and(is_start_command) {
            return Ok(());
        }
        info!("/start received in chat {}", message.chat.id);

        let channels = self.channels.list_channels().await;
        if let Err(e) = &channels {
            error!("Failed to load channels: {e}");
        }
        let reply = start_reply(channels);
        self.telegram
            .send_message(message.chat.id, &reply.text, reply.keyboard.as_ref())
            .await?;
        Ok(())
    }

    async fn handle_callback(&self, query: CallbackQuery) -> anyhow::Result<()> {
        self.telegram.answer_callback_query(&query.id).await?;

        let (Some(channel_id), Some(message)) = (query.data, query.message) else {
            warn!("Callback {} without data or message", query.id);
            return Ok(());
        };
        let (chat_id, message_id) = (message.chat.id, message.message_id);

        let channel_name = match self.channels.channel_name(&channel_id).await {
            Ok(Some(name)) => name,
            Ok(None) => UNKNOWN_CHANNEL_NAME.to_string(),
            Err(e) => {
                error!("Failed to look up channel {channel_id}: {e}");
                UNKNOWN_CHANNEL_NAME.to_string()
            }
        };
        info!("Analyzing channel {channel_name} ({channel_id}) for chat {chat_id}");

        self.telegram
            .edit_message_text(
                chat_id,
                message_id,
                &format!(
                    "Analizando '{channel_name}'...\nEsto puede tardar hasta 2 minutos. Por favor, espera."
                ),
            )
            .await?;

        let outcome =
            fetch_and_analyze(self.videos.as_ref(), self.analyzer.as_ref(), &channel_id).await;
        if let Err(e) = &outcome {
            error!("Analysis for {channel_id} failed: {e}");
        }

        self.telegram
            .edit_message_text(chat_id, message_id, &analysis_reply(&channel_name, outcome))
            .await?;
        Ok(())
    }
}
