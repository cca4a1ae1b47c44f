use channel_analyst::bot::telegram::TelegramClient;
use channel_analyst::bot::Bot;
use channel_analyst::config::bootstrap;
use channel_analyst::db::{self, ChannelStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = bootstrap("Telegram bot")?;
    let token = config.telegram_token()?;

    let pool = db::connect(&config.database_url).await?;
    let bot = Bot::new(
        TelegramClient::new(token)?,
        ChannelStore::new(pool),
        Arc::new(config.youtube_client()),
        Arc::new(config.openrouter_client()?),
    );

    bot.run().await;
    Ok(())
}
