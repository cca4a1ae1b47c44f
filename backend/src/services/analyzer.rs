use crate::config::LLM_TIMEOUT;
use crate::models::VideoRecord;
use async_trait::async_trait;
use log::{error, info};
use reqwest::header;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The canned instruction sent with every channel's video list.
pub const ECONOMIC_CONCERN_PROMPT: &str = "Analyze the provided JSON data and tell me, based on the number of views of the videos, what could be the topic of greatest concern for Americans regarding their economy? Use the data contained in the file. Also, give me the titles, links and number of views of the videos related to that topic. Present the final answer in Spanish.";

pub const MISSING_KEY_MESSAGE: &str = "Error: OPENROUTER_API_KEY no configurada";

/// Turns a prompt and a video list into free text. Never fails: problems
/// come back as the text itself.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, prompt: &str, videos: &[VideoRecord]) -> String;
}

pub fn build_message(prompt: &str, videos: &[VideoRecord]) -> Result<String, serde_json::Error> {
    let video_json = serde_json::to_string_pretty(videos)?;
    Ok(format!("{prompt}\n\n### Video Data (JSON):\n\n{video_json}"))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// OpenRouter chat-completions client.
#[derive(Clone)]
pub struct OpenRouterClient {
    http_client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> reqwest::Result<Self> {
        Self::with_timeout(api_key, base_url, model, LLM_TIMEOUT)
    }

    pub fn with_timeout(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    async fn chat_completion(&self, api_key: &str, content: String) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("the response contained no choices"))
    }
}

#[async_trait]
impl Analyzer for OpenRouterClient {
    async fn analyze(&self, prompt: &str, videos: &[VideoRecord]) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            return MISSING_KEY_MESSAGE.to_string();
        };

        let content = match build_message(prompt, videos) {
            Ok(content) => content,
            Err(e) => return format!("Error de comunicación con el LLM: {e}"),
        };

        info!(
            "Sending {} videos to {} for analysis",
            videos.len(),
            self.model
        );
        match self.chat_completion(api_key, content).await {
            Ok(text) => text,
            Err(e) => {
                error!("OpenRouter request failed: {e}");
                format!("Error de comunicación con el LLM: {e}")
            }
        }
    }
}
