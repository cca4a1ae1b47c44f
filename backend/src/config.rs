use crate::db;
use crate::error::ConfigError;
use crate::services::analyzer::OpenRouterClient;
use crate::services::youtube::YouTubeClient;
use crate::AppState;
use env_logger::Builder;
use log::{info, warn, LevelFilter};
use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENROUTER_MODEL: &str = "tngtech/deepseek-r1t2-chimera:free";
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8000";

/// Hard network timeout for a single LLM request.
pub const LLM_TIMEOUT: Duration = Duration::from_secs(180);

/// Everything the binaries need from the environment, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub youtube_api_key: String,
    pub youtube_api_url: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_api_url: String,
    pub openrouter_model: String,
    pub telegram_bot_token: Option<String>,
    pub max_concurrent_jobs: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// For tools that only touch the database and need no API keys.
    pub fn database_url_from_env() -> Result<String, ConfigError> {
        Self::database_url_from_lookup(|name| env::var(name).ok())
    }

    pub fn database_url_from_lookup<F>(lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        non_blank(&lookup, "DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    /// Builds the config from any key lookup; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| non_blank(&lookup, name);

        let database_url = Self::database_url_from_lookup(&lookup)?;
        let youtube_api_key =
            get("YOUTUBE_API_KEY").ok_or(ConfigError::Missing("YOUTUBE_API_KEY"))?;

        let max_concurrent_jobs = match get("MAX_CONCURRENT_JOBS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "MAX_CONCURRENT_JOBS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_MAX_CONCURRENT_JOBS,
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            database_url,
            youtube_api_key,
            youtube_api_url: get("YOUTUBE_API_URL")
                .unwrap_or_else(|| DEFAULT_YOUTUBE_API_URL.to_string()),
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            openrouter_api_url: get("OPENROUTER_API_URL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_API_URL.to_string()),
            openrouter_model: get("OPENROUTER_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            max_concurrent_jobs,
            cors_allowed_origins,
        })
    }

    /// Only the bot needs a token, so it is checked on demand.
    pub fn telegram_token(&self) -> Result<&str, ConfigError> {
        self.telegram_bot_token
            .as_deref()
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))
    }

    pub fn youtube_client(&self) -> YouTubeClient {
        YouTubeClient::new(&self.youtube_api_key, &self.youtube_api_url)
    }

    pub fn openrouter_client(&self) -> reqwest::Result<OpenRouterClient> {
        if self.openrouter_api_key.is_none() {
            warn!("OPENROUTER_API_KEY is not set; analyses will return an error message");
        }
        OpenRouterClient::new(
            self.openrouter_api_key.clone(),
            &self.openrouter_api_url,
            &self.openrouter_model,
        )
    }
}

/// Blank values count as unset.
fn non_blank<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.trim().is_empty())
}

pub fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

/// Loads `.env`, starts logging and reads the config, in that order.
pub fn bootstrap(component: &str) -> Result<Config, ConfigError> {
    load_environment();
    init_logger();
    info!("Starting {component}...");
    Config::from_env()
}

pub async fn create_app_state(config: &Config) -> anyhow::Result<AppState> {
    let pool = db::connect(&config.database_url).await?;

    Ok(AppState::new(
        pool,
        Arc::new(config.youtube_client()),
        Arc::new(config.openrouter_client()?),
        config.max_concurrent_jobs,
    ))
}

pub fn create_cors(config: &Config) -> anyhow::Result<rocket_cors::Cors> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(
            config.cors_allowed_origins.as_slice(),
        ))
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&["Accept", "Content-Type"]))
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}
