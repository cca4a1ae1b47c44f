use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment or the .env file")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Why a channel's recent videos could not be listed.
///
/// An empty channel is not an error: it is `Ok(vec![])`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Error al obtener videos de YouTube para {channel_id}: {source}")]
    Http {
        channel_id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Error al obtener videos de YouTube para {channel_id}: la API respondió {status}: {message}")]
    Api {
        channel_id: String,
        status: u16,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ese ID de canal ya existe en la base de datos: {0}")]
    DuplicateChannel(String),

    #[error("job {0} not found")]
    JobNotFound(String),

    #[error("job {0} is no longer pending")]
    JobNotPending(String),

    #[error("could not serialize video data: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn from_insert(err: sqlx::Error, channel_id: &str) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::DuplicateChannel(channel_id.to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// Everything that ends a job as `failed`. The display text is what the
/// job's `result` column receives.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("No se encontraron videos recientes para el canal {0}.")]
    NoVideos(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
