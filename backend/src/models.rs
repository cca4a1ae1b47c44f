use chrono::{DateTime, Utc};
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::Responder;
use rocket::{response, FromForm, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

pub const DEFAULT_CATEGORY: &str = "Noticias";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Channel {
    pub channel_id: String,
    pub channel_name: String,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnalysisJob {
    pub id: String,
    pub status: JobStatus,
    pub result: Option<String>,
    pub channel_name: Option<String>,
    pub raw_json_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisJob {
    pub fn has_raw_data(&self) -> bool {
        self.raw_json_data
            .as_deref()
            .is_some_and(|data| !data.trim().is_empty())
    }
}

/// One upload as handed to the model and archived with the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub title: String,
    #[serde(rename = "views")]
    pub view_count: u64,
    pub url: String,
}

impl VideoRecord {
    pub fn new(video_id: &str, title: impl Into<String>, view_count: u64) -> Self {
        VideoRecord {
            title: title.into(),
            view_count,
            url: format!("https://www.youtube.com/watch?v={video_id}"),
        }
    }
}

/// Body of `GET /status/<job_id>`.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    pub result: Option<String>,
}

#[derive(Debug, FromForm)]
pub struct NewChannel {
    pub channel_name: String,
    pub channel_id: String,
    pub category: Option<String>,
}

impl NewChannel {
    pub fn category_or_default(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(category) if !category.is_empty() => category,
            _ => DEFAULT_CATEGORY,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn internal(message: impl fmt::Display) -> Self {
        ErrorResponse {
            error: "internal_error".to_string(),
            message: message.to_string(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ErrorResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let json = serde_json::to_string(&self).map_err(|_| Status::InternalServerError)?;
        Response::build()
            .status(Status::InternalServerError)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}
