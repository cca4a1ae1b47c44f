use crate::error::StoreError;
use crate::models::{AnalysisJob, JobStatus, VideoRecord};
use chrono::Utc;
use log::info;
use sqlx::SqlitePool;
use uuid::Uuid;

const JOB_COLUMNS: &str = "id, status, result, channel_name, raw_json_data, created_at";

/// Persistence for analysis jobs.
///
/// Every write after creation is guarded by `status = 'pending'`, so a job
/// reaches a terminal status at most once and nothing is attached afterwards.
#[derive(Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_job(&self, channel_name: &str) -> Result<AnalysisJob, StoreError> {
        let job = AnalysisJob {
            id: Uuid::new_v4().to_string(),
            status: JobStatus::Pending,
            result: None,
            channel_name: Some(channel_name.to_string()),
            raw_json_data: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO analysis_jobs (id, status, channel_name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&job.id)
        .bind(job.status)
        .bind(&job.channel_name)
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;

        info!("Created job {} for '{channel_name}'", job.id);
        Ok(job)
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Option<AnalysisJob>, StoreError> {
        let job = sqlx::query_as::<_, AnalysisJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM analysis_jobs WHERE id = ?"
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    pub async fn job_status(
        &self,
        job_id: &str,
    ) -> Result<Option<(JobStatus, Option<String>)>, StoreError> {
        let row = sqlx::query_as::<_, (JobStatus, Option<String>)>(
            "SELECT status, result FROM analysis_jobs WHERE id = ?",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn save_raw_data(
        &self,
        job_id: &str,
        videos: &[VideoRecord],
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(videos)?;
        let result = sqlx::query(
            "UPDATE analysis_jobs SET raw_json_data = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(raw)
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.not_pending(job_id).await);
        }
        Ok(())
    }

    pub async fn complete_job(&self, job_id: &str, analysis: &str) -> Result<(), StoreError> {
        self.finish(job_id, JobStatus::Completed, analysis).await
    }

    pub async fn fail_job(&self, job_id: &str, message: &str) -> Result<(), StoreError> {
        self.finish(job_id, JobStatus::Failed, message).await
    }

    async fn finish(&self, job_id: &str, status: JobStatus, result: &str) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "UPDATE analysis_jobs SET status = ?, result = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(status)
        .bind(result)
        .bind(job_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(self.not_pending(job_id).await);
        }
        info!("Job {job_id} {status}");
        Ok(())
    }

    async fn not_pending(&self, job_id: &str) -> StoreError {
        match self.get_job(job_id).await {
            Ok(Some(_)) => StoreError::JobNotPending(job_id.to_string()),
            Ok(None) => StoreError::JobNotFound(job_id.to_string()),
            Err(e) => e,
        }
    }

    /// Newest first.
    pub async fn list_history(&self) -> Result<Vec<AnalysisJob>, StoreError> {
        let jobs = sqlx::query_as::<_, AnalysisJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM analysis_jobs ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    /// The archived video list, or `None` if the job is unknown or has none.
    pub async fn raw_data(&self, job_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .get_job(job_id)
            .await?
            .filter(AnalysisJob::has_raw_data)
            .and_then(|job| job.raw_json_data))
    }
}
