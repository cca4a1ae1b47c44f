use crate::db::{ChannelStore, JobStore};
use crate::error::{JobError, StoreError};
use crate::models::{AnalysisJob, JobStatus, VideoRecord};
use crate::services::analyzer::{Analyzer, ECONOMIC_CONCERN_PROMPT};
use crate::services::youtube::VideoSource;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

pub const UNKNOWN_CHANNEL_NAME: &str = "Desconocido";

/// Recent uploads of a channel; an empty window is an error here.
pub async fn collect_videos(
    source: &dyn VideoSource,
    channel_id: &str,
) -> Result<Vec<VideoRecord>, JobError> {
    let videos = source.recent_videos(channel_id).await?;
    if videos.is_empty() {
        return Err(JobError::NoVideos(channel_id.to_string()));
    }
    Ok(videos)
}

/// Fetch-then-analyze without a job record, for callers that wait inline.
pub async fn fetch_and_analyze(
    source: &dyn VideoSource,
    analyzer: &dyn Analyzer,
    channel_id: &str,
) -> Result<String, JobError> {
    let videos = collect_videos(source, channel_id).await?;
    Ok(analyzer.analyze(ECONOMIC_CONCERN_PROMPT, &videos).await)
}

/// Runs analysis jobs in the background, at most `max_concurrent` at a time.
#[derive(Clone)]
pub struct JobRunner {
    jobs: JobStore,
    channels: ChannelStore,
    videos: Arc<dyn VideoSource>,
    analyzer: Arc<dyn Analyzer>,
    permits: Arc<Semaphore>,
}

impl JobRunner {
    pub fn new(
        jobs: JobStore,
        channels: ChannelStore,
        videos: Arc<dyn VideoSource>,
        analyzer: Arc<dyn Analyzer>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            jobs,
            channels,
            videos,
            analyzer,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Records a pending job for `channel_id` and hands it to the pool.
    pub async fn start_job(
        &self,
        channel_id: &str,
    ) -> Result<(AnalysisJob, JoinHandle<Result<JobStatus, StoreError>>), StoreError> {
        let channel_name = self
            .channels
            .channel_name(channel_id)
            .await?
            .unwrap_or_else(|| UNKNOWN_CHANNEL_NAME.to_string());

        let job = self.jobs.create_job(&channel_name).await?;
        let handle = self.submit(job.id.clone(), channel_id.to_string());
        Ok((job, handle))
    }

    /// The handle resolves once the job's terminal status is committed.
    pub fn submit(
        &self,
        job_id: String,
        channel_id: String,
    ) -> JoinHandle<Result<JobStatus, StoreError>> {
        let runner = self.clone();
        tokio::spawn(async move {
            let _permit = runner.permits.clone().acquire_owned().await.ok();
            runner.run(&job_id, &channel_id).await
        })
    }

    /// Drives one pending job to `completed` or `failed`.
    pub async fn run(&self, job_id: &str, channel_id: &str) -> Result<JobStatus, StoreError> {
        info!("Starting analysis for job {job_id} (channel {channel_id})");

        match self.execute(job_id, channel_id).await {
            Ok(()) => {
                info!("Job {job_id} completed");
                Ok(JobStatus::Completed)
            }
            Err(e) => {
                error!("Job {job_id} failed: {e}");
                self.jobs.fail_job(job_id, &e.to_string()).await?;
                Ok(JobStatus::Failed)
            }
        }
    }

    async fn execute(&self, job_id: &str, channel_id: &str) -> Result<(), JobError> {
        let videos = collect_videos(self.videos.as_ref(), channel_id).await?;

        // Archived first so the raw list survives a failed analysis.
        self.jobs.save_raw_data(job_id, &videos).await?;

        let analysis = self
            .analyzer
            .analyze(ECONOMIC_CONCERN_PROMPT, &videos)
            .await;
        self.jobs.complete_job(job_id, &analysis).await?;
        Ok(())
    }
}
