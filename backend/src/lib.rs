pub mod api;
pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod test_server;

use db::{ChannelStore, JobStore};
use rocket::{routes, Build, Rocket};
use services::analyzer::Analyzer;
use services::job_runner::JobRunner;
use services::youtube::VideoSource;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared by every web route.
pub struct AppState {
    pub channels: ChannelStore,
    pub jobs: JobStore,
    pub runner: JobRunner,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        videos: Arc<dyn VideoSource>,
        analyzer: Arc<dyn Analyzer>,
        max_concurrent_jobs: usize,
    ) -> Self {
        let channels = ChannelStore::new(pool.clone());
        let jobs = JobStore::new(pool);
        let runner = JobRunner::new(
            jobs.clone(),
            channels.clone(),
            videos,
            analyzer,
            max_concurrent_jobs,
        );
        AppState {
            channels,
            jobs,
            runner,
        }
    }
}

pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build().manage(state).mount(
        "/",
        routes![
            api::index,
            api::list_channels,
            api::add_channel,
            api::delete_channel,
            api::start_analysis,
            api::show_result,
            api::job_status,
            api::history,
            api::download_raw_data,
        ],
    )
}
