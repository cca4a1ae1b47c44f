pub mod analyzer;
pub mod job_runner;
pub mod youtube;
