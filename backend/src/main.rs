use channel_analyst::build_rocket;
use channel_analyst::config::{bootstrap, create_app_state, create_cors};
use log::info;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let config = bootstrap("web server")?;
    let cors = create_cors(&config)?;
    let state = create_app_state(&config).await?;

    info!(
        "Up to {} analyses will run concurrently",
        config.max_concurrent_jobs
    );
    let _rocket = build_rocket(state).attach(cors).launch().await?;
    Ok(())
}
