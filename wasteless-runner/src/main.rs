use anyhow::Result;
use std::sync::Arc;
use tokio;
use tracing;
use tracing_subscriber;
use wasteless_api::run as run_api;
use wasteless_core::{AppContext, Config};
use wasteless_jobs::{scheduler, Sweeper};
use wasteless_notify::NotificationService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Wasteless backend");

    // Load configuration
    let config = Config::from_env();
    let daily_run_hour = config.scheduler.daily_run_hour;
    let notifier = Arc::new(NotificationService::new(&config.notify)?);
    let ctx = AppContext::new(config).await?;

    tracing::info!("Application context initialized");

    let sweeper = Sweeper::new(ctx.clone(), notifier);

    // Daily expiration sweep runs as a background task
    let scheduled = sweeper.clone();
    tokio::spawn(async move {
        if let Err(e) = scheduler::run(scheduled, daily_run_hour).await {
            tracing::error!("Expiration scheduler error: {}", e);
        }
    });

    // API server runs in main task
    tracing::info!("Starting API server");
    run_api(ctx, sweeper).await?;

    Ok(())
}
