use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use mailroom_api::app::{create_app, AppState};
use mailroom_api::config::Config;
use mailroom_api::jobs::{
    BounceUnsubscribeJob, EmailRetryJob, JobScheduler, NotificationCleanupJob, WarmupStatsJob,
};
use mailroom_api::middleware::{init_metrics, logging::init_logging};
use mailroom_api::services::{CheckedResolver, Notifier, WarmupUpdater};
use persistence::repositories::{EmailTrackingRepository, NotificationRepository, WarmupRepository};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_logging(&config.logging);

    info!("Starting Mailroom v{}", env!("CARGO_PKG_VERSION"));

    init_metrics()?;

    let pool = persistence::db::create_pool(&config.database.to_pool_config()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let resolver = CheckedResolver::from_system()?;
    let state = AppState::new(config.clone(), pool.clone(), resolver);

    // Background jobs
    let mut scheduler = JobScheduler::new();
    scheduler.register(EmailRetryJob::new(
        state.retry_runner.clone(),
        config.retry.interval_minutes,
    ));
    scheduler.register(BounceUnsubscribeJob::new(
        pool.clone(),
        config.bounce.unsubscribe_threshold,
        config.bounce.interval_minutes,
    ));
    scheduler.register(WarmupStatsJob::new(
        Arc::new(WarmupUpdater::new(
            WarmupRepository::new(pool.clone()),
            EmailTrackingRepository::new(pool.clone()),
        )),
        Arc::new(Notifier::new(NotificationRepository::new(pool.clone()))),
        config.warmup.interval_minutes,
    ));
    scheduler.register(NotificationCleanupJob::new(pool.clone()));
    scheduler.start();

    let app = create_app(state);

    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
