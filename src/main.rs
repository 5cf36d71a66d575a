//! EventDesk
//!
//! Main application entry point: connects the store, runs migrations and
//! drives the lifecycle sweep until interrupted.

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use EventDesk::{
    config::Settings,
    database::{connection, DatabaseService, EventStore},
    services::{LoggingNotificationSink, ServiceFactory},
    utils::{clock::SystemClock, logging},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load settings")?;
    settings.validate().context("invalid settings")?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", EventDesk::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_config = connection::DatabaseConfig::from(&settings.database);
    let db_pool = connection::create_pool(&db_config)
        .await
        .context("failed to connect to database")?;

    // Run database migrations
    info!("Running database migrations...");
    connection::run_migrations(&db_pool).await?;

    let store: Arc<dyn EventStore> = Arc::new(DatabaseService::new(db_pool));

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(
        settings.clone(),
        store,
        Arc::new(SystemClock),
        Arc::new(LoggingNotificationSink),
    )?;

    let mut sweep_runner = services.sweep_runner();
    if settings.sweep.enabled {
        sweep_runner.start();
    } else {
        warn!("Lifecycle sweep is disabled");
    }

    info!("EventDesk is ready");
    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;

    info!("Shutting down...");
    sweep_runner.stop();

    Ok(())
}
