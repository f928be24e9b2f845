//! Publishing Scheduler Binary
//!
//! Standalone process that runs the catalog's recurring publishing task:
//! applies migrations, starts the scheduler loop, and shuts it down cleanly
//! on SIGINT.

use tokio::signal;
use tracing::info;

use catalog_core::config::CatalogConfig;
use catalog_core::database::DatabaseConnection;
use catalog_core::logging::init_structured_logging;
use catalog_core::publishing::{PublishingScheduler, PublishingSchedulerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    info!("Starting catalog publishing scheduler");

    let config = CatalogConfig::from_env()?;
    let db = DatabaseConnection::new(&config).await?;
    db.migrate().await?;
    db.health_check().await?;

    let scheduler = PublishingScheduler::new(
        db.pool().clone(),
        PublishingSchedulerConfig::from_catalog_config(&config),
    );
    scheduler.start().await;
    info!(
        poll_interval_secs = config.publish_poll_interval_secs,
        "Publishing scheduler started"
    );

    // Wait for shutdown signal
    signal::ctrl_c().await?;
    info!("Shutdown signal received");

    scheduler.stop().await;
    db.close().await;
    info!("Publishing scheduler stopped");

    Ok(())
}
