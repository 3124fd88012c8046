//! Connects to the configured database, checks it is reachable, and applies
//! the category schema migrations.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hearth_db::config::{DbConfig, HierarchyConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth_db=debug,hearth_migrate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = DbConfig::from_env().context("Invalid database configuration")?;
    let hierarchy = HierarchyConfig::from_env().context("Invalid hierarchy configuration")?;
    tracing::info!(
        max_connections = config.max_connections,
        max_depth = hierarchy.max_depth,
        "Loaded configuration"
    );

    // --- Database ---
    let pool = hearth_db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    hearth_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    hearth_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(())
}
