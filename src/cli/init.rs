//! Init command handler.

use color_eyre::Result;

use crate::config::{Config, StoreBackend};
use crate::context::Context;

use super::App;

impl App {
    /// Run the init command to initialize the store schema.
    pub async fn run_init(&self) -> Result<()> {
        let config = Config::load()?;

        if config.store.backend == StoreBackend::Memory {
            tracing::info!("In-memory store configured, no schema to initialize");
            return Ok(());
        }

        let store = Context::connect_postgres(&config)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to connect: {}", e))?;

        tracing::info!("Running migrations...");
        let result = store
            .migrate()
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Migration failed: {}", e))?;

        if result.applied_migrations.is_empty() {
            tracing::info!(
                "Database already at v{}, no migrations needed",
                result.current_version
            );
        } else {
            tracing::info!(
                "Migrations complete: v{} -> v{}, applied: {:?}",
                result.previous_version,
                result.current_version,
                result.applied_migrations
            );
        }

        Ok(())
    }
}
