//! Migration trait and registry.

use deadpool_postgres::Object;
use futures::future::BoxFuture;
use tokio_postgres::Transaction;

use crate::error::AppError;

/// A versioned schema change applied inside a transaction.
///
/// Uses BoxFuture to avoid `'static` requirements from `#[async_trait]`.
pub trait Migration: Send + Sync {
    fn id(&self) -> &'static str;
    fn version(&self) -> u32;
    fn description(&self) -> &'static str;
    fn up<'a>(&'a self, txn: &'a Transaction<'a>) -> BoxFuture<'a, Result<(), AppError>>;
}

/// Ordered set of migrations.
pub struct Register {
    migrations: Vec<Box<dyn Migration>>,
}

impl Register {
    pub fn new() -> Self {
        Self {
            migrations: Vec::new(),
        }
    }

    pub fn register(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self
    }

    /// Iterate over migrations.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    /// Run all pending migrations above `current_version`.
    /// Each migration and its version bump run in one transaction.
    /// Returns (new_version, applied_migration_ids).
    pub async fn run_pending(
        &self,
        conn: &mut Object,
        current_version: u32,
    ) -> Result<(u32, Vec<String>), AppError> {
        let mut applied = vec![];
        let mut new_version = current_version;

        for migration in &self.migrations {
            if migration.version() <= current_version {
                continue;
            }

            tracing::info!(
                "Applying migration {} (v{}): {}",
                migration.id(),
                migration.version(),
                migration.description()
            );

            let txn = conn.transaction().await?;
            let outcome = match migration.up(&txn).await {
                Ok(()) => record_version(&txn, migration.version(), migration.id()).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => txn.commit().await?,
                Err(e) => {
                    tracing::error!("Migration {} failed, rolling back: {}", migration.id(), e);
                    txn.rollback().await?;
                    return Err(e);
                }
            }

            new_version = migration.version();
            applied.push(migration.id().to_string());
        }

        Ok((new_version, applied))
    }
}

impl Default for Register {
    fn default() -> Self {
        Self::new()
    }
}

async fn record_version(txn: &Transaction<'_>, version: u32, id: &str) -> Result<(), AppError> {
    txn.execute(
        "UPDATE schema_version
         SET version = $1,
             applied_migrations = array_append(applied_migrations, $2),
             last_applied_at = NOW()
         WHERE id = 1",
        &[&(version as i32), &id],
    )
    .await?;
    Ok(())
}
