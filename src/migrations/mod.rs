//! Schema migrations for the PostgreSQL hierarchy store with version tracking.
//!
//! Migrations are:
//! - **Idempotent**: Use `IF NOT EXISTS` - required for safe retries
//! - **Additive-only**: Never drop tables or columns
//! - **Forward-only**: No rollback support - create compensating migrations if needed
//! - **Version-tracked**: Schema version stored in `schema_version` SQL table
//! - **Applied on demand**: Run by `taxoclass init`

mod m001_hierarchy_nodes;
mod m002_legacy_classifications;
mod traits;

pub use m001_hierarchy_nodes::M001HierarchyNodes;
pub use m002_legacy_classifications::M002LegacyClassifications;
pub use traits::{Migration, Register};

use deadpool_postgres::Object;

use crate::error::AppError;

/// Result of running migrations.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    /// Schema version before migrations ran.
    pub previous_version: u32,
    /// Schema version after migrations ran.
    pub current_version: u32,
    /// List of migration IDs that were applied.
    pub applied_migrations: Vec<String>,
}

/// All migrations in version order.
pub fn create_register() -> Register {
    Register::new()
        .register(M001HierarchyNodes)
        .register(M002LegacyClassifications)
}

/// Run all pending migrations on `conn`.
///
/// Only migrations with a version higher than the current schema version are
/// applied. Each migration runs in its own transaction - on failure, changes
/// are rolled back.
pub async fn run_migrations(conn: &mut Object) -> Result<MigrationResult, AppError> {
    ensure_schema_version_table(conn).await?;

    let previous_version = get_schema_version(conn).await?;
    let (current_version, applied_migrations) = create_register()
        .run_pending(conn, previous_version)
        .await?;

    Ok(MigrationResult {
        previous_version,
        current_version,
        applied_migrations,
    })
}

/// SQL to create the schema_version table.
const CREATE_SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY DEFAULT 1 CHECK (id = 1),
    version INTEGER NOT NULL DEFAULT 0,
    applied_migrations TEXT[] NOT NULL DEFAULT '{}',
    last_applied_at TIMESTAMPTZ DEFAULT NOW()
);

-- Ensure exactly one row exists
INSERT INTO schema_version (id, version)
VALUES (1, 0)
ON CONFLICT (id) DO NOTHING;
"#;

async fn ensure_schema_version_table(conn: &Object) -> Result<(), AppError> {
    conn.batch_execute(CREATE_SCHEMA_VERSION_TABLE).await?;
    Ok(())
}

/// Returns 0 if no version has been set (fresh database).
async fn get_schema_version(conn: &Object) -> Result<u32, AppError> {
    let row = conn
        .query_opt("SELECT version FROM schema_version WHERE id = 1", &[])
        .await?;

    Ok(row
        .map(|row| row.try_get::<_, i32>("version"))
        .transpose()?
        .unwrap_or(0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_version_ordered() {
        let register = create_register();
        let versions: Vec<u32> = register.iter().map(|m| m.version()).collect();
        assert_eq!(versions, vec![1, 2]);

        let mut ids: Vec<&str> = register.iter().map(|m| m.id()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 2);
    }
}
