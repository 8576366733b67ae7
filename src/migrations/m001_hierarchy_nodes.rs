//! Hierarchy node table.

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_postgres::Transaction;

use crate::error::AppError;
use crate::migrations::Migration;

/// Structural hierarchy nodes with their resolved category slot.
pub struct M001HierarchyNodes;

impl Migration for M001HierarchyNodes {
    fn id(&self) -> &'static str {
        "m001_hierarchy_nodes"
    }

    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "Hierarchy nodes (label, parents, category slot)"
    }

    fn up<'a>(&'a self, txn: &'a Transaction<'a>) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            txn.batch_execute(
                r#"
                CREATE TABLE IF NOT EXISTS hierarchy_nodes (
                    id TEXT PRIMARY KEY,
                    label TEXT NOT NULL DEFAULT '',
                    parents TEXT[] NOT NULL DEFAULT '{}',
                    category TEXT,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX IF NOT EXISTS hierarchy_nodes_category_idx
                ON hierarchy_nodes (category);
                "#,
            )
            .await?;

            Ok(())
        }
        .boxed()
    }
}
