//! Legacy flat classification table.

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_postgres::Transaction;

use crate::error::AppError;
use crate::migrations::Migration;

/// Classification-only rows for identifiers without structural data.
pub struct M002LegacyClassifications;

impl Migration for M002LegacyClassifications {
    fn id(&self) -> &'static str {
        "m002_legacy_classifications"
    }

    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Legacy flat classifications"
    }

    fn up<'a>(&'a self, txn: &'a Transaction<'a>) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            txn.batch_execute(
                r#"
                CREATE TABLE IF NOT EXISTS legacy_classifications (
                    id TEXT PRIMARY KEY,
                    category TEXT
                );
                "#,
            )
            .await?;

            Ok(())
        }
        .boxed()
    }
}
