//! Classification command handlers.
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use color_eyre::Result;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::App;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl App {
    /// Classify identifiers. Unclassified identifiers map to `null`.
    ///
    /// A single identifier goes through the per-subject path; several are
    /// fetched in one batch and classified together so shared classes are
    /// resolved once.
    pub async fn run_classify(&self, ids: &[String]) -> Result<()> {
        let ctx = self.context().await?;
        let mut results = Map::new();

        if let [id] = ids {
            let verdict = ctx.classifier.classify(id).await.map_err(|e| {
                tracing::error!(id = %id, code = e.code(), error = %e, "Classification failed");
                color_eyre::eyre::eyre!("Failed to classify {}: {}", id, e)
            })?;
            results.insert(id.clone(), serde_json::to_value(verdict)?);
            return print_json(&Value::Object(results));
        }

        let subjects = ctx
            .graph
            .get_entities_batch(ids)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to fetch entities: {}", e))?;
        tracing::debug!(requested = ids.len(), found = subjects.len(), "Fetched subjects");

        let verdicts = ctx.classifier.classify_batch(&subjects).await;
        for id in ids {
            let verdict = verdicts.get(id);
            results.insert(id.clone(), serde_json::to_value(verdict)?);
        }

        print_json(&Value::Object(results))
    }

    /// Explain how an identifier was classified.
    pub async fn run_explain(&self, id: &str) -> Result<()> {
        let ctx = self.context().await?;
        let explanation = ctx
            .classifier
            .explain(id)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to explain {}: {}", id, e))?;
        print_json(&explanation)
    }

    /// Report whether a class is covered without regional overrides.
    pub async fn run_covered(&self, id: &str) -> Result<()> {
        let ctx = self.context().await?;
        let covered = ctx
            .classifier
            .is_covered_by_static_config(id)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to check {}: {}", id, e))?;
        print_json(&json!({ "id": id, "covered": covered }))
    }
}
