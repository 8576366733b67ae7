//! In-memory knowledge graph.
//!
//! Serves fixtures for offline runs and counts every call so tests can
//! assert how much network work a classification would have cost.
//!
//! Fixture format:
//!
//! ```json
//! {
//!   "Q1": { "labels": { "en": "Q one" }, "claims": { "P31": ["Q2"] } },
//!   "Q2": { "labels": { "en": "Q two" }, "claims": { "P279": ["Q3"] } }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::traits::{ClaimsBatch, EntityClaims, GraphClient, Relation};
use crate::models::EntityMetadata;

#[derive(Debug, Default)]
struct CallCounters {
    instance_of: AtomicUsize,
    subclass_of: AtomicUsize,
    entities: AtomicUsize,
}

impl CallCounters {
    fn for_relation(&self, relation: Relation) -> &AtomicUsize {
        match relation {
            Relation::InstanceOf => &self.instance_of,
            Relation::SubclassOf => &self.subclass_of,
        }
    }
}

/// Knowledge graph held in memory.
///
/// Cheap to clone; clones share entities and counters.
#[derive(Debug, Clone)]
pub struct MemoryGraph {
    entities: Arc<RwLock<HashMap<String, EntityMetadata>>>,
    language: Arc<str>,
    calls: Arc<CallCounters>,
    failing: Arc<RwLock<Vec<String>>>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self {
            entities: Arc::default(),
            language: Arc::from("en"),
            calls: Arc::default(),
            failing: Arc::default(),
        }
    }

    /// Loads a JSON fixture file.
    pub fn from_fixture(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Fixture(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let entities: HashMap<String, EntityMetadata> = serde_json::from_str(json)?;
        let graph = Self::new();
        for (id, metadata) in entities {
            graph.insert(id, metadata);
        }
        Ok(graph)
    }

    pub fn insert(&self, id: impl Into<String>, metadata: EntityMetadata) {
        self.write_entities().insert(id.into(), metadata);
    }

    /// Adds `id --relation--> targets`, creating the entity if needed.
    pub fn add_claims(&self, id: &str, relation: Relation, targets: &[&str]) {
        let mut entities = self.write_entities();
        let entity = entities.entry(id.to_string()).or_default();
        entity
            .claims
            .entry(relation.property().to_string())
            .or_default()
            .extend(targets.iter().map(|t| t.to_string()));
    }

    pub fn set_label(&self, id: &str, label: &str) {
        let language = self.language.to_string();
        self.write_entities()
            .entry(id.to_string())
            .or_default()
            .labels
            .insert(language, label.to_string());
    }

    /// Makes every request touching `id` fail.
    pub fn fail_on(&self, id: &str) {
        self.failing
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(id.to_string());
    }

    /// Calls made for `relation`, single and batched.
    pub fn calls(&self, relation: Relation) -> usize {
        self.calls.for_relation(relation).load(Ordering::SeqCst)
    }

    pub fn entity_calls(&self) -> usize {
        self.calls.entities.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.calls(Relation::InstanceOf) + self.calls(Relation::SubclassOf) + self.entity_calls()
    }

    fn write_entities(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, EntityMetadata>> {
        self.entities.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_failing(&self, ids: &[String]) -> Result<(), AppError> {
        let failing = self.failing.read().unwrap_or_else(|e| e.into_inner());
        match ids.iter().find(|id| failing.contains(id)) {
            Some(id) => Err(AppError::Graph(format!("injected failure for {}", id))),
            None => Ok(()),
        }
    }

    fn lookup(&self, id: &str, relation: Relation) -> Option<(Vec<String>, String)> {
        let entities = self.entities.read().unwrap_or_else(|e| e.into_inner());
        entities.get(id).map(|entity| {
            (
                entity.targets(relation).to_vec(),
                entity.label(&self.language).unwrap_or_default().to_string(),
            )
        })
    }
}

#[async_trait]
impl GraphClient for MemoryGraph {
    async fn get_entity_claims(
        &self,
        id: &str,
        relation: Relation,
    ) -> Result<EntityClaims, AppError> {
        self.calls.for_relation(relation).fetch_add(1, Ordering::SeqCst);
        self.check_failing(&[id.to_string()])?;

        Ok(self
            .lookup(id, relation)
            .map(|(targets, label)| EntityClaims { targets, label })
            .unwrap_or_default())
    }

    async fn get_entity_claims_batch(
        &self,
        ids: &[String],
        relation: Relation,
    ) -> Result<ClaimsBatch, AppError> {
        self.calls.for_relation(relation).fetch_add(1, Ordering::SeqCst);
        self.check_failing(ids)?;

        let mut batch = ClaimsBatch::default();
        for id in ids {
            if let Some((targets, label)) = self.lookup(id, relation) {
                batch.targets.insert(id.clone(), targets);
                batch.labels.insert(id.clone(), label);
            }
        }
        Ok(batch)
    }

    async fn get_entities_batch(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, EntityMetadata>, AppError> {
        self.calls.entities.fetch_add(1, Ordering::SeqCst);
        self.check_failing(ids)?;

        let entities = self.entities.read().unwrap_or_else(|e| e.into_inner());
        Ok(ids
            .iter()
            .filter_map(|id| entities.get(id).map(|e| (id.clone(), e.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claims_and_counters() {
        let graph = MemoryGraph::new();
        graph.add_claims("Q1", Relation::InstanceOf, &["Q515"]);
        graph.set_label("Q1", "Springfield");

        let claims = graph
            .get_entity_claims("Q1", Relation::InstanceOf)
            .await
            .unwrap();
        assert_eq!(claims.targets, vec!["Q515".to_string()]);
        assert_eq!(claims.label, "Springfield");
        assert_eq!(graph.calls(Relation::InstanceOf), 1);
        assert_eq!(graph.calls(Relation::SubclassOf), 0);
    }

    #[tokio::test]
    async fn test_unknown_entity_is_empty() {
        let graph = MemoryGraph::new();
        let claims = graph
            .get_entity_claims("Q404", Relation::SubclassOf)
            .await
            .unwrap();
        assert!(claims.targets.is_empty());

        let batch = graph
            .get_entity_claims_batch(&["Q404".to_string()], Relation::SubclassOf)
            .await
            .unwrap();
        assert!(batch.targets.is_empty());
    }

    #[tokio::test]
    async fn test_from_json_fixture() {
        let graph = MemoryGraph::from_json(
            r#"{
                "Q1": { "labels": { "en": "one" }, "claims": { "P31": ["Q2"] } },
                "Q2": { "claims": { "P279": ["Q3", "Q4"] } }
            }"#,
        )
        .unwrap();

        let batch = graph
            .get_entity_claims_batch(&["Q2".to_string()], Relation::SubclassOf)
            .await
            .unwrap();
        assert_eq!(batch.targets["Q2"], vec!["Q3".to_string(), "Q4".to_string()]);

        let entities = graph
            .get_entities_batch(&["Q1".to_string(), "Q9".to_string()])
            .await
            .unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities["Q1"].label("en"), Some("one"));
        assert_eq!(graph.entity_calls(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let graph = MemoryGraph::new();
        graph.fail_on("Q7");
        let result = graph.get_entity_claims("Q7", Relation::SubclassOf).await;
        assert!(matches!(result, Err(AppError::Graph(_))));
    }
}
