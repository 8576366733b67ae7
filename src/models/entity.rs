//! Entity metadata as returned by the knowledge graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::Relation;

/// Labels and claims of a knowledge-graph entity.
///
/// Claims are keyed by property id (e.g. `P31`) and hold entity-valued targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Labels keyed by language code.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub claims: HashMap<String, Vec<String>>,
}

impl EntityMetadata {
    /// Targets of `relation`, empty if the entity has none.
    pub fn targets(&self, relation: Relation) -> &[String] {
        self.claims
            .get(relation.property())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn label(&self, language: &str) -> Option<&str> {
        self.labels.get(language).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_by_relation() {
        let mut metadata = EntityMetadata::default();
        metadata
            .claims
            .insert("P31".to_string(), vec!["Q515".to_string()]);

        assert_eq!(metadata.targets(Relation::InstanceOf), ["Q515".to_string()]);
        assert!(metadata.targets(Relation::SubclassOf).is_empty());
    }
}
