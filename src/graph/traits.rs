//! Capability trait for knowledge-graph access.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::EntityMetadata;

/// The two relations the classifier follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// "instance of" (`P31`): subject → class.
    InstanceOf,
    /// "subclass of" (`P279`): class → parent class.
    SubclassOf,
}

impl Relation {
    /// Wikidata property id of the relation.
    pub fn property(&self) -> &'static str {
        match self {
            Relation::InstanceOf => "P31",
            Relation::SubclassOf => "P279",
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.property())
    }
}

/// Targets and label of a single entity for one relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityClaims {
    pub targets: Vec<String>,
    pub label: String,
}

/// Targets and labels for several entities for one relation.
///
/// Ids the graph does not know are absent from both maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimsBatch {
    pub targets: HashMap<String, Vec<String>>,
    pub labels: HashMap<String, String>,
}

/// Read access to a crowd-sourced knowledge graph.
///
/// Implementations own retries and timeouts. Dropping a returned future
/// cancels the request.
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Fetches the `relation` targets and label of one entity.
    async fn get_entity_claims(
        &self,
        id: &str,
        relation: Relation,
    ) -> Result<EntityClaims, AppError>;

    /// Fetches the `relation` targets and labels of several entities at once.
    async fn get_entity_claims_batch(
        &self,
        ids: &[String],
        relation: Relation,
    ) -> Result<ClaimsBatch, AppError>;

    /// Fetches labels and all entity-valued claims of several entities.
    async fn get_entities_batch(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, EntityMetadata>, AppError>;
}
