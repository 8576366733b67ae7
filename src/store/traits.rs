//! Capability trait for the durable hierarchy store.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{HierarchyNode, Resolution};

/// Durable map from class identifier to its resolved state and structure.
///
/// Writes are upserts: all-or-nothing per call, last writer wins. An empty
/// parent list or label keeps whatever the store already holds for the id.
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    /// Flat classification lookup, including legacy rows without structure.
    ///
    /// Returns `None` when the identifier has never been stored.
    async fn get_classification(&self, id: &str) -> Result<Option<Resolution>, AppError>;

    /// Stores a resolution together with the node's parents and label.
    async fn save_classification(
        &self,
        id: &str,
        resolution: &Resolution,
        parents: &[String],
        label: &str,
    ) -> Result<(), AppError>;

    /// Structural lookup. `None` on miss.
    async fn get_hierarchy(&self, id: &str) -> Result<Option<HierarchyNode>, AppError>;

    async fn save_hierarchy(&self, node: &HierarchyNode) -> Result<(), AppError>;
}
