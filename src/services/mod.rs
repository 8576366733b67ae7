//! Business logic for hierarchy classification.
//!
//! The [`ClassificationService`] orchestrates the knowledge graph, the
//! hierarchy store, static category configuration and the regional override
//! layer.

mod classifier;
mod lookup;
mod regional;

pub use classifier::{ClassificationService, MAX_DEPTH};
pub use regional::{RegionalCategories, RegionalOverrides};
