//! Domain models for hierarchy classification.

mod category;
mod classification;
mod entity;
mod hierarchy;

pub use category::{Category, CategoryConfig, SizeTier};
pub use classification::{Classification, Explanation};
pub use entity::EntityMetadata;
pub use hierarchy::{HierarchyNode, Resolution, Sentinel, DEAD_END_MARKER, IGNORED_MARKER};
