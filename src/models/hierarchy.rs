//! Hierarchy nodes and the persisted category slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored marker for an ignored node.
pub const IGNORED_MARKER: &str = "__IGNORED__";
/// Stored marker for a dead-end node.
pub const DEAD_END_MARKER: &str = "__DEAD_END__";

/// A non-category outcome recorded in the category slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentinel {
    /// The node, and everything traversed to reach it, is uninteresting.
    Ignored,
    /// Traversal exhausted the depth bound without a verdict.
    DeadEnd,
}

/// The persisted category slot of a hierarchy node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Resolution {
    /// Structure known, resolution pending. Never trusted.
    #[default]
    Unresolved,
    Sentinel(Sentinel),
    Category(String),
}

impl Resolution {
    pub fn ignored() -> Self {
        Resolution::Sentinel(Sentinel::Ignored)
    }

    pub fn dead_end() -> Self {
        Resolution::Sentinel(Sentinel::DeadEnd)
    }

    pub fn category(name: impl Into<String>) -> Self {
        Resolution::Category(name.into())
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved)
    }

    /// Encoding used by durable stores. `None` means unresolved.
    pub fn to_stored(&self) -> Option<&str> {
        match self {
            Resolution::Unresolved => None,
            Resolution::Sentinel(Sentinel::Ignored) => Some(IGNORED_MARKER),
            Resolution::Sentinel(Sentinel::DeadEnd) => Some(DEAD_END_MARKER),
            Resolution::Category(name) => Some(name),
        }
    }

    /// Decode a stored slot. Empty strings are legacy unresolved rows.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            None | Some("") => Resolution::Unresolved,
            Some(IGNORED_MARKER) => Resolution::ignored(),
            Some(DEAD_END_MARKER) => Resolution::dead_end(),
            Some(name) => Resolution::Category(name.to_string()),
        }
    }
}

/// A taxonomy class with its known parents and resolved state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Direct "subclass-of" targets.
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl HierarchyNode {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        parents: Vec<String>,
        resolution: Resolution,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parents,
            resolution,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_encoding() {
        assert_eq!(Resolution::Unresolved.to_stored(), None);
        assert_eq!(Resolution::ignored().to_stored(), Some("__IGNORED__"));
        assert_eq!(Resolution::dead_end().to_stored(), Some("__DEAD_END__"));
        assert_eq!(Resolution::category("City").to_stored(), Some("City"));
    }

    #[test]
    fn test_stored_decoding() {
        assert_eq!(Resolution::from_stored(None), Resolution::Unresolved);
        assert_eq!(Resolution::from_stored(Some("")), Resolution::Unresolved);
        assert_eq!(
            Resolution::from_stored(Some("__IGNORED__")),
            Resolution::ignored()
        );
        assert_eq!(
            Resolution::from_stored(Some("__DEAD_END__")),
            Resolution::dead_end()
        );
        assert_eq!(
            Resolution::from_stored(Some("Castle")),
            Resolution::category("Castle")
        );
    }

    #[test]
    fn test_resolution_serialization() {
        let json = serde_json::to_string(&Resolution::ignored()).unwrap();
        assert!(json.contains("\"state\":\"sentinel\""));
        assert!(json.contains("\"value\":\"ignored\""));
    }
}
