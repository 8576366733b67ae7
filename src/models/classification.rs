//! Classification outcomes returned to callers.

use serde::Serialize;

use super::SizeTier;

/// Outcome of classifying an identifier. `None` at the call site means no opinion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Classification {
    /// The identifier belongs to `category`.
    Matched { category: String, size: SizeTier },
    /// The identifier is explicitly uninteresting.
    Ignored,
}

impl Classification {
    pub fn matched(category: impl Into<String>, size: SizeTier) -> Self {
        Classification::Matched {
            category: category.into(),
            size,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Classification::Ignored)
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Classification::Matched { category, .. } => Some(category),
            Classification::Ignored => None,
        }
    }

    pub fn size(&self) -> Option<SizeTier> {
        match self {
            Classification::Matched { size, .. } => Some(*size),
            Classification::Ignored => None,
        }
    }
}

/// Structured account of how a subject was classified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub subject: String,
    /// "instance-of" targets considered, in graph order.
    pub instances: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeTier>,
    /// Instance that produced the winning verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_notability: Option<u32>,
    pub ignored: bool,
    /// The subject itself is configured directly.
    pub direct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matched_accessors() {
        let c = Classification::matched("City", SizeTier::L);
        assert_eq!(c.category(), Some("City"));
        assert_eq!(c.size(), Some(SizeTier::L));
        assert!(!c.is_ignored());
    }

    #[test]
    fn test_classification_serialization() {
        let json = serde_json::to_string(&Classification::matched("City", SizeTier::L)).unwrap();
        assert!(json.contains("\"outcome\":\"matched\""));
        assert!(json.contains("\"size\":\"L\""));

        let json = serde_json::to_string(&Classification::Ignored).unwrap();
        assert_eq!(json, "{\"outcome\":\"ignored\"}");
    }
}
