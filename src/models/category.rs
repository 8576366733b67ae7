//! Category configuration: named buckets and the identifiers that map to them.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Declared size tier of a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeTier {
    S,
    #[default]
    M,
    L,
    XL,
}

impl std::fmt::Display for SizeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SizeTier::S => "S",
            SizeTier::M => "M",
            SizeTier::L => "L",
            SizeTier::XL => "XL",
        };
        f.write_str(s)
    }
}

/// A named classification bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Declared size tier.
    #[serde(default)]
    pub size: SizeTier,
    /// Minimum notability (e.g. incoming link count) used by downstream filtering.
    #[serde(default)]
    pub min_notability: u32,
    /// Taxonomy identifiers that map directly to this category.
    #[serde(default)]
    pub members: Vec<String>,
}

/// Static category configuration, immutable after load.
///
/// Categories are kept in a `BTreeMap` so the derived lookup map is built
/// in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
    /// Identifiers that are explicitly uninteresting, with a reason.
    #[serde(default)]
    pub ignored: BTreeMap<String, String>,
}

impl CategoryConfig {
    /// Load and validate a category configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::CategoryConfig(format!(
                "file not found: {}",
                path.display()
            )));
        }
        Self::from_figment(Figment::new().merge(Toml::file(path)))
    }

    /// Parse and validate a category configuration from TOML text.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        Self::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    fn from_figment(figment: Figment) -> Result<Self, AppError> {
        let config: Self = figment
            .extract()
            .map_err(|e| AppError::CategoryConfig(e.to_string()))?;
        config.build_lookup()?;
        Ok(config)
    }

    /// Build the identifier → category name map.
    ///
    /// Fails if an identifier is empty or listed under two categories.
    pub fn build_lookup(&self) -> Result<HashMap<String, String>, AppError> {
        let mut lookup = HashMap::new();
        for (name, category) in &self.categories {
            for id in &category.members {
                if id.trim().is_empty() {
                    return Err(AppError::CategoryConfig(format!(
                        "empty identifier in category {}",
                        name
                    )));
                }
                if let Some(existing) = lookup.insert(id.clone(), name.clone()) {
                    return Err(AppError::CategoryConfig(format!(
                        "{} listed under both {} and {}",
                        id, existing, name
                    )));
                }
            }
        }
        if let Some(id) = self.ignored.keys().find(|id| id.trim().is_empty()) {
            return Err(AppError::CategoryConfig(format!(
                "empty identifier in ignore list: {:?}",
                id
            )));
        }
        Ok(lookup)
    }

    /// Size tier of a category; categories unknown here report the default.
    pub fn size_of(&self, category: &str) -> SizeTier {
        self.categories
            .get(category)
            .map(|c| c.size)
            .unwrap_or_default()
    }

    /// Notability threshold of a category, 0 if unknown.
    pub fn min_notability_of(&self, category: &str) -> u32 {
        self.categories
            .get(category)
            .map(|c| c.min_notability)
            .unwrap_or(0)
    }

    pub fn is_ignored(&self, id: &str) -> bool {
        self.ignored.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [categories.City]
        size = "L"
        min_notability = 10
        members = ["Q515", "Q1549591"]

        [categories.Mountain]
        size = "XL"
        members = ["Q8502"]

        [ignored]
        Q5 = "humans are not places"
    "#;

    #[test]
    fn test_parse_sample() {
        let config = CategoryConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.size_of("City"), SizeTier::L);
        assert_eq!(config.min_notability_of("City"), 10);
        assert_eq!(config.min_notability_of("Mountain"), 0);
        assert!(config.is_ignored("Q5"));
        assert!(!config.is_ignored("Q515"));
    }

    #[test]
    fn test_build_lookup() {
        let config = CategoryConfig::from_toml_str(SAMPLE).unwrap();
        let lookup = config.build_lookup().unwrap();
        assert_eq!(lookup.get("Q515").map(String::as_str), Some("City"));
        assert_eq!(lookup.get("Q1549591").map(String::as_str), Some("City"));
        assert_eq!(lookup.get("Q8502").map(String::as_str), Some("Mountain"));
        assert_eq!(lookup.len(), 3);
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let toml = r#"
            [categories.City]
            members = ["Q515"]

            [categories.Town]
            members = ["Q515"]
        "#;
        let err = CategoryConfig::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("Q515 listed under both City and Town"));
    }

    #[test]
    fn test_unknown_category_defaults() {
        let config = CategoryConfig::default();
        assert_eq!(config.size_of("Temple"), SizeTier::M);
        assert_eq!(config.min_notability_of("Temple"), 0);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CategoryConfig::load("/nonexistent/categories.toml").unwrap_err();
        assert!(matches!(err, AppError::CategoryConfig(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = CategoryConfig::load(&path).unwrap();
        assert_eq!(config.size_of("Mountain"), SizeTier::XL);
    }
}
