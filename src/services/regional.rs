//! Regional override layer.
//!
//! A transient identifier → category map the host swaps in when its region of
//! operation changes. Entries here are never written to the hierarchy store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// An immutable set of regional categories and labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalCategories {
    #[serde(default)]
    pub categories: HashMap<String, String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl RegionalCategories {
    pub fn new(categories: HashMap<String, String>, labels: HashMap<String, String>) -> Self {
        Self { categories, labels }
    }

    pub fn category_of(&self, id: &str) -> Option<&str> {
        self.categories.get(id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Lock-guarded holder of the active [`RegionalCategories`].
///
/// Mutators build a new set and swap the `Arc` under the write lock; readers
/// clone the `Arc` under the read lock and never see a half-updated map.
#[derive(Debug, Default)]
pub struct RegionalOverrides {
    current: RwLock<Arc<RegionalCategories>>,
}

impl RegionalOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active set.
    pub fn snapshot(&self) -> Arc<RegionalCategories> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Merges `categories` and `labels` into the active set.
    pub fn add(&self, categories: HashMap<String, String>, labels: HashMap<String, String>) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        let mut next = RegionalCategories::clone(&current);
        next.categories.extend(categories);
        next.labels.extend(labels);
        tracing::info!(
            categories = next.categories.len(),
            labels = next.labels.len(),
            "Regional categories updated"
        );
        *current = Arc::new(next);
    }

    /// Drops all regional categories and labels.
    pub fn reset(&self) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        if !current.is_empty() || !current.labels.is_empty() {
            tracing::info!("Regional categories reset");
        }
        *current = Arc::new(RegionalCategories::default());
    }

    pub fn categories(&self) -> HashMap<String, String> {
        self.snapshot().categories.clone()
    }

    pub fn labels(&self) -> HashMap<String, String> {
        self.snapshot().labels.clone()
    }

    pub fn has_categories(&self) -> bool {
        !self.snapshot().is_empty()
    }
}
