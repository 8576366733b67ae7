//! Identifier → category lookup over static configuration and regional overrides.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::CategoryConfig;
use crate::services::regional::RegionalCategories;

/// Direct lookup tables built once from [`CategoryConfig`].
#[derive(Debug)]
pub(crate) struct StaticLookup {
    config: Arc<CategoryConfig>,
    categories: HashMap<String, String>,
    ignored: HashSet<String>,
}

impl StaticLookup {
    pub fn new(config: Arc<CategoryConfig>) -> Result<Self, AppError> {
        let categories = config.build_lookup()?;
        let ignored = config.ignored.keys().cloned().collect();
        Ok(Self {
            config,
            categories,
            ignored,
        })
    }

    pub fn config(&self) -> &Arc<CategoryConfig> {
        &self.config
    }

    pub fn category_of(&self, id: &str) -> Option<&str> {
        self.categories.get(id).map(String::as_str)
    }

    pub fn is_ignored(&self, id: &str) -> bool {
        self.ignored.contains(id)
    }
}

/// A lookup hit. `regional` hits must never be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LookupMatch {
    pub category: String,
    pub regional: bool,
}

/// Lookup view used for one traversal.
///
/// Holds a snapshot of the regional set taken when the call began, so a
/// concurrent swap never changes the answer halfway through a traversal.
/// `regional` is `None` for static-only resolution.
#[derive(Debug, Clone)]
pub(crate) struct LookupScope<'a> {
    lookup: &'a StaticLookup,
    regional: Option<Arc<RegionalCategories>>,
}

impl<'a> LookupScope<'a> {
    pub fn new(lookup: &'a StaticLookup, regional: Option<Arc<RegionalCategories>>) -> Self {
        Self { lookup, regional }
    }

    pub fn static_only(lookup: &'a StaticLookup) -> Self {
        Self::new(lookup, None)
    }

    /// Static table first, then the regional layer.
    pub fn lookup_match(&self, id: &str) -> Option<LookupMatch> {
        if let Some(category) = self.lookup.category_of(id) {
            return Some(LookupMatch {
                category: category.to_string(),
                regional: false,
            });
        }
        self.regional
            .as_ref()
            .and_then(|r| r.category_of(id))
            .map(|category| LookupMatch {
                category: category.to_string(),
                regional: true,
            })
    }

    pub fn is_ignored(&self, id: &str) -> bool {
        self.lookup.is_ignored(id)
    }

    /// Whether cached negative verdicts must be re-derived.
    pub fn bypass_sentinels(&self) -> bool {
        self.regional.as_ref().is_some_and(|r| !r.is_empty())
    }

    /// First parent with a lookup hit, in parent order.
    pub fn first_match<'p>(
        &self,
        parents: impl IntoIterator<Item = &'p String>,
    ) -> Option<LookupMatch> {
        parents.into_iter().find_map(|p| self.lookup_match(p))
    }

    /// First ignore-listed parent, in parent order.
    pub fn first_ignored<'p>(
        &self,
        parents: impl IntoIterator<Item = &'p String>,
    ) -> Option<&'p String> {
        parents.into_iter().find(|p| self.is_ignored(p))
    }
}
