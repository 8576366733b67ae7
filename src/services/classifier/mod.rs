//! Hierarchy classification engine.
//!
//! Decides which single configured category a knowledge-graph identifier
//! belongs to by walking its "instance-of" targets and their "subclass-of"
//! ancestry. Class verdicts are cached in the [`HierarchyStore`]; subjects
//! never are.
//!
//! # Resolution order for a class
//!
//! 1. Static configuration, then regional overrides (direct hit).
//! 2. The store's flat classification slot. Cached `IGNORED`/`DEAD_END`
//!    verdicts are trusted only while no regional overrides are active.
//! 3. Structural resolution: direct parents, then a breadth-first search of
//!    at most [`MAX_DEPTH`] layers (see `traversal`).
//!
//! # Example
//!
//! ```ignore
//! let service = ClassificationService::new(config, graph, store)?;
//! match service.classify("Q64").await? {
//!     Some(Classification::Matched { category, size }) => println!("{category} ({size})"),
//!     Some(Classification::Ignored) => println!("not interesting"),
//!     None => println!("no opinion"),
//! }
//! ```

mod traversal;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AppError;
use crate::graph::{GraphClient, Relation};
use crate::models::{
    CategoryConfig, Classification, EntityMetadata, Explanation, Resolution, Sentinel,
};
use crate::services::lookup::{LookupScope, StaticLookup};
use crate::services::regional::RegionalOverrides;
use crate::store::HierarchyStore;

pub use traversal::MAX_DEPTH;

/// Class verdicts already computed during one call.
type Memo = HashMap<String, Option<Classification>>;

/// The classification engine.
///
/// Cheap to clone; clones share collaborators and the regional override set.
/// Safe to call concurrently for different subjects.
#[derive(Clone)]
pub struct ClassificationService {
    graph: Arc<dyn GraphClient>,
    store: Arc<dyn HierarchyStore>,
    lookup: Arc<StaticLookup>,
    regional: Arc<RegionalOverrides>,
}

impl ClassificationService {
    /// Builds the engine. Fails if the category configuration is invalid.
    pub fn new(
        config: Arc<CategoryConfig>,
        graph: Arc<dyn GraphClient>,
        store: Arc<dyn HierarchyStore>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            graph,
            store,
            lookup: Arc::new(StaticLookup::new(config)?),
            regional: Arc::new(RegionalOverrides::new()),
        })
    }

    /// The static category configuration.
    pub fn config(&self) -> &CategoryConfig {
        self.lookup.config()
    }

    /// Classifies a subject (a concrete entity) through its "instance-of" targets.
    ///
    /// A category found on any target outranks an ignore found on another.
    /// Failures fetching the subject itself, and failures persisting a
    /// verdict, are returned; failures inside one target's branch are logged
    /// and that branch is skipped.
    pub async fn classify(&self, subject: &str) -> Result<Option<Classification>, AppError> {
        let scope = self.scope();
        if let Some(hit) = scope.lookup_match(subject) {
            return Ok(Some(self.matched(&hit.category)));
        }

        let claims = self
            .graph
            .get_entity_claims(subject, Relation::InstanceOf)
            .await?;

        let verdict = self
            .resolve_instances(&scope, &claims.targets, &mut Memo::new())
            .await?;
        Ok(verdict.map(|(classification, _)| classification))
    }

    /// Classifies many subjects whose "instance-of" targets are already known.
    ///
    /// Each distinct class is resolved at most once per call. A subject whose
    /// resolution fails is logged and left out of the result.
    pub async fn classify_batch(
        &self,
        subjects: &HashMap<String, EntityMetadata>,
    ) -> HashMap<String, Classification> {
        let scope = self.scope();
        let mut memo = Memo::new();
        let mut results = HashMap::new();

        let mut ids: Vec<&String> = subjects.keys().collect();
        ids.sort();

        for subject in ids {
            if let Some(hit) = scope.lookup_match(subject) {
                results.insert(subject.clone(), self.matched(&hit.category));
                continue;
            }

            let instances = subjects[subject].targets(Relation::InstanceOf);
            match self.resolve_instances(&scope, instances, &mut memo).await {
                Ok(Some((classification, _))) => {
                    results.insert(subject.clone(), classification);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(subject = %subject, error = %e, "Dropping subject from batch");
                }
            }
        }

        results
    }

    /// Classifies a subject and reports how the verdict was reached.
    ///
    /// Performs exactly the reads and writes [`classify`](Self::classify) does.
    pub async fn explain(&self, subject: &str) -> Result<Explanation, AppError> {
        let scope = self.scope();
        let mut explanation = Explanation {
            subject: subject.to_string(),
            ..Explanation::default()
        };

        if let Some(hit) = scope.lookup_match(subject) {
            explanation.direct = true;
            self.fill_match(&mut explanation, &hit.category);
            return Ok(explanation);
        }

        let claims = self
            .graph
            .get_entity_claims(subject, Relation::InstanceOf)
            .await?;
        explanation.instances = claims.targets.clone();

        match self
            .resolve_instances(&scope, &claims.targets, &mut Memo::new())
            .await?
        {
            Some((Classification::Matched { category, .. }, instance)) => {
                self.fill_match(&mut explanation, &category);
                explanation.matched_instance = Some(instance);
            }
            Some((Classification::Ignored, instance)) => {
                explanation.ignored = true;
                explanation.matched_instance = Some(instance);
            }
            None => {}
        }

        Ok(explanation)
    }

    /// Whether `class_id` resolves to a category with the regional layer off.
    pub async fn is_covered_by_static_config(&self, class_id: &str) -> Result<bool, AppError> {
        let scope = LookupScope::static_only(&self.lookup);
        let verdict = self.classify_class(&scope, class_id).await?;
        Ok(matches!(verdict, Some(Classification::Matched { .. })))
    }

    /// Merges regional categories and labels into the active override set.
    pub fn add_regional_categories(
        &self,
        categories: HashMap<String, String>,
        labels: HashMap<String, String>,
    ) {
        self.regional.add(categories, labels);
    }

    pub fn reset_regional_categories(&self) {
        self.regional.reset();
    }

    pub fn regional_categories(&self) -> HashMap<String, String> {
        self.regional.categories()
    }

    pub fn regional_labels(&self) -> HashMap<String, String> {
        self.regional.labels()
    }

    pub fn has_regional_categories(&self) -> bool {
        self.regional.has_categories()
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    fn scope(&self) -> LookupScope<'_> {
        LookupScope::new(&self.lookup, Some(self.regional.snapshot()))
    }

    fn matched(&self, category: &str) -> Classification {
        Classification::matched(category, self.config().size_of(category))
    }

    fn fill_match(&self, explanation: &mut Explanation, category: &str) {
        let config = self.config();
        explanation.category = Some(category.to_string());
        explanation.size = Some(config.size_of(category));
        explanation.min_notability = Some(config.min_notability_of(category));
    }

    /// Picks the winning verdict across instance targets, with the instance
    /// that produced it.
    async fn resolve_instances(
        &self,
        scope: &LookupScope<'_>,
        instances: &[String],
        memo: &mut Memo,
    ) -> Result<Option<(Classification, String)>, AppError> {
        let mut ignored_by: Option<&String> = None;

        for instance in instances {
            let outcome = match memo.get(instance) {
                Some(cached) => Ok(cached.clone()),
                None => self.classify_class(scope, instance).await,
            };

            match outcome {
                Ok(verdict) => {
                    memo.insert(instance.clone(), verdict.clone());
                    match verdict {
                        Some(matched @ Classification::Matched { .. }) => {
                            return Ok(Some((matched, instance.clone())));
                        }
                        Some(Classification::Ignored) => {
                            ignored_by.get_or_insert(instance);
                        }
                        None => {}
                    }
                }
                Err(e) if e.is_persistence() => return Err(e),
                Err(e) => {
                    tracing::warn!(instance = %instance, error = %e, "Skipping instance branch");
                }
            }
        }

        Ok(ignored_by.map(|instance| (Classification::Ignored, instance.clone())))
    }

    /// Resolves a taxonomy class.
    async fn classify_class(
        &self,
        scope: &LookupScope<'_>,
        id: &str,
    ) -> Result<Option<Classification>, AppError> {
        if let Some(hit) = scope.lookup_match(id) {
            return Ok(Some(self.matched(&hit.category)));
        }
        if scope.is_ignored(id) {
            return Ok(Some(Classification::Ignored));
        }

        let bypass = scope.bypass_sentinels();
        match self.store.get_classification(id).await? {
            Some(Resolution::Category(category)) => {
                tracing::debug!(id = %id, category = %category, "Cached category");
                return Ok(Some(self.matched(&category)));
            }
            Some(Resolution::Sentinel(Sentinel::Ignored)) if !bypass => {
                tracing::debug!(id = %id, "Cached ignore");
                return Ok(Some(Classification::Ignored));
            }
            Some(Resolution::Sentinel(Sentinel::DeadEnd)) if !bypass => {
                tracing::debug!(id = %id, "Cached dead end");
                return Ok(None);
            }
            Some(Resolution::Sentinel(sentinel)) => {
                tracing::debug!(id = %id, ?sentinel, "Re-deriving cached sentinel under regional overrides");
            }
            Some(Resolution::Unresolved) | None => {}
        }

        self.resolve_structure(scope, id).await
    }
}
