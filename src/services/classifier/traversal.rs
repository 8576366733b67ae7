//! Structural resolution: direct parents, then breadth-first layer search.
//!
//! Cycles are bounded by a `visited` set seeded with the root and its direct
//! parents; depth by [`MAX_DEPTH`] layers. Each layer batches every node the
//! store cannot answer into a single graph call.

use std::collections::{HashMap, HashSet};

use crate::error::AppError;
use crate::graph::Relation;
use crate::models::{Classification, HierarchyNode, Resolution, Sentinel};
use crate::services::lookup::{LookupMatch, LookupScope};

use super::ClassificationService;

/// Maximum number of breadth-first layers above the direct parents.
pub const MAX_DEPTH: usize = 4;

/// What one frontier node contributes to its layer.
#[derive(Debug)]
enum Step {
    /// Known to resolve to a category.
    Category(String),
    /// Known ignored.
    Ignored,
    /// Known dead end, or unreadable. Contributes nothing.
    Nothing,
    /// Scan and expand these parents.
    Expand(Vec<String>),
    /// Unknown to the store; fetch in this layer's batch.
    Fetch,
}

/// Bookkeeping for one traversal.
#[derive(Debug, Default)]
struct Traversal {
    visited: HashSet<String>,
    /// Node → the child it was first reached from.
    reached_from: HashMap<String, String>,
    parents_of: HashMap<String, Vec<String>>,
    labels: HashMap<String, String>,
    /// Nodes already stored as ignored.
    ignored: HashSet<String>,
    /// A branch failed, so a negative outcome is not trustworthy.
    incomplete: bool,
}

impl Traversal {
    /// Nodes from `node` back to (excluding) `root`, nearest to `node` first.
    fn chain_to_root(&self, node: &str, root: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = node;
        while current != root {
            chain.push(current.to_string());
            match self.reached_from.get(current) {
                Some(child) => current = child.as_str(),
                None => break,
            }
        }
        chain
    }
}

/// Deduplicates preserving order and drops self-references.
fn clean_parents(id: &str, parents: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    parents
        .into_iter()
        .filter(|p| p != id && seen.insert(p.clone()))
        .collect()
}

impl ClassificationService {
    /// Resolves a class from its structure once the fast path missed.
    pub(super) async fn resolve_structure(
        &self,
        scope: &LookupScope<'_>,
        root: &str,
    ) -> Result<Option<Classification>, AppError> {
        let bypass = scope.bypass_sentinels();
        let mut label = String::new();
        let mut known_parents = None;

        if let Some(node) = self.store.get_hierarchy(root).await? {
            match &node.resolution {
                Resolution::Category(category) => return Ok(Some(self.matched(category))),
                Resolution::Sentinel(Sentinel::Ignored) if !bypass => {
                    return Ok(Some(Classification::Ignored))
                }
                Resolution::Sentinel(Sentinel::DeadEnd) if !bypass => return Ok(None),
                _ => {}
            }
            label = node.label;
            if !node.parents.is_empty() {
                known_parents = Some(node.parents);
            }
        }

        let parents = match known_parents {
            Some(parents) => parents,
            None => {
                let claims = self
                    .graph
                    .get_entity_claims(root, Relation::SubclassOf)
                    .await?;
                if label.is_empty() {
                    label = claims.label;
                }
                claims.targets
            }
        };
        let parents = clean_parents(root, parents);

        if let Some(hit) = scope.first_match(&parents) {
            return self.finalize_match(root, &parents, &label, hit).await;
        }
        if let Some(ignored) = scope.first_ignored(&parents) {
            tracing::debug!(id = %root, parent = %ignored, "Direct parent is ignored");
            return self.finalize_ignored(root, &parents, &label).await;
        }

        self.layer_search(scope, root, parents, label).await
    }

    async fn layer_search(
        &self,
        scope: &LookupScope<'_>,
        root: &str,
        root_parents: Vec<String>,
        root_label: String,
    ) -> Result<Option<Classification>, AppError> {
        let bypass = scope.bypass_sentinels();
        let mut state = Traversal::default();
        state.visited.insert(root.to_string());
        for parent in &root_parents {
            state.visited.insert(parent.clone());
            state.reached_from.insert(parent.clone(), root.to_string());
        }
        state.parents_of.insert(root.to_string(), root_parents.clone());

        let mut frontier = root_parents.clone();

        for depth in 1..=MAX_DEPTH {
            if frontier.is_empty() {
                break;
            }

            let mut steps = Vec::with_capacity(frontier.len());
            for id in &frontier {
                steps.push(self.known_step(id, bypass, &mut state).await);
            }

            let to_fetch: Vec<String> = frontier
                .iter()
                .zip(&steps)
                .filter(|(_, step)| matches!(step, Step::Fetch))
                .map(|(id, _)| id.clone())
                .collect();

            tracing::debug!(
                root = %root,
                depth,
                frontier = frontier.len(),
                fetch = to_fetch.len(),
                "Expanding layer"
            );

            if !to_fetch.is_empty() {
                let mut fetched = self.fetch_layer(&to_fetch, &mut state).await;
                for (id, step) in frontier.iter().zip(steps.iter_mut()) {
                    if matches!(step, Step::Fetch) {
                        *step = fetched
                            .remove(id)
                            .map(Step::Expand)
                            .unwrap_or(Step::Nothing);
                    }
                }
            }

            // A match anywhere in the layer outranks an ignore anywhere in it.
            if let Some(hit) = layer_match(scope, &steps) {
                return self
                    .finalize_match(root, &root_parents, &root_label, hit)
                    .await;
            }

            if let Some(node) = layer_ignore(scope, &frontier, &steps) {
                tracing::debug!(root = %root, via = %node, depth, "Ignored ancestor found");
                self.propagate_ignored(root, node, &state).await?;
                return self
                    .finalize_ignored(root, &root_parents, &root_label)
                    .await;
            }

            let mut next = Vec::new();
            for (id, step) in frontier.iter().zip(&steps) {
                if let Step::Expand(parents) = step {
                    for parent in parents {
                        if state.visited.insert(parent.clone()) {
                            state.reached_from.insert(parent.clone(), id.clone());
                            next.push(parent.clone());
                        }
                    }
                }
            }
            frontier = next;
        }

        if state.incomplete {
            tracing::debug!(root = %root, "Traversal incomplete, dead end not cached");
            return Ok(None);
        }

        tracing::debug!(root = %root, "Dead end");
        self.store
            .save_classification(root, &Resolution::dead_end(), &root_parents, &root_label)
            .await
            .map_err(|e| AppError::persist(root, e))?;
        Ok(None)
    }

    /// Classifies a frontier node from the store alone.
    async fn known_step(&self, id: &str, bypass: bool, state: &mut Traversal) -> Step {
        let node = match self.store.get_hierarchy(id).await {
            Ok(Some(node)) => node,
            Ok(None) => return Step::Fetch,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Skipping unreadable node");
                state.incomplete = true;
                return Step::Nothing;
            }
        };

        let parents = clean_parents(id, node.parents);
        state.labels.insert(id.to_string(), node.label);

        match node.resolution {
            Resolution::Category(category) => return Step::Category(category),
            Resolution::Sentinel(Sentinel::Ignored) if !bypass => {
                state.ignored.insert(id.to_string());
                return Step::Ignored;
            }
            Resolution::Sentinel(Sentinel::DeadEnd) if !bypass => return Step::Nothing,
            _ => {}
        }

        if parents.is_empty() {
            return Step::Fetch;
        }
        state.parents_of.insert(id.to_string(), parents.clone());
        Step::Expand(parents)
    }

    /// Fetches one layer's unknown nodes in a single batch call.
    ///
    /// Every fetched node with a definite static verdict is cached right away.
    /// Returns parents by id; on failure the nodes are skipped.
    async fn fetch_layer(
        &self,
        ids: &[String],
        state: &mut Traversal,
    ) -> HashMap<String, Vec<String>> {
        let mut batch = match self
            .graph
            .get_entity_claims_batch(ids, Relation::SubclassOf)
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(count = ids.len(), error = %e, "Layer fetch failed, skipping branch");
                state.incomplete = true;
                return HashMap::new();
            }
        };

        let mut fetched = HashMap::with_capacity(ids.len());
        for id in ids {
            let parents = clean_parents(id, batch.targets.remove(id).unwrap_or_default());
            let label = batch.labels.remove(id).unwrap_or_default();

            if let Some(resolution) = self.static_verdict(&parents) {
                if resolution == Resolution::ignored() {
                    state.ignored.insert(id.clone());
                }
                let node = HierarchyNode::new(id.clone(), label.clone(), parents.clone(), resolution);
                if let Err(e) = self.store.save_hierarchy(&node).await {
                    tracing::warn!(id = %id, error = %e, "Failed to cache intermediate node");
                }
            }

            state.labels.insert(id.clone(), label);
            state.parents_of.insert(id.clone(), parents.clone());
            fetched.insert(id.clone(), parents);
        }
        fetched
    }

    /// Verdict for a freshly fetched node from its parents, static config only.
    ///
    /// `None` when the node has parents but none decide it; such nodes are
    /// not cached, so an undetermined node never looks visited.
    fn static_verdict(&self, parents: &[String]) -> Option<Resolution> {
        let scope = LookupScope::static_only(&self.lookup);
        if let Some(hit) = scope.first_match(parents) {
            Some(Resolution::Category(hit.category))
        } else if scope.first_ignored(parents).is_some() {
            Some(Resolution::ignored())
        } else if parents.is_empty() {
            Some(Resolution::dead_end())
        } else {
            None
        }
    }

    /// Marks every node on the path from `node` down to `root` as ignored.
    async fn propagate_ignored(
        &self,
        root: &str,
        node: &str,
        state: &Traversal,
    ) -> Result<(), AppError> {
        for id in state.chain_to_root(node, root) {
            if state.ignored.contains(&id) {
                continue;
            }
            let parents = state.parents_of.get(&id).cloned().unwrap_or_default();
            let label = state.labels.get(&id).cloned().unwrap_or_default();
            self.store
                .save_classification(&id, &Resolution::ignored(), &parents, &label)
                .await
                .map_err(|e| AppError::persist(&id, e))?;
        }
        Ok(())
    }

    /// Persists a category for `id` unless it came from the regional layer.
    async fn finalize_match(
        &self,
        id: &str,
        parents: &[String],
        label: &str,
        hit: LookupMatch,
    ) -> Result<Option<Classification>, AppError> {
        if hit.regional {
            tracing::debug!(id = %id, category = %hit.category, "Regional match, not cached");
        } else {
            self.store
                .save_classification(id, &Resolution::category(&hit.category), parents, label)
                .await
                .map_err(|e| AppError::persist(id, e))?;
        }
        Ok(Some(self.matched(&hit.category)))
    }

    async fn finalize_ignored(
        &self,
        id: &str,
        parents: &[String],
        label: &str,
    ) -> Result<Option<Classification>, AppError> {
        self.store
            .save_classification(id, &Resolution::ignored(), parents, label)
            .await
            .map_err(|e| AppError::persist(id, e))?;
        Ok(Some(Classification::Ignored))
    }
}

/// First category in the layer, in frontier order.
fn layer_match(scope: &LookupScope<'_>, steps: &[Step]) -> Option<LookupMatch> {
    steps.iter().find_map(|step| match step {
        Step::Category(category) => Some(LookupMatch {
            category: category.clone(),
            regional: false,
        }),
        Step::Expand(parents) => scope.first_match(parents),
        _ => None,
    })
}

/// First node in the layer that is ignored or has an ignored parent.
fn layer_ignore<'f>(
    scope: &LookupScope<'_>,
    frontier: &'f [String],
    steps: &[Step],
) -> Option<&'f str> {
    frontier
        .iter()
        .zip(steps)
        .find(|(_, step)| match step {
            Step::Ignored => true,
            Step::Expand(parents) => scope.first_ignored(parents).is_some(),
            _ => false,
        })
        .map(|(id, _)| id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_parents() {
        let parents = vec![
            "Q2".to_string(),
            "Q1".to_string(),
            "Q3".to_string(),
            "Q2".to_string(),
        ];
        assert_eq!(
            clean_parents("Q1", parents),
            vec!["Q2".to_string(), "Q3".to_string()]
        );
    }

    #[test]
    fn test_chain_to_root() {
        let mut state = Traversal::default();
        state.reached_from.insert("Q2".to_string(), "Q1".to_string());
        state.reached_from.insert("Q3".to_string(), "Q2".to_string());
        state.reached_from.insert("Q4".to_string(), "Q3".to_string());

        assert_eq!(
            state.chain_to_root("Q4", "Q1"),
            vec!["Q4".to_string(), "Q3".to_string(), "Q2".to_string()]
        );
        assert!(state.chain_to_root("Q1", "Q1").is_empty());
    }
}
