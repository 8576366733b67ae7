//! Process-local hierarchy store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::AppError;
use crate::models::{HierarchyNode, Resolution};
use crate::store::traits::HierarchyStore;

#[derive(Debug, Default)]
struct Tables {
    nodes: HashMap<String, HierarchyNode>,
    legacy: HashMap<String, Resolution>,
}

/// In-memory [`HierarchyStore`].
///
/// Cheap to clone; clones share the same tables. Counts writes and can be
/// told to fail them, for exercising persistence error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    saves: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a legacy flat classification with no structural data.
    pub fn insert_legacy(&self, id: &str, resolution: Resolution) {
        self.tables().legacy.insert(id.to_string(), resolution);
    }

    /// Seeds a structural node without counting it as a write.
    pub fn insert_node(&self, node: HierarchyNode) {
        self.tables().nodes.insert(node.id.clone(), node);
    }

    /// Stored node for `id`, for inspection.
    pub fn node(&self, id: &str) -> Option<HierarchyNode> {
        self.tables().nodes.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tables().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful and attempted writes.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self, mut node: HierarchyNode) -> Result<(), AppError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Store(format!("write rejected for {}", node.id)));
        }
        let mut tables = self.tables();
        if let Some(existing) = tables.nodes.get(&node.id) {
            if node.parents.is_empty() {
                node.parents = existing.parents.clone();
            }
            if node.label.is_empty() {
                node.label = existing.label.clone();
            }
        }
        tables.nodes.insert(node.id.clone(), node);
        Ok(())
    }
}

#[async_trait]
impl HierarchyStore for MemoryStore {
    async fn get_classification(&self, id: &str) -> Result<Option<Resolution>, AppError> {
        let tables = self.tables();
        Ok(tables
            .nodes
            .get(id)
            .map(|node| node.resolution.clone())
            .or_else(|| tables.legacy.get(id).cloned()))
    }

    async fn save_classification(
        &self,
        id: &str,
        resolution: &Resolution,
        parents: &[String],
        label: &str,
    ) -> Result<(), AppError> {
        let mut node = HierarchyNode::new(id, label, parents.to_vec(), resolution.clone());
        node.updated_at = Some(Utc::now());
        self.write(node)
    }

    async fn get_hierarchy(&self, id: &str) -> Result<Option<HierarchyNode>, AppError> {
        Ok(self.tables().nodes.get(id).cloned())
    }

    async fn save_hierarchy(&self, node: &HierarchyNode) -> Result<(), AppError> {
        let mut node = node.clone();
        node.updated_at = Some(Utc::now());
        self.write(node)
    }
}
