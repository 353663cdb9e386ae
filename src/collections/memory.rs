//! In-memory collection backend with failure injection, for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::collections::{BackendError, CollectionBackend};
use crate::models::{CatalogItem, CollectionKind};

/// Backend operation, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    List,
    Insert,
    Remove,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: HashMap<CollectionKind, Vec<CatalogItem>>,
    failures: HashMap<(BackendOp, CollectionKind), usize>,
    calls: Vec<(BackendOp, CollectionKind, String)>,
}

/// A backend holding rows in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store rows directly, bypassing duplicate checks.
    pub fn seed(&self, kind: CollectionKind, items: Vec<CatalogItem>) {
        self.state().rows.entry(kind).or_default().extend(items);
    }

    /// Make the next `times` calls of `op` on `kind` fail.
    pub fn fail_next(&self, op: BackendOp, kind: CollectionKind, times: usize) {
        self.state().failures.insert((op, kind), times);
    }

    /// Rows currently stored in a collection.
    pub fn rows(&self, kind: CollectionKind) -> Vec<CatalogItem> {
        self.state().rows.get(&kind).cloned().unwrap_or_default()
    }

    /// Calls received so far as (operation, collection, id); `list` records an empty id.
    pub fn calls(&self) -> Vec<(BackendOp, CollectionKind, String)> {
        self.state().calls.clone()
    }

    fn begin(
        state: &mut MemoryState,
        op: BackendOp,
        kind: CollectionKind,
        id: &str,
    ) -> Result<(), BackendError> {
        state.calls.push((op, kind, id.to_string()));
        if let Some(remaining) = state.failures.get_mut(&(op, kind)) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BackendError::Injected(format!("{:?} {}", op, kind)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CollectionBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list(&self, kind: CollectionKind) -> Result<Vec<CatalogItem>, BackendError> {
        let mut state = self.state();
        Self::begin(&mut state, BackendOp::List, kind, "")?;
        Ok(state.rows.get(&kind).cloned().unwrap_or_default())
    }

    async fn insert(&self, kind: CollectionKind, item: &CatalogItem) -> Result<(), BackendError> {
        let mut state = self.state();
        Self::begin(&mut state, BackendOp::Insert, kind, &item.id)?;

        let rows = state.rows.entry(kind).or_default();
        if rows.iter().any(|row| row.id == item.id) {
            return Err(BackendError::Conflict {
                id: item.id.clone(),
                collection: kind,
            });
        }
        rows.push(item.clone());
        Ok(())
    }

    async fn remove(&self, kind: CollectionKind, id: &str) -> Result<(), BackendError> {
        let mut state = self.state();
        Self::begin(&mut state, BackendOp::Remove, kind, id)?;

        if let Some(rows) = state.rows.get_mut(&kind) {
            rows.retain(|row| row.id != id);
        }
        Ok(())
    }
}
