//! The two reading collections and the rules for moving items between them.

use std::collections::HashSet;
use std::sync::Arc;

use crate::collections::{BackendError, CollectionBackend};
use crate::models::{CatalogItem, CollectionKind};
use crate::utils::{dedup_by_id, duplicate_ids, with_retry, RetryConfig};

/// Errors from collection mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    /// The item is already in a collection
    #[error("{id} is already in your {collection} list")]
    Duplicate {
        id: String,
        collection: CollectionKind,
    },

    /// The backend rejected the change; nothing was modified
    #[error("Failed to save collection change: {0}")]
    Persistence(#[from] BackendError),

    /// The item reached Read but its WantToRead row could not be deleted
    #[error("{id} was moved to read but is still stored in want to read: {source}")]
    PartialMove {
        id: String,
        #[source]
        source: BackendError,
    },
}

/// Owner of the WantToRead and Read collections.
///
/// An id is in at most one collection at a time and at most once within it.
/// In-memory state changes only after the backend confirms a write.
#[derive(Debug)]
pub struct CollectionStore {
    backend: Arc<dyn CollectionBackend>,
    want_to_read: Vec<CatalogItem>,
    read: Vec<CatalogItem>,
    // ids moved to Read whose WantToRead row is still persisted
    pending_deletes: Vec<String>,
    retry: RetryConfig,
}

impl CollectionStore {
    /// Create a store with empty collections
    pub fn new(backend: Arc<dyn CollectionBackend>) -> Self {
        Self {
            backend,
            want_to_read: Vec::new(),
            read: Vec::new(),
            pending_deletes: Vec::new(),
            retry: RetryConfig::default(),
        }
    }

    /// Retry policy for corrective deletes
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Load both collections from the backend.
    ///
    /// Repeated ids keep their first row. An id stored in both collections
    /// belongs to Read; its WantToRead row is deleted.
    pub async fn load(
        backend: Arc<dyn CollectionBackend>,
        retry: RetryConfig,
    ) -> Result<Self, CollectionError> {
        let want_rows = backend.list(CollectionKind::WantToRead).await?;
        let read_rows = backend.list(CollectionKind::Read).await?;

        for (kind, rows) in [
            (CollectionKind::WantToRead, &want_rows),
            (CollectionKind::Read, &read_rows),
        ] {
            let dups = duplicate_ids(rows);
            if !dups.is_empty() {
                tracing::warn!(collection = %kind, ids = ?dups, "Ignoring repeated stored rows");
            }
        }

        let read = dedup_by_id(read_rows);
        let read_ids: HashSet<&str> = read.iter().map(|item| item.id.as_str()).collect();

        let mut want_to_read = Vec::new();
        let mut pending_deletes = Vec::new();
        for item in dedup_by_id(want_rows) {
            if read_ids.contains(item.id.as_str()) {
                pending_deletes.push(item.id);
            } else {
                want_to_read.push(item);
            }
        }

        let mut store = Self {
            backend,
            want_to_read,
            read,
            pending_deletes,
            retry,
        };

        tracing::info!(
            backend = store.backend.name(),
            want_to_read = store.want_to_read.len(),
            read = store.read.len(),
            "Loaded collections"
        );

        if !store.pending_deletes.is_empty() {
            tracing::warn!(
                ids = ?store.pending_deletes,
                "Items stored in both collections, removing from want to read"
            );
            if let Err(e) = store.reconcile().await {
                tracing::warn!("Reconciliation incomplete: {}", e);
            }
        }

        Ok(store)
    }

    /// Current WantToRead snapshot in insertion order
    pub fn list_want_to_read(&self) -> &[CatalogItem] {
        &self.want_to_read
    }

    /// Current Read snapshot in insertion order
    pub fn list_read(&self) -> &[CatalogItem] {
        &self.read
    }

    /// Snapshot of one collection
    pub fn list(&self, kind: CollectionKind) -> &[CatalogItem] {
        match kind {
            CollectionKind::WantToRead => &self.want_to_read,
            CollectionKind::Read => &self.read,
        }
    }

    /// Which collection holds this id, if any
    pub fn membership(&self, id: &str) -> Option<CollectionKind> {
        if self.read.iter().any(|item| item.id == id) {
            Some(CollectionKind::Read)
        } else if self.want_to_read.iter().any(|item| item.id == id) {
            Some(CollectionKind::WantToRead)
        } else {
            None
        }
    }

    /// Ids whose WantToRead row still needs deleting after a partial move
    pub fn pending_reconciliation(&self) -> &[String] {
        &self.pending_deletes
    }

    /// Add an item to WantToRead.
    ///
    /// Fails with [`CollectionError::Duplicate`] if the id is in either collection.
    pub async fn add_to_want_to_read(&mut self, item: CatalogItem) -> Result<(), CollectionError> {
        if let Some(collection) = self.membership(&item.id) {
            return Err(CollectionError::Duplicate {
                id: item.id,
                collection,
            });
        }

        self.backend
            .insert(CollectionKind::WantToRead, &item)
            .await?;

        tracing::info!(id = %item.id, title = %item.title, "Added to want to read");
        self.want_to_read.push(item);
        Ok(())
    }

    /// Move an item into Read, removing it from WantToRead.
    ///
    /// An item that was never in WantToRead is simply added to Read. If it was,
    /// the stored WantToRead payload is the one moved. The Read row is written
    /// first; if the WantToRead delete still fails after retries, the move is
    /// kept, the id is queued for [`reconcile`](Self::reconcile) and
    /// [`CollectionError::PartialMove`] is returned.
    pub async fn move_to_read(&mut self, item: CatalogItem) -> Result<(), CollectionError> {
        if self.read.iter().any(|stored| stored.id == item.id) {
            return Err(CollectionError::Duplicate {
                id: item.id,
                collection: CollectionKind::Read,
            });
        }

        let position = self.want_to_read.iter().position(|stored| stored.id == item.id);
        let payload = match position {
            Some(pos) => self.want_to_read[pos].clone(),
            None => item,
        };

        self.backend.insert(CollectionKind::Read, &payload).await?;

        let Some(pos) = position else {
            tracing::info!(id = %payload.id, title = %payload.title, "Added to read");
            self.read.push(payload);
            return Ok(());
        };

        let backend = Arc::clone(&self.backend);
        let id = payload.id.clone();
        let deleted = with_retry(self.retry, || {
            backend.remove(CollectionKind::WantToRead, &id)
        })
        .await;

        self.want_to_read.remove(pos);
        self.read.push(payload);

        match deleted {
            Ok(()) => {
                tracing::info!(id = %id, "Moved to read");
                Ok(())
            }
            Err(source) => {
                tracing::warn!(id = %id, "Moved to read, want to read row left behind: {}", source);
                self.pending_deletes.push(id.clone());
                Err(CollectionError::PartialMove { id, source })
            }
        }
    }

    /// Retry outstanding WantToRead deletes left by partial moves.
    ///
    /// Returns how many were resolved. Ids that still fail stay queued and the
    /// first failure is reported.
    pub async fn reconcile(&mut self) -> Result<usize, CollectionError> {
        let pending = std::mem::take(&mut self.pending_deletes);
        let mut resolved = 0;
        let mut first_failure = None;

        for id in pending {
            let backend = Arc::clone(&self.backend);
            let result = with_retry(self.retry, || {
                backend.remove(CollectionKind::WantToRead, &id)
            })
            .await;

            match result {
                Ok(()) => resolved += 1,
                Err(source) => {
                    if first_failure.is_none() {
                        first_failure = Some(CollectionError::PartialMove {
                            id: id.clone(),
                            source,
                        });
                    }
                    self.pending_deletes.push(id);
                }
            }
        }

        if resolved > 0 {
            tracing::info!(resolved, "Reconciled want to read rows");
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(resolved),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::memory::{BackendOp, MemoryBackend};
    use std::time::Duration;

    fn fast_retry() -> RetryConfig {
        RetryConfig::default()
            .max_attempts(2)
            .initial_delay(Duration::ZERO)
            .max_delay(Duration::ZERO)
    }

    fn store() -> (Arc<MemoryBackend>, CollectionStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = CollectionStore::new(backend.clone()).with_retry_config(fast_retry());
        (backend, store)
    }

    fn book(id: &str) -> CatalogItem {
        CatalogItem::new(id, format!("Title {}", id))
    }

    fn ids(items: &[CatalogItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_add_preserves_insertion_order() {
        let (backend, mut store) = store();
        store.add_to_want_to_read(book("b")).await.unwrap();
        store.add_to_want_to_read(book("a")).await.unwrap();

        assert_eq!(ids(store.list_want_to_read()), vec!["b", "a"]);
        assert_eq!(ids(&backend.rows(CollectionKind::WantToRead)), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_add_duplicate_rejected() {
        let (backend, mut store) = store();
        store.add_to_want_to_read(book("a")).await.unwrap();

        let err = store.add_to_want_to_read(book("a")).await.unwrap_err();
        assert_eq!(
            err,
            CollectionError::Duplicate {
                id: "a".into(),
                collection: CollectionKind::WantToRead,
            }
        );
        assert_eq!(store.list_want_to_read().len(), 1);
        assert_eq!(backend.rows(CollectionKind::WantToRead).len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejected_when_already_read() {
        let (_, mut store) = store();
        store.move_to_read(book("a")).await.unwrap();

        let err = store.add_to_want_to_read(book("a")).await.unwrap_err();
        assert!(matches!(
            err,
            CollectionError::Duplicate {
                collection: CollectionKind::Read,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_add_persistence_failure_leaves_state() {
        let (backend, mut store) = store();
        backend.fail_next(BackendOp::Insert, CollectionKind::WantToRead, 1);

        let err = store.add_to_want_to_read(book("a")).await.unwrap_err();
        assert!(matches!(err, CollectionError::Persistence(_)));
        assert!(store.list_want_to_read().is_empty());
    }

    #[tokio::test]
    async fn test_move_from_want_to_read() {
        let (backend, mut store) = store();
        store.add_to_want_to_read(book("a")).await.unwrap();
        store.add_to_want_to_read(book("b")).await.unwrap();

        store.move_to_read(book("a")).await.unwrap();

        assert_eq!(ids(store.list_want_to_read()), vec!["b"]);
        assert_eq!(ids(store.list_read()), vec!["a"]);
        assert_eq!(ids(&backend.rows(CollectionKind::WantToRead)), vec!["b"]);
        assert_eq!(ids(&backend.rows(CollectionKind::Read)), vec!["a"]);
        assert_eq!(store.membership("a"), Some(CollectionKind::Read));
    }

    #[tokio::test]
    async fn test_move_writes_read_before_delete() {
        let (backend, mut store) = store();
        store.add_to_want_to_read(book("a")).await.unwrap();
        store.move_to_read(book("a")).await.unwrap();

        let ops: Vec<_> = backend
            .calls()
            .into_iter()
            .map(|(op, kind, _)| (op, kind))
            .collect();
        assert_eq!(
            ops,
            vec![
                (BackendOp::Insert, CollectionKind::WantToRead),
                (BackendOp::Insert, CollectionKind::Read),
                (BackendOp::Remove, CollectionKind::WantToRead),
            ]
        );
    }

    #[tokio::test]
    async fn test_move_without_want_to_read_degrades_to_add() {
        let (backend, mut store) = store();
        store.move_to_read(book("a")).await.unwrap();

        assert!(store.list_want_to_read().is_empty());
        assert_eq!(ids(store.list_read()), vec!["a"]);
        assert!(backend
            .calls()
            .iter()
            .all(|(op, _, _)| *op != BackendOp::Remove));
    }

    #[tokio::test]
    async fn test_move_keeps_first_stored_payload() {
        let (_, mut store) = store();
        store.add_to_want_to_read(book("a")).await.unwrap();

        let updated = CatalogItem::new("a", "Retitled upstream");
        store.move_to_read(updated).await.unwrap();
        assert_eq!(store.list_read()[0].title, "Title a");
    }

    #[tokio::test]
    async fn test_move_twice_is_duplicate() {
        let (_, mut store) = store();
        store.move_to_read(book("a")).await.unwrap();
        let err = store.move_to_read(book("a")).await.unwrap_err();
        assert!(matches!(err, CollectionError::Duplicate { .. }));
        assert_eq!(store.list_read().len(), 1);
    }

    #[tokio::test]
    async fn test_move_insert_failure_changes_nothing() {
        let (backend, mut store) = store();
        store.add_to_want_to_read(book("a")).await.unwrap();
        backend.fail_next(BackendOp::Insert, CollectionKind::Read, 1);

        let err = store.move_to_read(book("a")).await.unwrap_err();
        assert!(matches!(err, CollectionError::Persistence(_)));
        assert_eq!(ids(store.list_want_to_read()), vec!["a"]);
        assert!(store.list_read().is_empty());
        assert_eq!(ids(&backend.rows(CollectionKind::WantToRead)), vec!["a"]);
    }

    #[tokio::test]
    async fn test_move_delete_recovered_by_retry() {
        let (backend, mut store) = store();
        store.add_to_want_to_read(book("a")).await.unwrap();
        backend.fail_next(BackendOp::Remove, CollectionKind::WantToRead, 1);

        store.move_to_read(book("a")).await.unwrap();
        assert!(backend.rows(CollectionKind::WantToRead).is_empty());
        assert!(store.pending_reconciliation().is_empty());
    }

    #[tokio::test]
    async fn test_partial_move_reported_and_reconciled() {
        let (backend, mut store) = store();
        store.add_to_want_to_read(book("a")).await.unwrap();
        backend.fail_next(BackendOp::Remove, CollectionKind::WantToRead, 2);

        let err = store.move_to_read(book("a")).await.unwrap_err();
        assert!(matches!(err, CollectionError::PartialMove { ref id, .. } if id == "a"));

        // in memory the move is complete and the dangling row is tracked
        assert!(store.list_want_to_read().is_empty());
        assert_eq!(ids(store.list_read()), vec!["a"]);
        assert_eq!(store.pending_reconciliation().to_vec(), vec!["a".to_string()]);
        assert_eq!(ids(&backend.rows(CollectionKind::WantToRead)), vec!["a"]);

        assert_eq!(store.reconcile().await.unwrap(), 1);
        assert!(store.pending_reconciliation().is_empty());
        assert!(backend.rows(CollectionKind::WantToRead).is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_failure_keeps_pending() {
        let (backend, mut store) = store();
        store.add_to_want_to_read(book("a")).await.unwrap();
        backend.fail_next(BackendOp::Remove, CollectionKind::WantToRead, 4);

        assert!(store.move_to_read(book("a")).await.is_err());
        assert!(store.reconcile().await.is_err());
        assert_eq!(store.pending_reconciliation().len(), 1);
    }

    #[tokio::test]
    async fn test_load_dedups_and_resolves_overlap() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            CollectionKind::WantToRead,
            vec![book("a"), book("b"), CatalogItem::new("a", "Later copy")],
        );
        backend.seed(CollectionKind::Read, vec![book("b"), book("c")]);

        let store = CollectionStore::load(backend.clone(), fast_retry())
            .await
            .unwrap();

        assert_eq!(ids(store.list_want_to_read()), vec!["a"]);
        assert_eq!(store.list_want_to_read()[0].title, "Title a");
        assert_eq!(ids(store.list_read()), vec!["b", "c"]);
        assert!(store.pending_reconciliation().is_empty());
        assert_eq!(ids(&backend.rows(CollectionKind::WantToRead)), vec!["a", "a"]);
    }

    #[tokio::test]
    async fn test_load_list_failure() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_next(BackendOp::List, CollectionKind::Read, 1);
        let result = CollectionStore::load(backend, fast_retry()).await;
        assert!(matches!(result, Err(CollectionError::Persistence(_))));
    }
}
