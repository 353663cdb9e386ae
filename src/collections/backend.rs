//! Storage collaborator interface for the collections.

use async_trait::async_trait;

use crate::models::{CatalogItem, CollectionKind};
use crate::utils::Transient;

/// Persistent storage for the two collections.
///
/// Rows are keyed by the catalog `id`. A backend must reject an insert whose id
/// is already stored in the same collection, and must treat removing an absent
/// id as success.
#[async_trait]
pub trait CollectionBackend: Send + Sync + std::fmt::Debug {
    /// Name used in logs
    fn name(&self) -> &str;

    /// All stored rows of a collection in insertion order
    async fn list(&self, kind: CollectionKind) -> Result<Vec<CatalogItem>, BackendError>;

    /// Persist a new row
    async fn insert(&self, kind: CollectionKind, item: &CatalogItem) -> Result<(), BackendError>;

    /// Delete the row with this id
    async fn remove(&self, kind: CollectionKind, id: &str) -> Result<(), BackendError>;
}

/// Errors reported by a storage backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Persistence API returned status: {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{id} is already stored in {collection}")]
    Conflict {
        id: String,
        collection: CollectionKind,
    },

    /// Failure injected by a test backend
    #[error("Injected failure: {0}")]
    Injected(String),
}

impl Transient for BackendError {
    fn is_transient(&self) -> bool {
        match self {
            BackendError::Network(_) | BackendError::Io(_) | BackendError::Injected(_) => true,
            BackendError::Status(code) => *code == 429 || *code >= 500,
            BackendError::Serialization(_) | BackendError::Conflict { .. } => false,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Network(err.to_string())
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Serialization(err.to_string())
    }
}
