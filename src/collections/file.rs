//! JSON file collection backend.
//!
//! Both collections live in one document:
//!
//! ```json
//! { "wantToRead": [ ... ], "read": [ ... ] }
//! ```
//!
//! Every mutation rewrites the document through a temporary file and a rename,
//! so a crash never leaves a half-written file behind.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::collections::{BackendError, CollectionBackend};
use crate::models::{CatalogItem, CollectionKind};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionsDocument {
    #[serde(default)]
    want_to_read: Vec<CatalogItem>,
    #[serde(default)]
    read: Vec<CatalogItem>,
}

impl CollectionsDocument {
    fn rows(&self, kind: CollectionKind) -> &Vec<CatalogItem> {
        match kind {
            CollectionKind::WantToRead => &self.want_to_read,
            CollectionKind::Read => &self.read,
        }
    }

    fn rows_mut(&mut self, kind: CollectionKind) -> &mut Vec<CatalogItem> {
        match kind {
            CollectionKind::WantToRead => &mut self.want_to_read,
            CollectionKind::Read => &mut self.read,
        }
    }
}

/// Backend storing both collections in a local JSON file
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Default location under the user's config directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reading-shelf")
            .join("collections.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<CollectionsDocument, BackendError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(CollectionsDocument::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(CollectionsDocument::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, document: &CollectionsDocument) -> Result<(), BackendError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionBackend for FileBackend {
    fn name(&self) -> &str {
        "file"
    }

    async fn list(&self, kind: CollectionKind) -> Result<Vec<CatalogItem>, BackendError> {
        let _guard = self.lock.lock().await;
        let document = self.read_document().await?;
        Ok(document.rows(kind).clone())
    }

    async fn insert(&self, kind: CollectionKind, item: &CatalogItem) -> Result<(), BackendError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;

        let rows = document.rows_mut(kind);
        if rows.iter().any(|row| row.id == item.id) {
            return Err(BackendError::Conflict {
                id: item.id.clone(),
                collection: kind,
            });
        }
        rows.push(item.clone());

        self.write_document(&document).await
    }

    async fn remove(&self, kind: CollectionKind, id: &str) -> Result<(), BackendError> {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document().await?;

        let rows = document.rows_mut(kind);
        let before = rows.len();
        rows.retain(|row| row.id != id);
        if rows.len() == before {
            return Ok(());
        }

        self.write_document(&document).await
    }
}
