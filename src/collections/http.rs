//! Persistence API collection backend.
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `GET /want-to-read`, `GET /read`: stored rows
//! - `POST /want-to-read`, `POST /read`: insert a row (JSON body)
//! - `DELETE /want-to-read/{id}`, `DELETE /read/{id}`: delete by catalog id

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::collections::{BackendError, CollectionBackend};
use crate::models::{CatalogItem, CollectionKind};
use crate::utils::HttpClient;

/// Backend talking to the persistence API over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: HttpClient,
    base_url: String,
}

impl HttpBackend {
    pub fn new(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self, kind: CollectionKind) -> String {
        format!("{}/{}", self.base_url, kind.path())
    }

    fn row_url(&self, kind: CollectionKind, id: &str) -> String {
        format!("{}/{}", self.collection_url(kind), urlencoding::encode(id))
    }
}

#[async_trait]
impl CollectionBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn list(&self, kind: CollectionKind) -> Result<Vec<CatalogItem>, BackendError> {
        let response = self
            .client
            .client()
            .get(self.collection_url(kind))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn insert(&self, kind: CollectionKind, item: &CatalogItem) -> Result<(), BackendError> {
        let response = self
            .client
            .client()
            .post(self.collection_url(kind))
            .json(item)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(BackendError::Conflict {
                id: item.id.clone(),
                collection: kind,
            }),
            status => Err(BackendError::Status(status.as_u16())),
        }
    }

    async fn remove(&self, kind: CollectionKind, id: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .client()
            .delete(self.row_url(kind, id))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            status => Err(BackendError::Status(status.as_u16())),
        }
    }
}
