//! Catalog clients for the external bibliographic search service.
//!
//! This module defines the [`CatalogSource`] trait the search session talks to.
//! [`GoogleBooksClient`] implements it against the Google Books volumes API and
//! [`MockCatalog`] serves scripted results for tests.
//!
//! Clients are stateless across calls: every call is an independent request and
//! may be issued concurrently for different pages. Clients never retry; the
//! caller decides what to do with a failure.

mod google_books;
pub mod mock;

pub use google_books::GoogleBooksClient;
pub use mock::MockCatalog;

use async_trait::async_trait;

use crate::models::{CatalogItem, FetchedPage, Query};

/// Interface for a paginated catalog search service.
#[async_trait]
pub trait CatalogSource: Send + Sync + std::fmt::Debug {
    /// Identifier for this catalog (used in logs)
    fn id(&self) -> &str;

    /// Fetch one page of results.
    ///
    /// `start_index` is the zero-based offset of the first result and
    /// `max_results` must be between 1 and [`MAX_PAGE_SIZE`](crate::models::MAX_PAGE_SIZE).
    /// Zero matches is a successful, empty page.
    async fn fetch_page(
        &self,
        query: &Query,
        start_index: usize,
        max_results: usize,
    ) -> Result<FetchedPage, CatalogError>;

    /// Look up a single record by its catalog id
    async fn get_by_id(&self, _id: &str) -> Result<CatalogItem, CatalogError> {
        Err(CatalogError::NotImplemented)
    }
}

/// Errors that can occur when talking to the catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Network failure, timeout, non-success status or malformed payload
    #[error("Transport error: {0}")]
    Transport(String),

    /// The catalog answered with an embedded error object
    #[error("Catalog error: {0}")]
    Upstream(String),

    /// Request parameters outside the catalog contract
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The operation is not supported by this catalog
    #[error("Operation not implemented for this catalog")]
    NotImplemented,
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Transport(format!("Malformed payload: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for CatalogError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        CatalogError::Transport("Request timed out".to_string())
    }
}
