//! # Reading Shelf
//!
//! Search a bibliographic catalog by author and title, page through ranked
//! results, and keep two personal collections: books you want to read and
//! books you have read.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (CatalogItem, Query, SearchPage, etc.)
//! - [`catalog`]: Catalog clients behind the [`CatalogSource`] trait
//! - [`ranking`]: Relevance scoring and ordering of a fetched page
//! - [`pagination`]: Page index bookkeeping and boundary checks
//! - [`session`]: Search state machine that discards superseded responses
//! - [`collections`]: Want-to-read and read collections over a storage backend
//! - [`utils`]: HTTP client, retry, deduplication and display helpers
//! - [`config`]: Configuration management

pub mod catalog;
pub mod collections;
pub mod config;
pub mod models;
pub mod pagination;
pub mod ranking;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use catalog::{CatalogError, CatalogSource, GoogleBooksClient};
pub use collections::{CollectionBackend, CollectionError, CollectionStore};
pub use models::{CatalogItem, CollectionKind, Query, SearchPage};
pub use session::{SearchSession, SessionError, SessionState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
