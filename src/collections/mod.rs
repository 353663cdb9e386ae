//! Want-to-read and read collections backed by a persistent store.
//!
//! [`CollectionStore`] is the single read/write path for both collections. It
//! persists every change through a [`CollectionBackend`] and only updates its
//! in-memory lists once the backend has confirmed the write.
//!
//! Backends:
//!
//! - [`FileBackend`]: a local JSON document (default)
//! - [`HttpBackend`]: the persistence API
//! - [`MemoryBackend`]: in-memory rows with failure injection, for tests

mod backend;
mod file;
mod http;
pub mod memory;
mod store;

pub use backend::{BackendError, CollectionBackend};
pub use file::FileBackend;
pub use http::HttpBackend;
pub use memory::{BackendOp, MemoryBackend};
pub use store::{CollectionError, CollectionStore};
