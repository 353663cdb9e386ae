//! Utility modules shared by the catalog, collections and CLI.
//!
//! - [`HttpClient`]: shared reqwest client with timeouts
//! - [`with_retry`]: retry an async operation with exponential backoff on transient errors
//! - [`dedup_by_id`]: drop repeated catalog records, keeping the first payload
//! - [`items_table`]: render items for the terminal
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use reading_shelf::utils::{with_retry, RetryConfig, Transient};
//!
//! #[derive(Debug)]
//! struct Flaky;
//!
//! impl std::fmt::Display for Flaky {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "flaky")
//!     }
//! }
//!
//! impl Transient for Flaky {
//!     fn is_transient(&self) -> bool {
//!         true
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = RetryConfig::default().max_attempts(3);
//! let result: Result<u32, Flaky> = with_retry(config, || async { Ok(1) }).await;
//! assert_eq!(result.unwrap(), 1);
//! # }
//! ```

mod dedup;
mod display;
mod http;
mod retry;

pub use dedup::{dedup_by_id, duplicate_ids};
pub use display::{is_terminal, items_table, page_summary, truncate_with_ellipsis};
pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use retry::{with_retry, RetryConfig, Transient};
