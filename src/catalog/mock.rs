//! Mock catalog for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::catalog::{CatalogError, CatalogSource};
use crate::models::{CatalogItem, FetchedPage, Query};

/// A recorded `fetch_page` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub query: Query,
    pub start_index: usize,
    pub max_results: usize,
}

#[derive(Debug, Default)]
struct MockState {
    results: HashMap<Query, Vec<CatalogItem>>,
    totals: HashMap<Query, usize>,
    errors: HashMap<Query, CatalogError>,
    delays: HashMap<Query, Duration>,
    calls: Vec<FetchCall>,
}

/// A mock catalog that slices predefined result sets into pages.
///
/// Queries without configured results answer with an empty page.
#[derive(Debug, Default)]
pub struct MockCatalog {
    state: Mutex<MockState>,
}

impl MockCatalog {
    /// Create a new mock catalog.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set the full result set for a query.
    pub fn set_results(&self, query: Query, items: Vec<CatalogItem>) {
        self.state().results.insert(query, items);
    }

    /// Report a different total than the result set length.
    pub fn set_total(&self, query: Query, total: usize) {
        self.state().totals.insert(query, total);
    }

    /// Make every fetch for a query fail.
    pub fn set_error(&self, query: Query, error: CatalogError) {
        self.state().errors.insert(query, error);
    }

    /// Delay every fetch for a query before it resolves.
    pub fn set_delay(&self, query: Query, delay: Duration) {
        self.state().delays.insert(query, delay);
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<FetchCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    fn id(&self) -> &str {
        "mock"
    }

    async fn fetch_page(
        &self,
        query: &Query,
        start_index: usize,
        max_results: usize,
    ) -> Result<FetchedPage, CatalogError> {
        let delay = {
            let mut state = self.state();
            state.calls.push(FetchCall {
                query: query.clone(),
                start_index,
                max_results,
            });
            state.delays.get(query).copied()
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        if let Some(error) = state.errors.get(query) {
            return Err(error.clone());
        }

        let items = state.results.get(query).map(Vec::as_slice).unwrap_or(&[]);
        let total = state.totals.get(query).copied().unwrap_or(items.len());
        let page = items
            .iter()
            .skip(start_index)
            .take(max_results)
            .cloned()
            .collect();

        Ok(FetchedPage::new(page, total))
    }

    async fn get_by_id(&self, id: &str) -> Result<CatalogItem, CatalogError> {
        self.state()
            .results
            .values()
            .flatten()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::Upstream(format!("volume {} not found", id)))
    }
}

/// Helper function to create a mock item for testing.
pub fn make_item(id: &str, title: &str, author: &str, year: Option<i32>) -> CatalogItem {
    let mut item = CatalogItem::new(id, title);
    item.authors.push(author.to_string());
    item.published_year = year;
    item
}
