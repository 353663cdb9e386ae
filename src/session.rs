//! Search session: query state, fetch orchestration and the displayed page.
//!
//! A session moves through [`SessionState`]:
//!
//! ```text
//! Idle ──search──▶ Searching ──ok──▶ Ready ──page change / search──▶ Searching
//!                      │                                                 │
//!                      └──────────────error──────────▶ Failed ◀──────────┘
//! ```
//!
//! Every dispatched fetch carries a [`SearchTicket`] holding a monotonically
//! increasing token. Only the ticket issued last may change the session when it
//! resolves; a response for an older ticket is discarded. The split into
//! [`begin_search`](SearchSession::begin_search), [`fetch`](SearchSession::fetch)
//! and [`complete`](SearchSession::complete) lets callers run fetches
//! concurrently and resolve them in any order. [`search`](SearchSession::search),
//! [`change_page`](SearchSession::change_page) and
//! [`fetch_all`](SearchSession::fetch_all) chain the three steps.
//!
//! Ranking is local to the fetched page. Moving to another page fetches and
//! ranks that page on its own; results are never re-ranked across pages.

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{CatalogError, CatalogSource};
use crate::config::CatalogConfig;
use crate::models::{
    CatalogItem, FetchedPage, Query, SearchPage, ValidationError, MAX_PAGE_SIZE,
};
use crate::pagination::{Direction, PageError, PaginationController};
use crate::ranking::rank;
use crate::utils::dedup_by_id;

/// Lifecycle state of a search session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Searching,
    Ready,
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Searching => "searching",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// How results are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// One page per fetch
    Paged,
    /// All pages up to the configured limit, merged into one result set
    Aggregate,
}

/// Outcome of resolving a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The response became the displayed page
    Applied,
    /// A newer ticket was issued; the response was discarded
    Superseded,
}

/// Errors surfaced by session operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Boundary(#[from] PageError),

    #[error("No results to page through (session is {0})")]
    NotReady(SessionState),
}

/// Tunables for a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    /// Results per page, 1 to [`MAX_PAGE_SIZE`]
    pub page_size: usize,
    /// Timeout applied to every catalog call
    pub request_timeout: Duration,
    /// Maximum items gathered by [`SearchSession::fetch_all`]
    pub fetch_all_limit: usize,
    /// Page requests in flight at once during aggregation
    pub fetch_all_concurrency: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            request_timeout: Duration::from_secs(10),
            fetch_all_limit: 200,
            fetch_all_concurrency: 4,
        }
    }
}

impl From<&CatalogConfig> for SessionOptions {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            page_size: config.effective_page_size(),
            request_timeout: config.request_timeout(),
            fetch_all_limit: config.fetch_all_limit,
            fetch_all_concurrency: config.fetch_all_concurrency.max(1),
        }
    }
}

/// A dispatched fetch. Only the most recently issued ticket can be applied.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    token: u64,
    query: Query,
    mode: FetchMode,
    pagination: PaginationController,
}

impl SearchTicket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Page this ticket fetches
    pub fn page_index(&self) -> usize {
        self.pagination.page_index()
    }
}

/// Search state for one user session
#[derive(Debug)]
pub struct SearchSession {
    catalog: Arc<dyn CatalogSource>,
    options: SessionOptions,
    state: SessionState,
    latest_token: u64,
    query: Option<Query>,
    mode: FetchMode,
    pagination: PaginationController,
    page: Option<SearchPage>,
    last_error: Option<CatalogError>,
}

impl SearchSession {
    pub fn new(catalog: Arc<dyn CatalogSource>, options: SessionOptions) -> Self {
        let options = SessionOptions {
            page_size: options.page_size.clamp(1, MAX_PAGE_SIZE),
            fetch_all_concurrency: options.fetch_all_concurrency.max(1),
            ..options
        };

        Self {
            catalog,
            options,
            state: SessionState::Idle,
            latest_token: 0,
            query: None,
            mode: FetchMode::Paged,
            pagination: PaginationController::new(options.page_size),
            page: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The displayed page, kept through failed fetches
    pub fn page(&self) -> Option<&SearchPage> {
        self.page.as_ref()
    }

    /// Query behind the displayed page
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    /// Error from the last failed fetch, cleared by the next success
    pub fn last_error(&self) -> Option<&CatalogError> {
        self.last_error.as_ref()
    }

    /// Drop the displayed results; the state is left as is
    pub fn clear_results(&mut self) {
        self.page = None;
    }

    /// Validate a query and issue a ticket for its first page.
    ///
    /// An invalid query fails without touching the session.
    pub fn begin_search(&mut self, query: Query) -> Result<SearchTicket, SessionError> {
        self.begin(query, FetchMode::Paged)
    }

    /// Validate a query and issue a ticket that aggregates all its pages.
    pub fn begin_fetch_all(&mut self, query: Query) -> Result<SearchTicket, SessionError> {
        self.begin(query, FetchMode::Aggregate)
    }

    fn begin(&mut self, query: Query, mode: FetchMode) -> Result<SearchTicket, SessionError> {
        query.validate()?;

        let mut pagination = self.pagination.clone();
        pagination.reset(self.options.page_size);

        Ok(self.issue(query, mode, pagination))
    }

    /// Issue a ticket for the adjacent page of the displayed results.
    ///
    /// Requires the `Ready` state. Out-of-range moves fail with a boundary error
    /// and leave the session unchanged.
    pub fn begin_page_change(
        &mut self,
        direction: Direction,
    ) -> Result<SearchTicket, SessionError> {
        let query = match (&self.state, &self.query) {
            (SessionState::Ready, Some(query)) => query.clone(),
            _ => return Err(SessionError::NotReady(self.state)),
        };

        let mut pagination = self.pagination.clone();
        pagination.step(direction)?;

        Ok(self.issue(query, self.mode, pagination))
    }

    fn issue(
        &mut self,
        query: Query,
        mode: FetchMode,
        pagination: PaginationController,
    ) -> SearchTicket {
        self.latest_token += 1;
        self.state = SessionState::Searching;
        tracing::debug!(
            token = self.latest_token,
            %query,
            page = pagination.page_index(),
            ?mode,
            "Dispatching search"
        );

        SearchTicket {
            token: self.latest_token,
            query,
            mode,
            pagination,
        }
    }

    /// Run the catalog request for a ticket. Does not change the session.
    pub async fn fetch(&self, ticket: &SearchTicket) -> Result<FetchedPage, CatalogError> {
        match ticket.mode {
            FetchMode::Paged => {
                self.fetch_with_timeout(
                    &ticket.query,
                    ticket.pagination.start_index(),
                    ticket.pagination.page_size(),
                )
                .await
            }
            FetchMode::Aggregate => self.fetch_all_pages(&ticket.query).await,
        }
    }

    /// Apply a fetch result if the ticket is still the latest one.
    ///
    /// Success ranks the items and makes them the displayed page. Failure moves
    /// the session to `Failed` and keeps the previous page for display.
    pub fn complete(
        &mut self,
        ticket: SearchTicket,
        result: Result<FetchedPage, CatalogError>,
    ) -> Result<Completion, SessionError> {
        if ticket.token != self.latest_token {
            tracing::debug!(
                token = ticket.token,
                latest = self.latest_token,
                "Discarding superseded search response"
            );
            return Ok(Completion::Superseded);
        }

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(query = %ticket.query, "Search failed: {}", e);
                self.state = SessionState::Failed;
                self.last_error = Some(e.clone());
                return Err(SessionError::Catalog(e));
            }
        };

        let SearchTicket {
            query,
            mode,
            mut pagination,
            ..
        } = ticket;

        let items = match mode {
            FetchMode::Paged => {
                pagination.set_totals(fetched.total_results);
                rank(fetched.items, query.author_term(), query.title_term())
            }
            FetchMode::Aggregate => {
                let items = rank(
                    dedup_by_id(fetched.items),
                    query.author_term(),
                    query.title_term(),
                );
                tracing::debug!(
                    collected = items.len(),
                    reported = fetched.total_results,
                    "Aggregated catalog pages"
                );
                pagination.reset(items.len().max(1));
                pagination.set_totals(items.len());
                items
            }
        };

        self.page = Some(SearchPage {
            items,
            page_index: pagination.page_index(),
            page_size: pagination.page_size(),
            total_results: pagination.total_results(),
        });
        self.pagination = pagination;
        self.query = Some(query);
        self.mode = mode;
        self.state = SessionState::Ready;
        self.last_error = None;

        Ok(Completion::Applied)
    }

    /// Search for the first page of `query`
    pub async fn search(&mut self, query: Query) -> Result<&SearchPage, SessionError> {
        let ticket = self.begin_search(query)?;
        self.run(ticket).await
    }

    /// Fetch the next or previous page of the current results
    pub async fn change_page(&mut self, direction: Direction) -> Result<&SearchPage, SessionError> {
        let ticket = self.begin_page_change(direction)?;
        self.run(ticket).await
    }

    /// Gather every page of `query` up to the configured limit into one ranked page
    pub async fn fetch_all(&mut self, query: Query) -> Result<&SearchPage, SessionError> {
        let ticket = self.begin_fetch_all(query)?;
        self.run(ticket).await
    }

    async fn run(&mut self, ticket: SearchTicket) -> Result<&SearchPage, SessionError> {
        let result = self.fetch(&ticket).await;
        self.complete(ticket, result)?;
        self.page
            .as_ref()
            .ok_or(SessionError::NotReady(self.state))
    }

    async fn fetch_with_timeout(
        &self,
        query: &Query,
        start_index: usize,
        max_results: usize,
    ) -> Result<FetchedPage, CatalogError> {
        tokio::time::timeout(
            self.options.request_timeout,
            self.catalog.fetch_page(query, start_index, max_results),
        )
        .await
        .map_err(CatalogError::from)?
    }

    /// Fetch pages of [`MAX_PAGE_SIZE`] until the reported total, an empty page
    /// or `fetch_all_limit` distinct items. Pages are requested concurrently but
    /// appended strictly in `startIndex` order; a repeated id keeps its first
    /// record and does not count toward the limit.
    async fn fetch_all_pages(&self, query: &Query) -> Result<FetchedPage, CatalogError> {
        let limit = self.options.fetch_all_limit;
        if limit == 0 {
            return Ok(FetchedPage::default());
        }

        let first = self.fetch_with_timeout(query, 0, MAX_PAGE_SIZE).await?;
        let total = first.total_results;
        let exhausted = first.items.is_empty();

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        collect_unique(&mut items, &mut seen, first.items);

        if !exhausted && items.len() < limit && total > MAX_PAGE_SIZE {
            let mut pages = stream::iter((MAX_PAGE_SIZE..total).step_by(MAX_PAGE_SIZE))
                .map(|start| {
                    self.fetch_with_timeout(query, start, MAX_PAGE_SIZE.min(total - start))
                })
                .buffered(self.options.fetch_all_concurrency);

            while let Some(page) = pages.next().await {
                let page = page?;
                if page.items.is_empty() {
                    break;
                }
                collect_unique(&mut items, &mut seen, page.items);
                if items.len() >= limit {
                    break;
                }
            }
        }

        items.truncate(limit);
        Ok(FetchedPage::new(items, total))
    }
}

fn collect_unique(
    items: &mut Vec<CatalogItem>,
    seen: &mut HashSet<String>,
    page: Vec<CatalogItem>,
) {
    for item in page {
        if seen.insert(item.id.clone()) {
            items.push(item);
        }
    }
}
