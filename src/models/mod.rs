//! Core data models for catalog items, queries and result pages.

mod item;
mod search;

pub use item::{parse_published_year, CatalogItem, CatalogItemBuilder};
pub use search::{
    CollectionKind, FetchedPage, Query, SearchPage, ValidationError, MAX_PAGE_SIZE,
};
