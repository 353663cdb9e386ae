//! Deduplication of catalog items by id.

use std::collections::HashSet;

use crate::models::CatalogItem;

/// Remove items whose `id` was already seen, keeping the first occurrence.
///
/// Later duplicates are dropped whole; their fields are never merged into the
/// first payload.
pub fn dedup_by_id(items: Vec<CatalogItem>) -> Vec<CatalogItem> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

/// Ids that occur more than once, in first-occurrence order
pub fn duplicate_ids(items: &[CatalogItem]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    items
        .iter()
        .filter(|item| !seen.insert(item.id.as_str()) && reported.insert(item.id.as_str()))
        .map(|item| item.id.as_str())
        .collect()
}
