//! Relevance ordering for a fetched result set.
//!
//! Scores are simple case-insensitive substring matches:
//!
//! - `+3` when the item's joined author list contains the author term
//! - `+2` when the item's title contains the title term
//!
//! Items are ordered by score, then by published year (newest first, missing
//! years last), then by their original fetch order. Ranking is local to the
//! result set it is given; pages already displayed are never re-ranked.

use std::cmp::Reverse;

use crate::models::CatalogItem;

/// Score for an author term match
pub const AUTHOR_MATCH_SCORE: u32 = 3;

/// Score for a title term match
pub const TITLE_MATCH_SCORE: u32 = 2;

/// Compute the relevance score of one item against the query terms.
///
/// Blank or missing terms contribute nothing.
pub fn relevance_score(
    item: &CatalogItem,
    author_term: Option<&str>,
    title_term: Option<&str>,
) -> u32 {
    let mut score = 0;

    if let Some(term) = non_blank(author_term) {
        if contains_ignore_case(&item.author_line(), term) {
            score += AUTHOR_MATCH_SCORE;
        }
    }

    if let Some(term) = non_blank(title_term) {
        if contains_ignore_case(&item.title, term) {
            score += TITLE_MATCH_SCORE;
        }
    }

    score
}

/// Order items by relevance to the query terms.
///
/// The sort is stable, so items equal on score and year keep their fetch order.
pub fn rank(
    items: Vec<CatalogItem>,
    author_term: Option<&str>,
    title_term: Option<&str>,
) -> Vec<CatalogItem> {
    let mut scored: Vec<(u32, CatalogItem)> = items
        .into_iter()
        .map(|item| (relevance_score(&item, author_term, title_term), item))
        .collect();

    scored.sort_by_key(|(score, item)| (Reverse(*score), Reverse(item.sort_year())));

    scored.into_iter().map(|(_, item)| item).collect()
}

fn non_blank(term: Option<&str>) -> Option<&str> {
    term.map(str::trim).filter(|t| !t.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogItemBuilder;

    fn item(id: &str, title: &str, author: &str, year: Option<i32>) -> CatalogItem {
        let builder = CatalogItemBuilder::new(id, title).author(author);
        match year {
            Some(y) => builder.published_year(y).build(),
            None => builder.build(),
        }
    }

    fn ids(items: &[CatalogItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_score_components() {
        let book = item("1", "The Hobbit", "J.R.R. Tolkien", Some(1937));

        assert_eq!(relevance_score(&book, Some("tolkien"), None), 3);
        assert_eq!(relevance_score(&book, None, Some("HOBBIT")), 2);
        assert_eq!(relevance_score(&book, Some("Tolkien"), Some("hobbit")), 5);
        assert_eq!(relevance_score(&book, Some("Lewis"), Some("Narnia")), 0);
        assert_eq!(relevance_score(&book, Some("  "), None), 0);
    }

    #[test]
    fn test_score_matches_across_joined_authors() {
        let book = CatalogItemBuilder::new("1", "Good Omens")
            .authors(["Terry Pratchett", "Neil Gaiman"])
            .build();
        assert_eq!(relevance_score(&book, Some("neil gaiman"), None), 3);
    }

    #[test]
    fn test_rank_by_score_then_year() {
        // A and B score 5, C scores 3
        let items = vec![
            item("C", "Other Book", "Ann Author", Some(2023)),
            item("B", "Rust Book", "Ann Author", Some(2019)),
            item("A", "Rust Book", "Ann Author", Some(2020)),
        ];

        let ranked = rank(items, Some("ann"), Some("rust"));
        assert_eq!(ids(&ranked), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_rank_missing_year_sorts_last() {
        let items = vec![
            item("undated", "Rust", "X", None),
            item("old", "Rust", "X", Some(1990)),
        ];
        let ranked = rank(items, None, Some("rust"));
        assert_eq!(ids(&ranked), vec!["old", "undated"]);
    }

    #[test]
    fn test_rank_is_stable_on_full_ties() {
        let items = vec![
            item("first", "Rust", "X", Some(2000)),
            item("second", "Rust", "X", Some(2000)),
            item("third", "Rust", "X", Some(2000)),
        ];
        let ranked = rank(items, None, Some("rust"));
        assert_eq!(ids(&ranked), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(Vec::new(), Some("a"), Some("b")).is_empty());
    }
}
