//! Search query and result page models.

use serde::{Deserialize, Serialize};

use crate::models::CatalogItem;

/// Maximum page size the catalog accepts for a single request
pub const MAX_PAGE_SIZE: usize = 40;

/// Query validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Enter an author or a title to search")]
    EmptyQuery,
}

/// Author and/or title terms for a catalog search
///
/// Terms are trimmed on construction; blank terms are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    /// Term matched against the author field
    pub author: Option<String>,

    /// Term matched against the title field
    pub title: Option<String>,
}

impl Query {
    /// Create a query from optional author and title terms
    pub fn new(author: Option<&str>, title: Option<&str>) -> Self {
        Self {
            author: normalize_term(author),
            title: normalize_term(title),
        }
    }

    /// Query on the author field only
    pub fn by_author(author: &str) -> Self {
        Self::new(Some(author), None)
    }

    /// Query on the title field only
    pub fn by_title(title: &str) -> Self {
        Self::new(None, Some(title))
    }

    /// Add or replace the author term
    pub fn author(mut self, author: &str) -> Self {
        self.author = normalize_term(Some(author));
        self
    }

    /// Add or replace the title term
    pub fn title(mut self, title: &str) -> Self {
        self.title = normalize_term(Some(title));
        self
    }

    pub fn author_term(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn title_term(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// A query must carry at least one non-empty term before it is dispatched
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.author.is_none() && self.title.is_none() {
            return Err(ValidationError::EmptyQuery);
        }
        Ok(())
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.author, &self.title) {
            (Some(a), Some(t)) => write!(f, "author:\"{}\" title:\"{}\"", a, t),
            (Some(a), None) => write!(f, "author:\"{}\"", a),
            (None, Some(t)) => write!(f, "title:\"{}\"", t),
            (None, None) => write!(f, "<empty>"),
        }
    }
}

fn normalize_term(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// One raw page as returned by the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// Items in catalog order
    pub items: Vec<CatalogItem>,

    /// Total number of matches the catalog reports for the query
    pub total_results: usize,
}

impl FetchedPage {
    pub fn new(items: Vec<CatalogItem>, total_results: usize) -> Self {
        Self {
            items,
            total_results,
        }
    }
}

/// The page currently displayed by a search session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// Ranked items
    pub items: Vec<CatalogItem>,

    /// 1-based page index
    pub page_index: usize,

    /// Requested page size
    pub page_size: usize,

    /// Total matches reported by the catalog
    pub total_results: usize,
}

impl SearchPage {
    /// Number of pages implied by the totals
    pub fn page_count(&self) -> usize {
        crate::pagination::page_count(self.total_results, self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page_index * self.page_size < self.total_results
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The two user-owned collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionKind {
    WantToRead,
    Read,
}

impl CollectionKind {
    /// Returns the display name of the collection
    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::WantToRead => "want to read",
            CollectionKind::Read => "read",
        }
    }

    /// Path segment used by the persistence API
    pub fn path(&self) -> &'static str {
        match self {
            CollectionKind::WantToRead => "want-to-read",
            CollectionKind::Read => "read",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_trims_and_drops_blank_terms() {
        let query = Query::new(Some("  Tolkien "), Some("   "));
        assert_eq!(query.author_term(), Some("Tolkien"));
        assert_eq!(query.title_term(), None);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_query_empty_is_validation_error() {
        assert_eq!(Query::default().validate(), Err(ValidationError::EmptyQuery));
        assert_eq!(
            Query::new(Some(""), Some(" \t")).validate(),
            Err(ValidationError::EmptyQuery)
        );
    }

    #[test]
    fn test_query_builder_methods() {
        let query = Query::by_author("Le Guin").title("Earthsea");
        assert_eq!(query.author_term(), Some("Le Guin"));
        assert_eq!(query.title_term(), Some("Earthsea"));
        assert_eq!(query.to_string(), "author:\"Le Guin\" title:\"Earthsea\"");
    }

    #[test]
    fn test_search_page_navigation_flags() {
        let page = SearchPage {
            items: Vec::new(),
            page_index: 2,
            page_size: 10,
            total_results: 25,
        };
        assert_eq!(page.page_count(), 3);
        assert!(page.has_next());
        assert!(page.has_previous());

        let last = SearchPage {
            page_index: 3,
            ..page
        };
        assert!(!last.has_next());
    }

    #[test]
    fn test_collection_kind_paths() {
        assert_eq!(CollectionKind::WantToRead.path(), "want-to-read");
        assert_eq!(CollectionKind::Read.path(), "read");
        assert_eq!(
            serde_json::to_string(&CollectionKind::WantToRead).unwrap(),
            "\"want-to-read\""
        );
    }
}
