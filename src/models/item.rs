//! Catalog item model representing one bibliographic record.

use serde::{Deserialize, Serialize};

/// A book record fetched from the catalog
///
/// Items are immutable once fetched. Identity is the externally assigned `id`:
/// two records with the same `id` are the same item even if their payloads differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Stable identifier assigned by the catalog
    pub id: String,

    /// Book title
    pub title: String,

    /// Authors in catalog order
    #[serde(default)]
    pub authors: Vec<String>,

    /// Year of publication, when the catalog date carries one
    #[serde(default)]
    pub published_year: Option<i32>,

    /// Description or blurb
    #[serde(default)]
    pub description: Option<String>,

    /// Number of pages
    #[serde(default)]
    pub page_count: Option<u32>,

    /// Publisher name
    #[serde(default)]
    pub publisher: Option<String>,

    /// Cover thumbnail URL
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl CatalogItem {
    /// Create a new item with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            published_year: None,
            description: None,
            page_count: None,
            publisher: None,
            thumbnail_url: None,
        }
    }

    /// Authors joined for display and substring matching
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }

    /// Year used for ordering; items without a year sort as year 0
    pub fn sort_year(&self) -> i32 {
        self.published_year.unwrap_or(0)
    }
}

/// Extract the year from a catalog date such as `2020`, `2020-05` or `2020-05-01`.
pub fn parse_published_year(date: &str) -> Option<i32> {
    let year = date.trim().split('-').next()?;
    if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    year.parse().ok()
}

/// Builder for constructing CatalogItem objects
#[derive(Debug, Clone)]
pub struct CatalogItemBuilder {
    item: CatalogItem,
}

impl CatalogItemBuilder {
    /// Create a new builder with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            item: CatalogItem::new(id, title),
        }
    }

    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.item.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.item.authors.push(author.into());
        self
    }

    pub fn published_year(mut self, year: i32) -> Self {
        self.item.published_year = Some(year);
        self
    }

    /// Set the year from a raw catalog date, ignoring unparsable dates
    pub fn published_date(mut self, date: &str) -> Self {
        self.item.published_year = parse_published_year(date);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.item.description = Some(description.into());
        self
    }

    pub fn page_count(mut self, pages: u32) -> Self {
        self.item.page_count = Some(pages);
        self
    }

    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.item.publisher = Some(publisher.into());
        self
    }

    pub fn thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.item.thumbnail_url = Some(url.into());
        self
    }

    /// Build the item
    pub fn build(self) -> CatalogItem {
        self.item
    }
}
