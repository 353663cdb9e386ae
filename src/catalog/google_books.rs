//! Google Books catalog client.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::catalog::{CatalogError, CatalogSource};
use crate::models::{CatalogItem, CatalogItemBuilder, FetchedPage, Query, MAX_PAGE_SIZE};
use crate::utils::HttpClient;

const GOOGLE_BOOKS_API_BASE: &str = "https://www.googleapis.com/books/v1";

/// Catalog client for the Google Books volumes API
///
/// Searches are field-tagged: the author term is sent as `inauthor:` and the
/// title term as `intitle:`, joined by `+`.
#[derive(Debug, Clone)]
pub struct GoogleBooksClient {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksClient {
    /// Create a client for the public Google Books endpoint
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self::with_base_url(client, GOOGLE_BOOKS_API_BASE, api_key)
    }

    /// Create a client for a custom endpoint (proxies, test servers)
    pub fn with_base_url(client: HttpClient, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Build the `q` expression for a query, percent-encoding every term
    pub fn build_search_expression(query: &Query) -> String {
        let mut parts = Vec::new();

        if let Some(author) = query.author_term() {
            parts.push(format!("inauthor:{}", urlencoding::encode(author)));
        }
        if let Some(title) = query.title_term() {
            parts.push(format!("intitle:{}", urlencoding::encode(title)));
        }

        parts.join("+")
    }

    fn search_url(&self, query: &Query, start_index: usize, max_results: usize) -> String {
        let url = format!(
            "{}/volumes?q={}&startIndex={}&maxResults={}",
            self.base_url,
            Self::build_search_expression(query),
            start_index,
            max_results
        );
        self.add_key_if_present(url)
    }

    fn volume_url(&self, id: &str) -> String {
        let url = format!("{}/volumes/{}", self.base_url, urlencoding::encode(id));
        if let Some(ref key) = self.api_key {
            format!("{}?key={}", url, urlencoding::encode(key))
        } else {
            url
        }
    }

    fn add_key_if_present(&self, url: String) -> String {
        if let Some(ref key) = self.api_key {
            format!("{}&key={}", url, urlencoding::encode(key))
        } else {
            url
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let response = self
            .client
            .client()
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(format!("Failed to reach catalog: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::Transport(format!("Failed to read response: {}", e)))?;

        parse_body(status, &body)
    }

    /// Convert a catalog volume into an item
    fn parse_volume(volume: Volume) -> CatalogItem {
        let info = volume.volume_info;
        let mut builder = CatalogItemBuilder::new(volume.id, info.title.unwrap_or_default())
            .authors(info.authors);

        if let Some(date) = info.published_date {
            builder = builder.published_date(&date);
        }
        if let Some(description) = info.description {
            builder = builder.description(description);
        }
        if let Some(pages) = info.page_count {
            builder = builder.page_count(pages);
        }
        if let Some(publisher) = info.publisher {
            builder = builder.publisher(publisher);
        }
        if let Some(thumbnail) = info.image_links.and_then(|l| l.thumbnail) {
            builder = builder.thumbnail_url(thumbnail);
        }

        builder.build()
    }
}

/// Decode a catalog response body.
///
/// An embedded `error` object wins over the HTTP status because it carries the
/// catalog's own message.
fn parse_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, CatalogError> {
    let value: Option<serde_json::Value> = serde_json::from_str(body).ok();

    if let Some(error) = value.as_ref().and_then(|v| v.get("error")) {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown catalog error");
        return Err(CatalogError::Upstream(message.to_string()));
    }

    if !status.is_success() {
        return Err(CatalogError::Transport(format!(
            "Catalog returned status: {}",
            status
        )));
    }

    match value {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Err(CatalogError::Transport(
            "Malformed payload: response is not JSON".to_string(),
        )),
    }
}

#[async_trait]
impl CatalogSource for GoogleBooksClient {
    fn id(&self) -> &str {
        "google_books"
    }

    async fn fetch_page(
        &self,
        query: &Query,
        start_index: usize,
        max_results: usize,
    ) -> Result<FetchedPage, CatalogError> {
        if !(1..=MAX_PAGE_SIZE).contains(&max_results) {
            return Err(CatalogError::InvalidRequest(format!(
                "maxResults must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, max_results
            )));
        }
        query
            .validate()
            .map_err(|e| CatalogError::InvalidRequest(e.to_string()))?;

        let url = self.search_url(query, start_index, max_results);
        tracing::debug!(%query, start_index, max_results, "Fetching catalog page");

        let data: VolumesResponse = self.get_json(&url).await?;

        let mut items = Vec::with_capacity(data.items.len());
        for volume in data.items {
            if volume.id.is_empty() {
                tracing::warn!("Skipping catalog volume without an id");
                continue;
            }
            items.push(Self::parse_volume(volume));
        }

        Ok(FetchedPage::new(items, data.total_items))
    }

    async fn get_by_id(&self, id: &str) -> Result<CatalogItem, CatalogError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CatalogError::InvalidRequest("empty volume id".to_string()));
        }

        let volume: Volume = self.get_json(&self.volume_url(id)).await?;
        if volume.id.is_empty() {
            return Err(CatalogError::Transport(
                "Malformed payload: volume without an id".to_string(),
            ));
        }
        Ok(Self::parse_volume(volume))
    }
}

// ===== Google Books API Types =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    total_items: usize,
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    #[serde(default)]
    id: String,
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    published_date: Option<String>,
    description: Option<String>,
    page_count: Option<u32>,
    publisher: Option<String>,
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str, key: Option<&str>) -> GoogleBooksClient {
        GoogleBooksClient::with_base_url(
            HttpClient::new().unwrap(),
            base_url,
            key.map(str::to_string),
        )
    }

    #[test]
    fn test_build_search_expression_both_terms() {
        let query = Query::new(Some("Frank Herbert"), Some("Dune"));
        assert_eq!(
            GoogleBooksClient::build_search_expression(&query),
            "inauthor:Frank%20Herbert+intitle:Dune"
        );
    }

    #[test]
    fn test_build_search_expression_single_term() {
        assert_eq!(
            GoogleBooksClient::build_search_expression(&Query::by_title("C++ & you")),
            "intitle:C%2B%2B%20%26%20you"
        );
        assert_eq!(
            GoogleBooksClient::build_search_expression(&Query::by_author("村上春樹")),
            format!("inauthor:{}", urlencoding::encode("村上春樹"))
        );
    }

    #[test]
    fn test_search_url_with_key() {
        let c = client("http://localhost/books/v1/", Some("k 1"));
        let url = c.search_url(&Query::by_author("Austen"), 20, 10);
        assert_eq!(
            url,
            "http://localhost/books/v1/volumes?q=inauthor:Austen&startIndex=20&maxResults=10&key=k%201"
        );
    }

    #[test]
    fn test_search_url_without_key() {
        let c = client("http://localhost", Some(""));
        let url = c.search_url(&Query::by_title("Emma"), 0, 40);
        assert!(!url.contains("key="));
    }

    #[test]
    fn test_parse_body_embedded_error() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        let result: Result<VolumesResponse, _> = parse_body(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            result.unwrap_err(),
            CatalogError::Upstream("API key not valid".to_string())
        );
    }

    #[test]
    fn test_parse_body_bad_status_without_error_object() {
        let result: Result<VolumesResponse, _> =
            parse_body(StatusCode::SERVICE_UNAVAILABLE, "<html>down</html>");
        assert!(matches!(result, Err(CatalogError::Transport(msg)) if msg.contains("503")));
    }

    #[test]
    fn test_parse_body_malformed() {
        let result: Result<VolumesResponse, _> = parse_body(StatusCode::OK, "not json");
        assert!(matches!(result, Err(CatalogError::Transport(_))));

        let result: Result<VolumesResponse, _> =
            parse_body(StatusCode::OK, r#"{"totalItems": "many"}"#);
        assert!(matches!(result, Err(CatalogError::Transport(_))));
    }

    #[test]
    fn test_parse_body_zero_results() {
        let data: VolumesResponse =
            parse_body(StatusCode::OK, r#"{"kind": "books#volumes", "totalItems": 0}"#).unwrap();
        assert_eq!(data.total_items, 0);
        assert!(data.items.is_empty());
    }

    #[test]
    fn test_parse_volume_fields() {
        let body = r#"{
            "id": "zyTCAlFPjgYC",
            "volumeInfo": {
                "title": "The Google Story",
                "authors": ["David A. Vise", "Mark Malseed"],
                "publisher": "Random House",
                "publishedDate": "2005-11-15",
                "description": "Here is the story...",
                "pageCount": 207,
                "imageLinks": {"thumbnail": "http://books.google.com/thumb"}
            }
        }"#;
        let volume: Volume = serde_json::from_str(body).unwrap();
        let item = GoogleBooksClient::parse_volume(volume);

        assert_eq!(item.id, "zyTCAlFPjgYC");
        assert_eq!(item.title, "The Google Story");
        assert_eq!(item.authors, vec!["David A. Vise", "Mark Malseed"]);
        assert_eq!(item.published_year, Some(2005));
        assert_eq!(item.page_count, Some(207));
        assert_eq!(item.publisher.as_deref(), Some("Random House"));
        assert_eq!(
            item.thumbnail_url.as_deref(),
            Some("http://books.google.com/thumb")
        );
    }

    #[test]
    fn test_parse_volume_sparse() {
        let volume: Volume = serde_json::from_str(r#"{"id": "x", "volumeInfo": {}}"#).unwrap();
        let item = GoogleBooksClient::parse_volume(volume);
        assert_eq!(item.title, "");
        assert!(item.authors.is_empty());
        assert_eq!(item.published_year, None);
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_page_size_out_of_range() {
        let c = client("http://127.0.0.1:9", None);
        let query = Query::by_author("Austen");

        let err = c.fetch_page(&query, 0, 0).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRequest(_)));

        let err = c.fetch_page(&query, 0, 41).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_fetch_page_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/volumes")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("q".into(), "inauthor:Austen intitle:Emma".into()),
                mockito::Matcher::UrlEncoded("startIndex".into(), "10".into()),
                mockito::Matcher::UrlEncoded("maxResults".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"totalItems": 42, "items": [
                    {"id": "a", "volumeInfo": {"title": "Emma", "authors": ["Jane Austen"], "publishedDate": "1815"}},
                    {"volumeInfo": {"title": "No id"}}
                ]}"#,
            )
            .create_async()
            .await;

        let c = client(&server.url(), None);
        let page = c
            .fetch_page(&Query::new(Some("Austen"), Some("Emma")), 10, 10)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.total_results, 42);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].published_year, Some(1815));
    }

    #[tokio::test]
    async fn test_get_by_id_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/volumes/abc123")
            .with_status(200)
            .with_body(r#"{"id": "abc123", "volumeInfo": {"title": "Persuasion"}}"#)
            .create_async()
            .await;

        let c = client(&server.url(), None);
        let item = c.get_by_id("abc123").await.unwrap();
        assert_eq!(item.title, "Persuasion");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_is_upstream() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/volumes/missing")
            .with_status(404)
            .with_body(r#"{"error": {"code": 404, "message": "The volume ID could not be found."}}"#)
            .create_async()
            .await;

        let c = client(&server.url(), None);
        let err = c.get_by_id("missing").await.unwrap_err();
        assert!(matches!(err, CatalogError::Upstream(msg) if msg.contains("could not be found")));
    }
}
