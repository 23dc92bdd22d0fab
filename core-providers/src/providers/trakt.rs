//! Trakt API Client
//!
//! Fetches the IMDb ids of a user's public Trakt list through the v2 API.
//!
//! ## API Endpoints
//!
//! - **List items**: `https://api.trakt.tv/users/{user}/lists/{slug}/items?page={n}&limit=1000`
//!
//! Requests carry the `trakt-api-key` and `trakt-api-version: 2` headers.
//! The page count comes from the `X-Pagination-Page-Count` response header.

use crate::error::{ProviderError, Result};
use crate::fetcher::ExternalListFetcher;
use crate::list::{ExternalId, ListProvider};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::config::ProviderCredentials;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Trakt API base URL
const TRAKT_API_BASE: &str = "https://api.trakt.tv";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const PAGE_LIMIT: u32 = 1000;

/// Upper bound on list pages fetched
pub const MAX_PAGES: u32 = 50;

static LIST_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"trakt\.tv/users/([^/]+)/lists/([^/?#]+)").expect("Trakt list regex should compile")
});

#[derive(Debug, Deserialize)]
struct ListEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(flatten)]
    media: HashMap<String, serde_json::Value>,
}

impl ListEntry {
    fn imdb_id(&self) -> Option<&str> {
        let kind = self.kind.as_deref()?;
        self.media
            .get(kind)?
            .get("ids")?
            .get("imdb")?
            .as_str()
            .filter(|id| !id.is_empty())
    }
}

/// A Trakt list reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraktList {
    pub user: String,
    pub slug: String,
}

/// Trakt API client
pub struct TraktClient {
    http_client: Arc<dyn HttpClient>,
}

impl TraktClient {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    /// Accepts `https://trakt.tv/users/{user}/lists/{slug}` or `user/slug`.
    pub fn parse_list(source: &str) -> Result<TraktList> {
        let source = source.trim();

        if let Some(captures) = LIST_URL.captures(source) {
            return Ok(TraktList {
                user: captures[1].to_string(),
                slug: captures[2].to_string(),
            });
        }

        if !source.starts_with("http") {
            if let Some((user, slug)) = source.split_once('/') {
                return Ok(TraktList {
                    user: user.to_string(),
                    slug: slug.to_string(),
                });
            }
        }

        Err(ProviderError::InvalidSource(format!(
            "{:?}, expected https://trakt.tv/users/username/lists/list-slug",
            source
        )))
    }

    async fn fetch_page(&self, list: &TraktList, page: u32, client_id: &str) -> Result<HttpResponse> {
        let request = HttpRequest::new(
            HttpMethod::Get,
            format!(
                "{}/users/{}/lists/{}/items",
                TRAKT_API_BASE,
                urlencoding::encode(&list.user),
                urlencoding::encode(&list.slug)
            ),
        )
        .query("page", &page.to_string())
        .query("limit", &PAGE_LIMIT.to_string())
        .header("trakt-api-key", client_id)
        .header("trakt-api-version", "2")
        .header("Content-Type", "application/json")
        .timeout(REQUEST_TIMEOUT);

        self.http_client
            .execute(request)
            .await
            .and_then(HttpResponse::error_for_status)
            .map_err(|e| {
                ProviderError::Request(format!("Failed to fetch Trakt list page {}: {}", page, e))
            })
    }
}

#[async_trait]
impl ExternalListFetcher for TraktClient {
    fn provider(&self) -> ListProvider {
        ListProvider::Trakt
    }

    async fn fetch(
        &self,
        source: &str,
        credentials: &ProviderCredentials,
    ) -> Result<Vec<ExternalId>> {
        let client_id = credentials
            .trakt_client_id()
            .ok_or(ProviderError::MissingCredential {
                name: "Trakt Client ID",
                setting: "trakt_client_id",
            })?;
        let list = Self::parse_list(source)?;

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        let mut page: u32 = 1;

        loop {
            let response = self.fetch_page(&list, page, client_id).await?;
            let entries: Vec<ListEntry> = response.json().map_err(|e| {
                ProviderError::JsonParse(format!("Trakt list page {}: {}", page, e))
            })?;

            if entries.is_empty() {
                break;
            }

            for imdb_id in entries.iter().filter_map(ListEntry::imdb_id) {
                if seen.insert(imdb_id.to_string()) {
                    ids.push(ExternalId::new(imdb_id));
                }
            }

            let total_pages = response
                .header("X-Pagination-Page-Count")
                .and_then(|value| value.trim().parse::<u32>().ok())
                .unwrap_or(1);
            if page >= total_pages || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        info!(user = %list.user, slug = %list.slug, count = ids.len(), "Fetched Trakt list");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bytes::Bytes;
    use mockall::mock;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn page(body: serde_json::Value, page_count: u32) -> HttpResponse {
        let mut headers = HashMap::new();
        headers.insert("x-pagination-page-count".to_string(), page_count.to_string());
        HttpResponse {
            status: 200,
            headers,
            body: Bytes::from(body.to_string()),
        }
    }

    fn credentials() -> ProviderCredentials {
        ProviderCredentials {
            trakt_client_id: "client".to_string(),
            ..ProviderCredentials::default()
        }
    }

    #[test]
    fn test_parse_list_url_and_shorthand() {
        let expected = TraktList {
            user: "jane".to_string(),
            slug: "my-list".to_string(),
        };
        assert_eq!(
            TraktClient::parse_list("https://trakt.tv/users/jane/lists/my-list?sort=rank").unwrap(),
            expected
        );
        assert_eq!(TraktClient::parse_list(" jane/my-list ").unwrap(), expected);
        assert!(TraktClient::parse_list("https://trakt.tv/movies/inception").is_err());
        assert!(TraktClient::parse_list("just-a-slug").is_err());
    }

    #[tokio::test]
    async fn test_fetch_sends_headers_and_dedups() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| {
                req.url == "https://api.trakt.tv/users/jane/lists/top/items?page=1&limit=1000"
                    && req.headers.get("trakt-api-key").map(String::as_str) == Some("client")
                    && req.headers.get("trakt-api-version").map(String::as_str) == Some("2")
            })
            .times(1)
            .returning(|_| {
                Ok(page(
                    serde_json::json!([
                        {"type": "movie", "movie": {"ids": {"imdb": "tt1"}}},
                        {"type": "show", "show": {"ids": {"imdb": "tt2"}}},
                        {"type": "movie", "movie": {"ids": {"imdb": "tt1"}}},
                        {"type": "episode", "episode": {"ids": {"tvdb": 5}}}
                    ]),
                    1,
                ))
            });

        let client = TraktClient::new(Arc::new(http));
        let ids = client.fetch("jane/top", &credentials()).await.unwrap();
        assert_eq!(ids, vec![ExternalId::from("tt1"), ExternalId::from("tt2")]);
    }

    #[tokio::test]
    async fn test_follows_page_count_header() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| req.url.contains("page=1&"))
            .times(1)
            .returning(|_| {
                Ok(page(
                    serde_json::json!([{"type": "movie", "movie": {"ids": {"imdb": "tt1"}}}]),
                    2,
                ))
            });
        http.expect_execute()
            .withf(|req| req.url.contains("page=2&"))
            .times(1)
            .returning(|_| {
                Ok(page(
                    serde_json::json!([{"type": "movie", "movie": {"ids": {"imdb": "tt2"}}}]),
                    2,
                ))
            });

        let client = TraktClient::new(Arc::new(http));
        let ids = client.fetch("jane/top", &credentials()).await.unwrap();
        assert_eq!(ids, vec![ExternalId::from("tt1"), ExternalId::from("tt2")]);
    }

    #[tokio::test]
    async fn test_missing_client_id() {
        let client = TraktClient::new(Arc::new(MockHttpClient::new()));
        let err = client
            .fetch("jane/top", &ProviderCredentials::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Trakt Client ID not set (trakt_client_id)");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut http = MockHttpClient::new();
        http.expect_execute().returning(|_| {
            Ok(HttpResponse {
                status: 404,
                headers: HashMap::new(),
                body: Bytes::from("Not Found"),
            })
        });

        let client = TraktClient::new(Arc::new(http));
        let err = client.fetch("jane/missing", &credentials()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch Trakt list page 1: HTTP 404: Not Found"
        );
    }
}
