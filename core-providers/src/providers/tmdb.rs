//! TMDb API Client
//!
//! Fetches ranked TMDb ids from public v3 lists and derives recommendations
//! from recently watched titles.
//!
//! ## API Endpoints
//!
//! - **List**: `https://api.themoviedb.org/3/list/{id}?api_key={key}&page={n}&language=en-US`
//! - **Recommendations**: `https://api.themoviedb.org/3/{movie|tv}/{id}/recommendations?api_key={key}&page=1&language=en-US`
//!
//! ## Paging
//!
//! Lists are read page by page until `total_pages` is reached, capped at
//! [`MAX_PAGES`] to bound pathological responses.
//!
//! ## Usage
//!
//! ```ignore
//! use core_providers::providers::TmdbClient;
//!
//! let client = TmdbClient::new(http_client);
//! let ids = client.fetch("https://www.themoviedb.org/list/8204859", &credentials).await?;
//! ```

use crate::error::{ProviderError, Result};
use crate::fetcher::{ExternalListFetcher, RecommendationFetcher, RecommendationSeed};
use crate::list::{ExternalId, ListProvider};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::config::ProviderCredentials;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// TMDb API base URL
const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound on list pages fetched
pub const MAX_PAGES: u32 = 50;

#[derive(Debug, Deserialize)]
struct IdEntry {
    #[serde(default)]
    id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    items: Vec<IdEntry>,
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RecommendationPage {
    #[serde(default)]
    results: Vec<IdEntry>,
}

/// TMDb API client
pub struct TmdbClient {
    http_client: Arc<dyn HttpClient>,
}

impl TmdbClient {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    fn api_key(credentials: &ProviderCredentials) -> Result<&str> {
        credentials
            .tmdb_api_key()
            .ok_or(ProviderError::MissingCredential {
                name: "TMDb API key",
                setting: "tmdb_api_key",
            })
    }

    /// Accepts a bare list id or a `themoviedb.org/list/{id}` URL.
    pub fn parse_list_id(source: &str) -> Result<String> {
        let source = source.trim();
        let list_id = match source.split_once("themoviedb.org/list/") {
            Some((_, rest)) => rest
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .trim_matches('/')
                .split('/')
                .next()
                .unwrap_or_default(),
            None => source,
        };

        if list_id.is_empty() {
            return Err(ProviderError::InvalidSource(
                "A TMDb List ID is required".to_string(),
            ));
        }
        Ok(list_id.to_string())
    }

    async fn get(&self, request: HttpRequest, context: &str) -> Result<HttpResponse> {
        self.http_client
            .execute(request.timeout(REQUEST_TIMEOUT))
            .await
            .and_then(HttpResponse::error_for_status)
            .map_err(|e| ProviderError::Request(format!("{}: {}", context, e)))
    }

    async fn fetch_list(&self, list_id: &str, api_key: &str) -> Result<Vec<ExternalId>> {
        let mut ids = Vec::new();
        let mut page: u32 = 1;

        loop {
            let request = HttpRequest::new(
                HttpMethod::Get,
                format!("{}/list/{}", TMDB_API_BASE, urlencoding::encode(list_id)),
            )
            .query("api_key", api_key)
            .query("page", &page.to_string())
            .query("language", "en-US");

            let response = self
                .get(request, &format!("Failed to fetch TMDb list page {}", page))
                .await?;
            let body: ListPage = response.json().map_err(|e| {
                ProviderError::JsonParse(format!("TMDb list page {}: {}", page, e))
            })?;

            if body.items.is_empty() {
                break;
            }

            ids.extend(
                body.items
                    .iter()
                    .filter_map(|entry| entry.id)
                    .filter(|id| *id != 0)
                    .map(|id| ExternalId::new(id.to_string())),
            );

            let total_pages = body.total_pages.unwrap_or(1);
            if page >= total_pages || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        Ok(ids)
    }

    async fn fetch_recommendations(
        &self,
        seed: &RecommendationSeed,
        api_key: &str,
    ) -> Result<Vec<String>> {
        let request = HttpRequest::new(
            HttpMethod::Get,
            format!(
                "{}/{}/{}/recommendations",
                TMDB_API_BASE,
                seed.media_type.as_str(),
                urlencoding::encode(&seed.tmdb_id)
            ),
        )
        .query("api_key", api_key)
        .query("page", "1")
        .query("language", "en-US");

        let context = format!("Failed to fetch TMDb recommendations for {}", seed.tmdb_id);
        let response = self.get(request, &context).await?;
        let body: RecommendationPage = response
            .json()
            .map_err(|e| ProviderError::JsonParse(format!("TMDb recommendations: {}", e)))?;

        Ok(body
            .results
            .iter()
            .filter_map(|entry| entry.id)
            .filter(|id| *id != 0)
            .map(|id| id.to_string())
            .collect())
    }
}

#[async_trait]
impl ExternalListFetcher for TmdbClient {
    fn provider(&self) -> ListProvider {
        ListProvider::Tmdb
    }

    async fn fetch(
        &self,
        source: &str,
        credentials: &ProviderCredentials,
    ) -> Result<Vec<ExternalId>> {
        let api_key = Self::api_key(credentials)?;
        let list_id = Self::parse_list_id(source)?;

        let ids = self.fetch_list(&list_id, api_key).await?;
        info!(list_id = %list_id, count = ids.len(), "Fetched TMDb list");
        Ok(ids)
    }
}

#[async_trait]
impl RecommendationFetcher for TmdbClient {
    /// Scores every recommended id by reciprocal rank summed across seeds.
    ///
    /// Seeds that fail are skipped. Seed titles themselves are never
    /// recommended. Ties keep the order in which ids were first seen.
    async fn recommend(
        &self,
        seeds: &[RecommendationSeed],
        credentials: &ProviderCredentials,
    ) -> Result<Vec<ExternalId>> {
        let api_key = Self::api_key(credentials)?;
        let seed_ids: HashSet<&str> = seeds.iter().map(|seed| seed.tmdb_id.as_str()).collect();

        let mut scored: Vec<(String, f64)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for seed in seeds {
            let recommended = match self.fetch_recommendations(seed, api_key).await {
                Ok(recommended) => recommended,
                Err(e) => {
                    warn!(tmdb_id = %seed.tmdb_id, error = %e, "Skipping recommendation seed");
                    continue;
                }
            };

            for (rank, id) in recommended.into_iter().enumerate() {
                if seed_ids.contains(id.as_str()) {
                    continue;
                }
                let score = 1.0 / (rank + 1) as f64;
                match positions.get(&id) {
                    Some(&position) => scored[position].1 += score,
                    None => {
                        positions.insert(id.clone(), scored.len());
                        scored.push((id, score));
                    }
                }
            }
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        debug!(seeds = seeds.len(), recommended = scored.len(), "Ranked TMDb recommendations");

        Ok(scored.into_iter().map(|(id, _)| ExternalId::new(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::MediaType;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bytes::Bytes;
    use mockall::mock;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn json_response(body: serde_json::Value) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn credentials() -> ProviderCredentials {
        ProviderCredentials {
            tmdb_api_key: "key".to_string(),
            ..ProviderCredentials::default()
        }
    }

    #[test]
    fn test_parse_list_id() {
        assert_eq!(TmdbClient::parse_list_id(" 8204859 ").unwrap(), "8204859");
        assert_eq!(
            TmdbClient::parse_list_id("https://www.themoviedb.org/list/8204859-best?page=2")
                .unwrap(),
            "8204859-best"
        );
        assert_eq!(
            TmdbClient::parse_list_id("https://www.themoviedb.org/list/42/").unwrap(),
            "42"
        );
        assert!(TmdbClient::parse_list_id("").is_err());
    }

    #[tokio::test]
    async fn test_fetch_pages_until_total() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| req.url.contains("/list/123?") && req.url.contains("page=1&"))
            .times(1)
            .returning(|_| {
                Ok(json_response(serde_json::json!({
                    "items": [{"id": 11}, {"id": 12}],
                    "total_pages": 2
                })))
            });
        http.expect_execute()
            .withf(|req| req.url.contains("page=2&"))
            .times(1)
            .returning(|_| {
                Ok(json_response(serde_json::json!({
                    "items": [{"id": 13}, {"title": "no id"}],
                    "total_pages": 2
                })))
            });

        let client = TmdbClient::new(Arc::new(http));
        let ids = client.fetch("123", &credentials()).await.unwrap();
        assert_eq!(
            ids,
            vec![ExternalId::from("11"), ExternalId::from("12"), ExternalId::from("13")]
        );
    }

    #[tokio::test]
    async fn test_page_cap_bounds_requests() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(MAX_PAGES as usize)
            .returning(|_| {
                Ok(json_response(serde_json::json!({
                    "items": [{"id": 1}],
                    "total_pages": 10_000
                })))
            });

        let client = TmdbClient::new(Arc::new(http));
        let ids = client.fetch("123", &credentials()).await.unwrap();
        assert_eq!(ids.len(), MAX_PAGES as usize);
    }

    #[tokio::test]
    async fn test_missing_api_key_makes_no_request() {
        let http = MockHttpClient::new();
        let client = TmdbClient::new(Arc::new(http));

        let err = client
            .fetch("123", &ProviderCredentials::default())
            .await
            .unwrap_err();
        assert!(err.is_missing_credential());
    }

    #[tokio::test]
    async fn test_http_failure_names_page() {
        let mut http = MockHttpClient::new();
        http.expect_execute().returning(|_| {
            Err(BridgeError::OperationFailed("Connection failed".to_string()))
        });

        let client = TmdbClient::new(Arc::new(http));
        let err = client.fetch("123", &credentials()).await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to fetch TMDb list page 1"));
    }

    #[tokio::test]
    async fn test_recommendations_rank_by_reciprocal_score() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| req.url.contains("/movie/101/recommendations"))
            .returning(|_| {
                Ok(json_response(
                    serde_json::json!({"results": [{"id": 201}, {"id": 202}]}),
                ))
            });
        http.expect_execute()
            .withf(|req| req.url.contains("/tv/102/recommendations"))
            .returning(|_| {
                Ok(json_response(
                    serde_json::json!({"results": [{"id": 202}, {"id": 203}, {"id": 101}]}),
                ))
            });

        let seeds = vec![
            RecommendationSeed {
                tmdb_id: "101".to_string(),
                media_type: MediaType::Movie,
            },
            RecommendationSeed {
                tmdb_id: "102".to_string(),
                media_type: MediaType::Tv,
            },
        ];

        let client = TmdbClient::new(Arc::new(http));
        let ids = client.recommend(&seeds, &credentials()).await.unwrap();
        assert_eq!(
            ids,
            vec![ExternalId::from("202"), ExternalId::from("201"), ExternalId::from("203")]
        );
    }

    #[tokio::test]
    async fn test_failed_seed_is_skipped() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| req.url.contains("/movie/bad/"))
            .returning(|_| {
                Ok(HttpResponse {
                    status: 404,
                    headers: HashMap::new(),
                    body: Bytes::from("not found"),
                })
            });
        http.expect_execute()
            .withf(|req| req.url.contains("/movie/101/"))
            .returning(|_| Ok(json_response(serde_json::json!({"results": [{"id": 201}]}))));

        let seeds = vec![
            RecommendationSeed {
                tmdb_id: "bad".to_string(),
                media_type: MediaType::Movie,
            },
            RecommendationSeed {
                tmdb_id: "101".to_string(),
                media_type: MediaType::Movie,
            },
        ];

        let client = TmdbClient::new(Arc::new(http));
        let ids = client.recommend(&seeds, &credentials()).await.unwrap();
        assert_eq!(ids, vec![ExternalId::from("201")]);
    }
}
