//! Collaborator traits for fetching external id lists.
//!
//! Each provider contributes one [`ExternalListFetcher`]. Recommendations use
//! a separate [`RecommendationFetcher`] because they are seeded from catalog
//! items instead of a list identifier.

use crate::error::{ProviderError, Result};
use crate::list::{ExternalId, ListProvider};
use async_trait::async_trait;
use core_runtime::config::ProviderCredentials;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Fetches the ordered id list behind a grouping's `source_value`.
#[async_trait]
pub trait ExternalListFetcher: Send + Sync {
    fn provider(&self) -> ListProvider;

    /// Fetch ids in list order.
    ///
    /// # Arguments
    ///
    /// * `source` - list identifier, URL or `user/slug` shorthand
    /// * `credentials` - the run's provider credentials
    async fn fetch(
        &self,
        source: &str,
        credentials: &ProviderCredentials,
    ) -> Result<Vec<ExternalId>>;
}

/// Media kind of a recommendation seed, as TMDb names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Map a catalog item type; only movies and series seed recommendations.
    pub fn from_item_type(item_type: &str) -> Option<Self> {
        match item_type {
            "Movie" => Some(MediaType::Movie),
            "Series" => Some(MediaType::Tv),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

/// A recently watched title that recommendations are derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecommendationSeed {
    pub tmdb_id: String,
    pub media_type: MediaType,
}

/// Produces ranked TMDb ids recommended from a set of seeds.
#[async_trait]
pub trait RecommendationFetcher: Send + Sync {
    async fn recommend(
        &self,
        seeds: &[RecommendationSeed],
        credentials: &ProviderCredentials,
    ) -> Result<Vec<ExternalId>>;
}

/// Registry of list fetchers keyed by provider.
#[derive(Clone, Default)]
pub struct ListFetchers {
    fetchers: HashMap<ListProvider, Arc<dyn ExternalListFetcher>>,
}

impl ListFetchers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fetcher under the provider it reports; replaces any
    /// previous fetcher for that provider.
    pub fn register(mut self, fetcher: Arc<dyn ExternalListFetcher>) -> Self {
        self.fetchers.insert(fetcher.provider(), fetcher);
        self
    }

    pub fn get(&self, provider: ListProvider) -> Result<Arc<dyn ExternalListFetcher>> {
        self.fetchers
            .get(&provider)
            .cloned()
            .ok_or_else(|| ProviderError::Unsupported(provider.label().to_string()))
    }

    pub fn providers(&self) -> Vec<ListProvider> {
        ListProvider::ALL
            .into_iter()
            .filter(|provider| self.fetchers.contains_key(provider))
            .collect()
    }
}
