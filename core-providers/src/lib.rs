//! # External List Providers
//!
//! Resolves ranked id lists from external services against the library.
//!
//! ## Overview
//!
//! This crate handles:
//! - The provider catalog ([`ListProvider`]) and provider-typed ids ([`ExternalId`])
//! - Fetcher traits for list sources and recommendations
//! - The resolver that maps external ids onto catalog items
//! - HTTP fetchers for TMDb and Trakt
//!
//! ## Usage
//!
//! ```ignore
//! use core_providers::{resolve, ListFetchers, ListProvider};
//!
//! let fetcher = fetchers.get(ListProvider::Trakt)?;
//! let ids = fetcher.fetch("jane/top-100", &config.credentials).await?;
//! let items = resolve(ListProvider::Trakt, &ids, &catalog, &sort_order, watch_state);
//! ```

pub mod error;
pub mod fetcher;
pub mod list;
pub mod providers;
pub mod resolver;

pub use error::{ProviderError, Result};
pub use fetcher::{
    ExternalListFetcher, ListFetchers, MediaType, RecommendationFetcher, RecommendationSeed,
};
pub use list::{ExternalId, ListProvider, MatchKey};
pub use providers::{TmdbClient, TraktClient};
pub use resolver::{resolve, ProviderIndex};
