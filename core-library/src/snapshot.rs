//! Catalog data sources and the run-scoped snapshot.
//!
//! ## Overview
//!
//! The media server is reached through two collaborator traits:
//!
//! - [`LibrarySnapshotProvider`] returns either every movie and series with
//!   rich fields (for rule and external-list matching) or a filtered, sorted
//!   subset pushed to the server (for plain metadata filters).
//! - [`RecentActivityProvider`] returns a user's recently watched items,
//!   which seed recommendations.
//!
//! [`RunSnapshot`] wraps a snapshot provider for the lifetime of one
//! synchronization run. The full catalog is fetched at most once per run and
//! shared by every grouping; dropping the `RunSnapshot` at the end of the run
//! discards it, so the next run always sees fresh data.
//!
//! ## Usage
//!
//! ```ignore
//! use core_library::snapshot::RunSnapshot;
//!
//! let snapshot = RunSnapshot::new(provider.clone());
//! let items = snapshot.items().await?;   // fetches
//! let again = snapshot.items().await?;   // reuses
//! ```

use crate::error::Result;
use crate::models::CatalogItem;
use crate::query::CatalogQuery;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Source of catalog items.
#[async_trait]
pub trait LibrarySnapshotProvider: Send + Sync {
    /// Fetch every movie and series with the fields matching needs
    /// (path, provider ids, genres, studios, tags, people, year, rating,
    /// watch state).
    async fn fetch_snapshot(&self) -> Result<Vec<CatalogItem>>;

    /// Fetch items matching `query`, filtered and sorted by the data source.
    async fn query_items(&self, query: &CatalogQuery) -> Result<Vec<CatalogItem>>;
}

/// Source of a user's recent viewing activity.
#[async_trait]
pub trait RecentActivityProvider: Send + Sync {
    /// Up to `limit` items the user watched most recently, newest first.
    async fn recent_items(&self, user_id: &str, limit: usize) -> Result<Vec<CatalogItem>>;
}

/// Full catalog fetched lazily, at most once, for a single run.
pub struct RunSnapshot {
    provider: Arc<dyn LibrarySnapshotProvider>,
    items: OnceCell<Arc<Vec<CatalogItem>>>,
}

impl RunSnapshot {
    pub fn new(provider: Arc<dyn LibrarySnapshotProvider>) -> Self {
        Self {
            provider,
            items: OnceCell::new(),
        }
    }

    /// The run's catalog, fetching it on first use.
    ///
    /// A failed fetch is not cached; a later grouping in the same run retries.
    pub async fn items(&self) -> Result<Arc<Vec<CatalogItem>>> {
        let items = self
            .items
            .get_or_try_init(|| async {
                let items = self.provider.fetch_snapshot().await?;
                debug!(count = items.len(), "Fetched library snapshot for run");
                Ok::<_, crate::error::LibraryError>(Arc::new(items))
            })
            .await?;
        Ok(Arc::clone(items))
    }

    pub fn is_loaded(&self) -> bool {
        self.items.initialized()
    }

    /// Filtered query against the same provider; never cached.
    pub async fn query(&self, query: &CatalogQuery) -> Result<Vec<CatalogItem>> {
        self.provider.query_items(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LibraryError;
    use mockall::mock;

    mock! {
        Provider {}

        #[async_trait]
        impl LibrarySnapshotProvider for Provider {
            async fn fetch_snapshot(&self) -> Result<Vec<CatalogItem>>;
            async fn query_items(&self, query: &CatalogQuery) -> Result<Vec<CatalogItem>>;
        }
    }

    #[tokio::test]
    async fn test_snapshot_fetched_once_per_run() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .times(1)
            .returning(|| Ok(vec![CatalogItem::new("1", "Alien")]));

        let snapshot = RunSnapshot::new(Arc::new(provider));
        assert!(!snapshot.is_loaded());

        let first = snapshot.items().await.unwrap();
        let second = snapshot.items().await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(snapshot.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let mut provider = MockProvider::new();
        let mut calls = 0;
        provider.expect_fetch_snapshot().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Err(LibraryError::Unavailable("connection refused".to_string()))
            } else {
                Ok(Vec::new())
            }
        });

        let snapshot = RunSnapshot::new(Arc::new(provider));
        assert!(snapshot.items().await.is_err());
        assert!(snapshot.items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_snapshot_refetches() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .times(2)
            .returning(|| Ok(Vec::new()));
        let provider: Arc<dyn LibrarySnapshotProvider> = Arc::new(provider);

        RunSnapshot::new(Arc::clone(&provider)).items().await.unwrap();
        RunSnapshot::new(provider).items().await.unwrap();
    }
}
