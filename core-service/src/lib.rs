//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, clock) and a
//! [`CoreConfig`] into a ready [`GroupingsService`]. Desktop and server hosts
//! typically enable the `desktop-shims` feature (which depends on
//! `bridge-desktop`) and call [`bootstrap_desktop`].
//!
//! The media server connection is bound when the service is built. Runs still
//! take the configuration explicitly, so grouping and credential edits apply
//! on the next run; rebuild the service when server settings change.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{http::HttpClient, time::Clock, SystemClock};
use core_library::{CatalogItem, WatchState};
use core_providers::{ListFetchers, TmdbClient, TraktClient};
use core_runtime::config::CoreConfig;
use core_sync::{
    JobOutcome, ScheduledJob, SyncCoordinator, SyncResult, SyncScheduler,
};
use provider_jellyfin::JellyfinConnector;
use tracing::info;

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(http_client: Arc<dyn HttpClient>, clock: Arc<dyn Clock>) -> Self {
        Self { http_client, clock }
    }

    /// Bundle using the host clock.
    pub fn with_system_clock(http_client: Arc<dyn HttpClient>) -> Self {
        Self::new(http_client, Arc::new(SystemClock))
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct GroupingsService {
    coordinator: Arc<SyncCoordinator>,
    scheduler: Arc<SyncScheduler>,
}

impl GroupingsService {
    /// Wire the Jellyfin connector, the TMDb and Trakt fetchers and the sync
    /// coordinator.
    ///
    /// # Errors
    ///
    /// Fails when the server settings or target path are missing.
    pub fn new(config: &CoreConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let jellyfin = Arc::new(JellyfinConnector::from_config(
            Arc::clone(&deps.http_client),
            config,
        ));
        let tmdb = Arc::new(TmdbClient::new(Arc::clone(&deps.http_client)));
        let trakt = Arc::new(TraktClient::new(Arc::clone(&deps.http_client)));

        let fetchers = ListFetchers::new().register(tmdb.clone()).register(trakt);

        let coordinator = Arc::new(
            SyncCoordinator::new(
                jellyfin.clone(),
                jellyfin.clone(),
                fetchers,
                tmdb,
                deps.clock,
            )
            .with_library_manager(jellyfin),
        );

        info!(server = %config.base_url(), "Groupings service ready");

        Ok(Self {
            scheduler: Arc::new(SyncScheduler::new(Arc::clone(&coordinator))),
            coordinator,
        })
    }

    /// Synchronize groupings; see [`SyncCoordinator::run`].
    pub async fn run(
        &self,
        config: &CoreConfig,
        dry_run: bool,
        group_names: Option<&[String]>,
    ) -> Result<Vec<SyncResult>> {
        Ok(self.coordinator.run(config, dry_run, group_names).await?)
    }

    /// Resolve an ad-hoc filter without touching the filesystem.
    pub async fn preview(
        &self,
        field: &str,
        value: &str,
        watch_state: WatchState,
    ) -> Result<Vec<CatalogItem>> {
        Ok(self.coordinator.preview(field, value, watch_state).await?)
    }

    pub async fn cleanup_broken_symlinks(&self, config: &CoreConfig) -> Result<usize> {
        Ok(self.coordinator.cleanup_broken_symlinks(config).await?)
    }

    /// Jobs the host scheduler should register for `config`.
    pub fn scheduled_jobs(&self, config: &CoreConfig) -> Vec<ScheduledJob> {
        SyncScheduler::plan(config)
    }

    /// Run a job the host scheduler fired.
    pub async fn execute_job(&self, job: &ScheduledJob, config: &CoreConfig) -> Result<JobOutcome> {
        Ok(self.scheduler.execute(job, config).await?)
    }

    pub fn coordinator(&self) -> Arc<SyncCoordinator> {
        Arc::clone(&self.coordinator)
    }
}

/// Convenience bootstrapper for desktop and server hosts.
///
/// Provider fetches are not retried; a failed fetch surfaces as that
/// grouping's error.
///
/// ```ignore
/// # #[cfg(feature = "desktop-shims")]
/// # async fn example(config: core_runtime::CoreConfig) -> core_service::Result<()> {
/// let service = core_service::bootstrap_desktop(&config)?;
/// let results = service.run(&config, true, None).await?;
/// # Ok(())
/// # }
/// ```
#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub fn bootstrap_desktop(config: &CoreConfig) -> Result<GroupingsService> {
    use bridge_desktop::ReqwestHttpClient;
    use bridge_traits::http::RetryPolicy;

    let http_client = ReqwestHttpClient::new()
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?
        .with_retry_policy(RetryPolicy::no_retry());

    GroupingsService::new(
        config,
        CoreDependencies::with_system_clock(Arc::new(http_client)),
    )
}
