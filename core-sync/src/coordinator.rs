//! # Sync Coordinator
//!
//! Orchestrates synchronization runs over every configured grouping.
//!
//! ## Overview
//!
//! The `SyncCoordinator` is the central orchestrator for sync operations. It
//! coordinates between modules to:
//! - Validate grouping records into [`Grouping`] definitions
//! - Apply the seasonal gate using an injected `Clock`
//! - Resolve items through the library snapshot, the rule evaluator or an
//!   external list fetcher plus the provider resolver
//! - Reconcile each grouping directory through the [`Reconciler`]
//! - Optionally create media server libraries and push covers
//! - Sweep broken symlinks under the target root
//!
//! ## Workflow
//!
//! ### Run
//! 1. Acquire the run lock (runs never overlap)
//! 2. Validate the configuration; fail the whole run if it is incomplete
//! 3. Create the target root (not in dry-run)
//! 4. List existing libraries once when auto-creation is on
//! 5. For each grouping, in configuration order:
//!    1. Skip it when a name filter excludes it
//!    2. Out of season: remove its directory and report `out_of_season`
//!    3. Resolve its items; a failure becomes that grouping's error
//!    4. Dry-run: build a preview. Otherwise wipe and refill the directory
//!    5. Create its library and push its cover when configured
//! 6. Drop the run snapshot so the next run refetches the catalog
//!
//! ### Cleanup
//! 1. Acquire the run lock
//! 2. Walk the target root and unlink symlinks whose target is gone
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::SyncCoordinator;
//! use std::sync::Arc;
//!
//! # async fn example(coordinator: Arc<SyncCoordinator>, config: CoreConfig) -> core_sync::Result<()> {
//! // Preview everything
//! let preview = coordinator.run(&config, true, None).await?;
//!
//! // Sync two groupings
//! let names = vec!["Noir".to_string(), "Top 250".to_string()];
//! let results = coordinator.run(&config, false, Some(&names)).await?;
//!
//! // Remove dangling links
//! let removed = coordinator.cleanup_broken_symlinks(&config).await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    covers::{self, CoverStore, DirectoryCoverStore},
    grouping::{Grouping, SourceKind},
    reconciler::{self, Reconciler},
    result::SyncResult,
    rules, Result, SyncError,
};
use bridge_traits::time::Clock;
use bytes::Bytes;
use core_library::{
    apply_sort_order, provider_keys, CatalogItem, CatalogQuery, LibrarySnapshotProvider,
    MetadataField, RecentActivityProvider, RunSnapshot, VirtualLibraryManager, WatchState,
};
use core_providers::{
    resolve, ExternalId, ListFetchers, ListProvider, MediaType, RecommendationFetcher,
    RecommendationSeed,
};
use core_runtime::config::{CoreConfig, ProviderCredentials};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Recently watched items used to seed recommendations.
pub const RECOMMENDATION_SEED_LIMIT: usize = 20;

/// Library creation state for one run.
struct LibraryPlan {
    manager: Arc<dyn VirtualLibraryManager>,
    existing: Vec<String>,
}

/// Per-run state shared by every grouping.
struct RunContext<'a> {
    config: &'a CoreConfig,
    dry_run: bool,
    target_root: PathBuf,
    snapshot: RunSnapshot,
    reconciler: Reconciler,
    covers: Arc<dyn CoverStore>,
}

/// Sync coordinator
pub struct SyncCoordinator {
    library: Arc<dyn LibrarySnapshotProvider>,
    recent_activity: Arc<dyn RecentActivityProvider>,
    list_fetchers: ListFetchers,
    recommendations: Arc<dyn RecommendationFetcher>,
    clock: Arc<dyn Clock>,
    library_manager: Option<Arc<dyn VirtualLibraryManager>>,
    cover_store: Option<Arc<dyn CoverStore>>,
    run_lock: Mutex<()>,
}

impl SyncCoordinator {
    /// Create a new sync coordinator
    ///
    /// # Arguments
    ///
    /// * `library` - Media server catalog source
    /// * `recent_activity` - Recently watched items, for recommendations
    /// * `list_fetchers` - External list fetchers by provider
    /// * `recommendations` - Recommendation source
    /// * `clock` - Time source for the seasonal gate
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let coordinator = SyncCoordinator::new(
    ///     jellyfin.clone(),
    ///     jellyfin.clone(),
    ///     ListFetchers::new().register(tmdb.clone()),
    ///     tmdb,
    ///     Arc::new(SystemClock),
    /// )
    /// .with_library_manager(jellyfin);
    /// ```
    pub fn new(
        library: Arc<dyn LibrarySnapshotProvider>,
        recent_activity: Arc<dyn RecentActivityProvider>,
        list_fetchers: ListFetchers,
        recommendations: Arc<dyn RecommendationFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            library,
            recent_activity,
            list_fetchers,
            recommendations,
            clock,
            library_manager: None,
            cover_store: None,
            run_lock: Mutex::new(()),
        }
    }

    /// Enable library auto-creation and cover upload.
    pub fn with_library_manager(mut self, manager: Arc<dyn VirtualLibraryManager>) -> Self {
        self.library_manager = Some(manager);
        self
    }

    /// Replace the default `.covers` directory lookup.
    pub fn with_cover_store(mut self, store: Arc<dyn CoverStore>) -> Self {
        self.cover_store = Some(store);
        self
    }

    /// Whether a run or cleanup currently holds the run lock.
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Synchronize configured groupings.
    ///
    /// Waits for any run in progress to finish first.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration read fresh for this run
    /// * `dry_run` - Resolve and preview without touching the filesystem
    /// * `group_names` - Restrict the run to these grouping names
    ///
    /// # Returns
    ///
    /// One result per processed grouping, in configuration order.
    ///
    /// # Errors
    ///
    /// Returns an error only when the configuration is incomplete or the
    /// target root cannot be created. Grouping failures are reported in
    /// their [`SyncResult`].
    #[instrument(skip(self, config, group_names), fields(filtered = group_names.is_some()))]
    pub async fn run(
        &self,
        config: &CoreConfig,
        dry_run: bool,
        group_names: Option<&[String]>,
    ) -> Result<Vec<SyncResult>> {
        let _guard = self.run_lock.lock().await;

        validate_config(config)?;
        let target_root = config.target_root();

        if !dry_run {
            tokio::fs::create_dir_all(&target_root)
                .await
                .map_err(|e| SyncError::filesystem(&target_root, e))?;
        }

        info!(target = %target_root.display(), "Starting sync");
        if let Some(translation) = config.path_translation() {
            info!(from = %translation.server_root, to = %translation.host_root, "Path translation active");
        }

        let mut libraries = self.plan_libraries(config).await;

        let ctx = RunContext {
            config,
            dry_run,
            covers: self.cover_store.clone().unwrap_or_else(|| {
                Arc::new(DirectoryCoverStore::new(config.legacy_cover_dir.clone()))
            }),
            reconciler: Reconciler::from_config(config),
            snapshot: RunSnapshot::new(Arc::clone(&self.library)),
            target_root,
        };

        let mut results = Vec::new();
        for grouping in self.groupings(config, group_names) {
            let result = self.sync_grouping(&ctx, &grouping, libraries.as_mut()).await;
            results.push(result);
        }

        let failed = results.iter().filter(|r| r.is_failed()).count();
        info!(groupings = results.len(), failed, "Sync finished");
        Ok(results)
    }

    /// Remove symlinks under the target root whose target no longer exists.
    ///
    /// # Returns
    ///
    /// Number of links removed. A missing target root yields zero.
    #[instrument(skip(self, config))]
    pub async fn cleanup_broken_symlinks(&self, config: &CoreConfig) -> Result<usize> {
        let _guard = self.run_lock.lock().await;

        let target_path = config.target_path.trim();
        if target_path.is_empty() {
            info!("Cleanup skipped: no target path configured");
            return Ok(0);
        }

        Ok(reconciler::sweep_broken_symlinks(Path::new(target_path)).await)
    }

    /// Resolve items for an ad-hoc filter without touching the filesystem.
    ///
    /// Values containing operator tokens are evaluated as rule expressions
    /// against the full catalog; anything else is a plain filter query.
    /// Unknown field names query unfiltered.
    #[instrument(skip(self))]
    pub async fn preview(
        &self,
        field: &str,
        value: &str,
        watch_state: WatchState,
    ) -> Result<Vec<CatalogItem>> {
        let field = MetadataField::parse(field);

        if rules::is_expression(value) {
            let rules = rules::parse_expression(value, field.unwrap_or(MetadataField::Genre));
            let catalog = self.library.fetch_snapshot().await?;
            let mut items: Vec<CatalogItem> = catalog
                .into_iter()
                .filter(|item| rules::evaluate(&rules, item))
                .collect();
            watch_state.retain(&mut items);
            return Ok(items);
        }

        let mut query = CatalogQuery::all().with_watch_state(watch_state);
        if let Some(field) = field {
            query = query.with_filter(field, value);
        }
        Ok(self.library.query_items(&query).await?)
    }

    fn groupings(&self, config: &CoreConfig, group_names: Option<&[String]>) -> Vec<Grouping> {
        config
            .groups
            .iter()
            .filter_map(|record| match Grouping::from_record(record) {
                Ok(grouping) => Some(grouping),
                Err(e) => {
                    warn!(error = %e, "Skipping invalid grouping record");
                    None
                }
            })
            .filter(|grouping| {
                group_names.map_or(true, |names| names.iter().any(|n| n.trim() == grouping.name))
            })
            .collect()
    }

    async fn plan_libraries(&self, config: &CoreConfig) -> Option<LibraryPlan> {
        if !config.auto_create_libraries {
            return None;
        }
        let manager = self.library_manager.clone()?;

        match manager.list_libraries().await {
            Ok(existing) => {
                info!(count = existing.len(), "Found existing libraries");
                Some(LibraryPlan { manager, existing })
            }
            Err(e) => {
                warn!(error = %e, "Could not list libraries, library creation disabled for this run");
                None
            }
        }
    }

    #[instrument(skip_all, fields(grouping = %grouping.name))]
    async fn sync_grouping(
        &self,
        ctx: &RunContext<'_>,
        grouping: &Grouping,
        libraries: Option<&mut LibraryPlan>,
    ) -> SyncResult {
        let group_dir = ctx.target_root.join(&grouping.name);

        if !grouping.in_season(self.clock.as_ref()) {
            info!("Grouping is out of season");
            if !ctx.dry_run {
                if let Err(e) = reconciler::remove_group_dir(&group_dir).await {
                    warn!(error = %e, "Failed to remove out-of-season directory");
                }
            }
            return SyncResult::out_of_season(&grouping.name);
        }

        let items = match self.resolve_items(grouping, ctx).await {
            Ok(items) => items,
            Err(e) => {
                match &e {
                    SyncError::Library(_) => error!(error = %e, "Failed to resolve grouping"),
                    _ => warn!(error = %e, "Failed to resolve grouping"),
                }
                return SyncResult::failed(&grouping.name, &e);
            }
        };
        debug!(items = items.len(), "Resolved grouping items");

        if ctx.dry_run {
            let preview = ctx.reconciler.preview(&items, &grouping.sort_order).await;
            info!(links = preview.links, "Would create symlinks");
            return SyncResult::completed(&grouping.name, preview.links).with_preview(preview.items);
        }

        if let Err(e) = reconciler::prepare_group_dir(&group_dir).await {
            error!(error = %e, "Failed to prepare group directory");
            return SyncResult::failed(&grouping.name, &e);
        }

        let cover = ctx.covers.cover_path(&grouping.name, &ctx.target_root);
        if let Some(cover) = &cover {
            reconciler::copy_poster(cover, &group_dir).await;
        }

        let links = ctx
            .reconciler
            .materialize(&group_dir, &items, &grouping.sort_order)
            .await;
        info!(links, "Created symlinks");

        let mut result = SyncResult::completed(&grouping.name, links);

        if let Some(plan) = libraries {
            if links > 0 {
                result.library_error = self.ensure_library(plan, ctx, grouping, &group_dir).await;
            }
        }

        if ctx.config.auto_set_library_covers {
            if let Some(cover) = &cover {
                self.push_cover(&grouping.name, cover).await;
            }
        }

        result
    }

    async fn resolve_items(
        &self,
        grouping: &Grouping,
        ctx: &RunContext<'_>,
    ) -> Result<Vec<CatalogItem>> {
        let credentials = &ctx.config.credentials;

        match &grouping.source {
            SourceKind::MetadataFilter(field) => {
                let mut query = CatalogQuery::all()
                    .with_watch_state(grouping.watch_state)
                    .with_sort_order(&grouping.sort_order);
                if let Some(field) = field {
                    query = query.with_filter(*field, grouping.source_value.as_str());
                }
                Ok(ctx.snapshot.query(&query).await?)
            }
            SourceKind::Expression(rules) => {
                let catalog = ctx.snapshot.items().await?;
                if rules.is_empty() {
                    return Ok(Vec::new());
                }
                let mut matched: Vec<CatalogItem> = catalog
                    .iter()
                    .filter(|item| rules::evaluate(rules, item))
                    .cloned()
                    .collect();
                grouping.watch_state.retain(&mut matched);
                Ok(apply_sort_order(matched, &grouping.sort_order))
            }
            SourceKind::ExternalList(ListProvider::Recommendations) => {
                let ids = self.fetch_recommendations(grouping, credentials).await?;
                self.match_ids(ListProvider::Recommendations, &ids, grouping, ctx).await
            }
            SourceKind::ExternalList(provider) => {
                let provider = *provider;
                provider
                    .require_credential(credentials)
                    .map_err(|e| SyncError::fetch(provider, e))?;

                let ids = self
                    .list_fetchers
                    .get(provider)
                    .map_err(|e| SyncError::fetch(provider, e))?
                    .fetch(&grouping.source_value, credentials)
                    .await
                    .map_err(|e| SyncError::fetch(provider, e))?;
                info!(provider = %provider, ids = ids.len(), "Fetched external list");

                self.match_ids(provider, &ids, grouping, ctx).await
            }
        }
    }

    async fn fetch_recommendations(
        &self,
        grouping: &Grouping,
        credentials: &ProviderCredentials,
    ) -> Result<Vec<ExternalId>> {
        let provider = ListProvider::Recommendations;
        provider
            .require_credential(credentials)
            .map_err(|e| SyncError::fetch(provider, e))?;

        let user_id = grouping.source_value.trim();
        if user_id.is_empty() {
            return Err(SyncError::InvalidSource(
                "User ID must be selected for recommendations".to_string(),
            ));
        }

        let recent = self
            .recent_activity
            .recent_items(user_id, RECOMMENDATION_SEED_LIMIT)
            .await?;

        let seeds: Vec<RecommendationSeed> = recent
            .iter()
            .filter_map(|item| {
                let tmdb_id = item.provider_ids.get(provider_keys::TMDB)?;
                let media_type = MediaType::from_item_type(item.item_type.as_deref()?)?;
                Some(RecommendationSeed {
                    tmdb_id: tmdb_id.to_string(),
                    media_type,
                })
            })
            .collect();

        if seeds.is_empty() {
            info!(user_id = %user_id, "No TMDb ids among recent items");
            return Ok(Vec::new());
        }

        let ids = self
            .recommendations
            .recommend(&seeds, credentials)
            .await
            .map_err(|e| SyncError::fetch(provider, e))?;
        info!(seeds = seeds.len(), ids = ids.len(), "Fetched recommendations");
        Ok(ids)
    }

    async fn match_ids(
        &self,
        provider: ListProvider,
        ids: &[ExternalId],
        grouping: &Grouping,
        ctx: &RunContext<'_>,
    ) -> Result<Vec<CatalogItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let catalog = ctx.snapshot.items().await?;
        let items = resolve(
            provider,
            ids,
            &catalog,
            &grouping.sort_order,
            grouping.watch_state,
        );
        Ok(apply_sort_order(items, &grouping.sort_order))
    }

    async fn ensure_library(
        &self,
        plan: &mut LibraryPlan,
        ctx: &RunContext<'_>,
        grouping: &Grouping,
        group_dir: &Path,
    ) -> Option<String> {
        if plan.existing.iter().any(|name| name == &grouping.name) {
            return None;
        }

        let server_root = ctx.config.target_path_in_server.trim();
        let path = if server_root.is_empty() {
            group_dir.to_string_lossy().into_owned()
        } else {
            format!("{}/{}", server_root.trim_end_matches('/'), grouping.name)
        };

        match plan.manager.create_library(&grouping.name, &path).await {
            Ok(()) => {
                info!(path = %path, "Created library");
                plan.existing.push(grouping.name.clone());
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to create library");
                Some(e.to_string())
            }
        }
    }

    async fn push_cover(&self, name: &str, cover: &Path) {
        let Some(manager) = &self.library_manager else {
            return;
        };

        let image = match tokio::fs::read(cover).await {
            Ok(data) => Bytes::from(data),
            Err(e) => {
                warn!(cover = %cover.display(), error = %e, "Failed to read cover image");
                return;
            }
        };

        if let Err(e) = manager
            .set_library_cover(name, image, covers::content_type(cover))
            .await
        {
            warn!(error = %e, "Failed to set library cover");
        }
    }
}

fn validate_config(config: &CoreConfig) -> Result<()> {
    config.validate().map_err(|e| match e {
        core_runtime::Error::Config(message) => SyncError::Configuration(message),
        other => SyncError::Runtime(other),
    })
}
