//! Directory reconciliation for grouping symlinks.
//!
//! ## Overview
//!
//! Each grouping owns one directory under the target root. Reconciliation is
//! wipe-and-recreate: the directory is removed, recreated empty and filled
//! with one symlink per resolved item, so running twice with the same input
//! produces the same directory.
//!
//! ## Link names
//!
//! The link name is the file name of the item's host path. When the grouping
//! has any sort order, names get a zero-padded position prefix
//! (`0001 - Heat.mkv`) so a lexical listing shows the intended order. The
//! position counts every resolved item, including ones skipped for a missing
//! path, so numbering can have gaps.
//!
//! ## Failure policy
//!
//! Only preparing the group directory can fail a grouping. Items without a
//! path, items whose host path does not exist and individual symlink
//! failures are logged and skipped.

use crate::covers::POSTER_FILE;
use crate::error::{Result, SyncError};
use crate::result::{PreviewItem, PREVIEW_LIMIT};
use core_library::{CatalogItem, SortOrder};
use core_runtime::config::{CoreConfig, PathTranslation};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Minimum width of the numeric link prefix.
const MIN_PREFIX_WIDTH: usize = 4;

/// A link the reconciler would create.
struct PlannedLink<'a> {
    item: &'a CatalogItem,
    file_name: String,
    target: PathBuf,
}

/// Outcome of [`Reconciler::preview`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preview {
    pub links: usize,
    pub items: Vec<PreviewItem>,
}

/// Materializes resolved items as symlinks.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    translation: Option<PathTranslation>,
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

impl Reconciler {
    pub fn new(translation: Option<PathTranslation>) -> Self {
        Self { translation }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.path_translation())
    }

    /// Rewrite a server-side path to the host, when it lies under the
    /// server root. Other paths are returned unchanged.
    pub fn translate(&self, path: &str) -> PathBuf {
        let Some(translation) = &self.translation else {
            return PathBuf::from(path);
        };

        let normalized = normalize_separators(path);
        let server_root = normalize_separators(&translation.server_root);
        match Path::new(&normalized).strip_prefix(Path::new(&server_root)) {
            Ok(relative) => {
                let translated = Path::new(&translation.host_root).join(relative);
                debug!(from = %path, to = %translated.display(), "Translated path");
                translated
            }
            Err(_) => PathBuf::from(path),
        }
    }

    /// Link name for the item at 1-based `position` out of `total`.
    pub fn link_name(file_name: &str, position: usize, total: usize, numbered: bool) -> String {
        if !numbered {
            return file_name.to_string();
        }
        let width = total.to_string().len().max(MIN_PREFIX_WIDTH);
        format!("{:0width$} - {}", position, file_name, width = width)
    }

    async fn plan<'a>(&self, items: &'a [CatalogItem], sort_order: &SortOrder) -> Vec<PlannedLink<'a>> {
        let numbered = sort_order.is_set();
        let mut planned = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let Some(source_path) = item.media_path() else {
                debug!(item_id = %item.id, "Item has no path, skipping");
                continue;
            };

            let target = self.translate(source_path);
            if !fs::try_exists(&target).await.unwrap_or(false) {
                warn!(item_id = %item.id, path = %target.display(), "Path not found on host, skipping");
                continue;
            }

            let Some(base_name) = target.file_name().and_then(|name| name.to_str()) else {
                warn!(item_id = %item.id, path = %target.display(), "Path has no file name, skipping");
                continue;
            };

            planned.push(PlannedLink {
                item,
                file_name: Self::link_name(base_name, index + 1, items.len(), numbered),
                target,
            });
        }

        planned
    }

    /// Count and describe the links a run would create, without touching
    /// the filesystem.
    pub async fn preview(&self, items: &[CatalogItem], sort_order: &SortOrder) -> Preview {
        let planned = self.plan(items, sort_order).await;
        Preview {
            links: planned.len(),
            items: planned
                .iter()
                .take(PREVIEW_LIMIT)
                .map(|link| PreviewItem::new(link.item, link.file_name.clone()))
                .collect(),
        }
    }

    /// Create one symlink per item in `group_dir`, which should be empty.
    ///
    /// Returns the number of links created.
    pub async fn materialize(
        &self,
        group_dir: &Path,
        items: &[CatalogItem],
        sort_order: &SortOrder,
    ) -> usize {
        let mut created = 0;

        for link in self.plan(items, sort_order).await {
            let dest = group_dir.join(&link.file_name);
            match symlink(&link.target, &dest).await {
                Ok(()) => {
                    debug!(link = %dest.display(), target = %link.target.display(), "Created symlink");
                    created += 1;
                }
                Err(e) => {
                    warn!(link = %dest.display(), error = %e, "Failed to create symlink");
                }
            }
        }

        created
    }
}

#[cfg(unix)]
async fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    fs::symlink(target, link).await
}

#[cfg(windows)]
async fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    if fs::metadata(target).await?.is_dir() {
        fs::symlink_dir(target, link).await
    } else {
        fs::symlink_file(target, link).await
    }
}

/// Remove `group_dir` if present, then recreate it empty.
pub async fn prepare_group_dir(group_dir: &Path) -> Result<()> {
    remove_group_dir(group_dir).await?;
    fs::create_dir_all(group_dir)
        .await
        .map_err(|e| SyncError::filesystem(group_dir, e))
}

/// Remove `group_dir` recursively. Returns whether anything was removed.
pub async fn remove_group_dir(group_dir: &Path) -> Result<bool> {
    let removal = match fs::symlink_metadata(group_dir).await {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(group_dir).await,
        Ok(_) => fs::remove_file(group_dir).await,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => Err(e),
    };
    removal.map_err(|e| SyncError::filesystem(group_dir, e))?;

    debug!(path = %group_dir.display(), "Removed group directory");
    Ok(true)
}

/// Copy a cover into `group_dir` as the poster. Failures are logged only.
pub async fn copy_poster(cover: &Path, group_dir: &Path) -> bool {
    let dest = group_dir.join(POSTER_FILE);
    match fs::copy(cover, &dest).await {
        Ok(_) => {
            debug!(cover = %cover.display(), "Copied cover image");
            true
        }
        Err(e) => {
            warn!(cover = %cover.display(), error = %e, "Failed to copy cover image");
            false
        }
    }
}

/// Delete every symlink under `root` whose target no longer exists.
///
/// A missing or non-directory root is not an error and yields zero.
pub async fn sweep_broken_symlinks(root: &Path) -> usize {
    let root = root.to_path_buf();
    match tokio::task::spawn_blocking(move || sweep_blocking(&root)).await {
        Ok(removed) => removed,
        Err(e) => {
            warn!(error = %e, "Broken symlink sweep did not complete");
            0
        }
    }
}

fn sweep_blocking(root: &Path) -> usize {
    if !root.is_dir() {
        info!(path = %root.display(), "Cleanup skipped: target path is not a directory");
        return 0;
    }

    let mut removed = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Failed to read directory entry during cleanup");
                continue;
            }
        };

        if !entry.path_is_symlink() || entry.path().exists() {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!(path = %entry.path().display(), "Deleted broken symlink");
                removed += 1;
            }
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Failed to delete broken symlink");
            }
        }
    }

    info!(removed, "Broken symlink sweep finished");
    removed
}
