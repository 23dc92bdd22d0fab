//! Per-grouping outcome of a synchronization run.

use crate::error::SyncError;
use core_library::CatalogItem;
use serde::Serialize;

/// Maximum number of items carried in a dry-run preview.
pub const PREVIEW_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Completed,
    OutOfSeason,
    Failed,
}

/// Class of a grouping-scoped failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// External list, recommendation or credential problem
    Fetch,
    /// Library snapshot or catalog query failure
    Infrastructure,
    /// Group directory could not be prepared
    Filesystem,
}

impl ErrorKind {
    pub fn of(error: &SyncError) -> Self {
        match error {
            SyncError::Library(_) | SyncError::Runtime(_) | SyncError::Configuration(_) => {
                ErrorKind::Infrastructure
            }
            SyncError::Filesystem { .. } => ErrorKind::Filesystem,
            SyncError::Credential(_)
            | SyncError::Fetch { .. }
            | SyncError::InvalidSource(_)
            | SyncError::InvalidGrouping(_) => ErrorKind::Fetch,
        }
    }
}

/// One line of a dry-run preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreviewItem {
    pub name: String,
    pub year: Option<i32>,
    pub file_name: String,
}

impl PreviewItem {
    pub fn new(item: &CatalogItem, file_name: impl Into<String>) -> Self {
        Self {
            name: item.name.clone(),
            year: item.production_year,
            file_name: file_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncResult {
    pub name: String,
    pub links_created: usize,
    pub status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Dry-run only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<PreviewItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_error: Option<String>,
}

impl SyncResult {
    pub fn completed(name: impl Into<String>, links_created: usize) -> Self {
        Self {
            name: name.into(),
            links_created,
            status: SyncStatus::Completed,
            error: None,
            error_kind: None,
            items: None,
            library_error: None,
        }
    }

    pub fn out_of_season(name: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::OutOfSeason,
            ..Self::completed(name, 0)
        }
    }

    pub fn failed(name: impl Into<String>, error: &SyncError) -> Self {
        Self {
            status: SyncStatus::Failed,
            error: Some(error.to_string()),
            error_kind: Some(ErrorKind::of(error)),
            ..Self::completed(name, 0)
        }
    }

    pub fn with_preview(mut self, items: Vec<PreviewItem>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == SyncStatus::Failed
    }
}
