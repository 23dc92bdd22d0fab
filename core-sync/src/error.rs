use core_library::LibraryError;
use core_providers::{ListProvider, ProviderError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{0}")]
    Configuration(String),

    #[error("Invalid grouping: {0}")]
    InvalidGrouping(String),

    /// Missing provider credential, reported verbatim
    #[error("{0}")]
    Credential(ProviderError),

    #[error("{provider} fetch error: {source}")]
    Fetch {
        provider: ListProvider,
        #[source]
        source: ProviderError,
    },

    #[error("{0}")]
    InvalidSource(String),

    #[error("Jellyfin connection error: {0}")]
    Library(#[from] LibraryError),

    #[error("Failed to prepare {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

impl SyncError {
    /// Wrap a provider failure; missing credentials keep their own message.
    pub fn fetch(provider: ListProvider, source: ProviderError) -> Self {
        if source.is_missing_credential() {
            SyncError::Credential(source)
        } else {
            SyncError::Fetch { provider, source }
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
