//! Media-server libraries backed by grouping directories.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Creates and decorates the server-side libraries that expose grouping
/// directories.
#[async_trait]
pub trait VirtualLibraryManager: Send + Sync {
    /// Names of the libraries the server already has.
    async fn list_libraries(&self) -> Result<Vec<String>>;

    /// Create a mixed-content library named `name` over `path`, a directory as
    /// the server sees it, then trigger a library scan.
    ///
    /// A library that already exists is not an error.
    async fn create_library(&self, name: &str, path: &str) -> Result<()>;

    /// Upload `image` as the primary image of the library named `name`.
    async fn set_library_cover(&self, name: &str, image: Bytes, content_type: &str) -> Result<()>;
}
