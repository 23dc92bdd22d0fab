//! Lookup of grouping cover images.
//!
//! Covers are uploaded by an outer layer. This module only resolves where a
//! cover for a grouping lives, if anywhere.

use md5::{Digest, Md5};
use std::path::{Path, PathBuf};

/// Directory under the target root holding uploaded covers.
pub const COVERS_DIR: &str = ".covers";

/// File name a cover gets inside a grouping directory.
pub const POSTER_FILE: &str = "poster.jpg";

/// Resolves the cover image for a grouping.
pub trait CoverStore: Send + Sync {
    fn cover_path(&self, group_name: &str, target_root: &Path) -> Option<PathBuf>;
}

/// Covers stored as `<target_root>/.covers/<md5(name)>.jpg`, with an
/// optional legacy directory searched second.
#[derive(Debug, Clone, Default)]
pub struct DirectoryCoverStore {
    legacy_dir: Option<PathBuf>,
}

impl DirectoryCoverStore {
    pub fn new(legacy_dir: Option<PathBuf>) -> Self {
        Self { legacy_dir }
    }

    pub fn file_name(group_name: &str) -> String {
        let digest = Md5::digest(group_name.as_bytes());
        let hex: String = digest.iter().map(|byte| format!("{:02x}", byte)).collect();
        format!("{}.jpg", hex)
    }
}

impl CoverStore for DirectoryCoverStore {
    fn cover_path(&self, group_name: &str, target_root: &Path) -> Option<PathBuf> {
        let file_name = Self::file_name(group_name);

        std::iter::once(target_root.join(COVERS_DIR))
            .chain(self.legacy_dir.clone())
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }
}

/// MIME type guessed from the image extension.
pub fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_name_is_md5_hex_digest() {
        assert_eq!(
            DirectoryCoverStore::file_name("abc"),
            "900150983cd24fb0d6963f7d28e17f72.jpg"
        );
        assert_eq!(
            DirectoryCoverStore::file_name(""),
            "d41d8cd98f00b204e9800998ecf8427e.jpg"
        );
        assert_ne!(
            DirectoryCoverStore::file_name("Noir"),
            DirectoryCoverStore::file_name("noir")
        );
    }

    #[test]
    fn test_target_root_wins_over_legacy() {
        let target = TempDir::new().unwrap();
        let legacy = TempDir::new().unwrap();
        let file_name = DirectoryCoverStore::file_name("Noir");

        std::fs::write(legacy.path().join(&file_name), b"old").unwrap();
        let store = DirectoryCoverStore::new(Some(legacy.path().to_path_buf()));
        assert_eq!(
            store.cover_path("Noir", target.path()),
            Some(legacy.path().join(&file_name))
        );

        std::fs::create_dir(target.path().join(COVERS_DIR)).unwrap();
        std::fs::write(target.path().join(COVERS_DIR).join(&file_name), b"new").unwrap();
        assert_eq!(
            store.cover_path("Noir", target.path()),
            Some(target.path().join(COVERS_DIR).join(&file_name))
        );
    }

    #[test]
    fn test_missing_cover() {
        let target = TempDir::new().unwrap();
        let store = DirectoryCoverStore::default();
        assert_eq!(store.cover_path("Noir", target.path()), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a.PNG")), "image/png");
        assert_eq!(content_type(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(content_type(Path::new("a")), "image/jpeg");
    }
}
