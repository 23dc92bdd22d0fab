//! # Core Configuration Module
//!
//! Provides the configuration model for the groupings core.
//!
//! ## Overview
//!
//! `CoreConfig` mirrors the persisted JSON configuration object. It is read
//! fresh on every synchronization run and never mutated by the core. Reading
//! and writing the file itself belongs to the host; this module only parses a
//! JSON document (accepting legacy key names) and validates it.
//!
//! Grouping records are kept as raw JSON values here. `core-sync` validates
//! them one by one so that a single malformed record is skipped instead of
//! rejecting the whole configuration.
//!
//! ## Usage
//!
//! ### Builder with fail-fast validation
//!
//! ```
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .server_url("http://jellyfin:8096/")
//!     .api_key("secret")
//!     .target_path("/data/groupings")
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.base_url(), "http://jellyfin:8096");
//! ```
//!
//! ### Parsing the persisted document
//!
//! ```
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::from_json_str(
//!     r#"{"jellyfin_url": "http://jf:8096", "api_key": "k", "target_path": "/g"}"#,
//! ).unwrap();
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Error Handling
//!
//! Missing server URL, API key or target path is a configuration error that
//! aborts a run before any grouping is processed:
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .server_url("http://jellyfin:8096")
//!     .build()
//!     .expect("Should fail - missing api key and target path");
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Message used for every missing-core-setting error.
const NOT_CONFIGURED: &str = "Server settings or target path not configured";

/// Configuration for the groupings core.
///
/// Field names follow the persisted JSON document. Legacy aliases
/// (`jellyfin_url`, `media_path_in_jellyfin`, `jellyfin_root`, `host_root`,
/// `target_path_in_jellyfin`) are accepted when parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Media server base URL
    #[serde(alias = "jellyfin_url")]
    pub server_url: String,

    /// Media server API key
    pub api_key: String,

    /// Root directory under which grouping directories are materialized
    pub target_path: String,

    /// Media path prefix as the media server reports it
    #[serde(alias = "media_path_in_jellyfin")]
    pub media_path_in_server: String,

    /// Equivalent media path prefix on this host
    pub media_path_on_host: String,

    /// `target_path` as the media server sees it (for library creation)
    #[serde(alias = "target_path_in_jellyfin")]
    pub target_path_in_server: String,

    /// External provider credentials
    #[serde(flatten)]
    pub credentials: ProviderCredentials,

    /// Create a media server library for each grouping that gained links
    pub auto_create_libraries: bool,

    /// Push grouping covers to the media server libraries
    pub auto_set_library_covers: bool,

    /// Fallback directory searched for covers uploaded by older releases
    pub legacy_cover_dir: Option<PathBuf>,

    /// Raw grouping records
    pub groups: Vec<serde_json::Value>,

    /// Schedule settings consumed by the scheduler
    pub scheduler: SchedulerSettings,

    #[serde(skip_serializing)]
    jellyfin_root: Option<String>,

    #[serde(skip_serializing)]
    host_root: Option<String>,
}

/// Credentials for external list providers.
///
/// Every field may be empty; a grouping that needs a missing credential fails
/// on its own without affecting other groupings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCredentials {
    pub trakt_client_id: String,
    pub tmdb_api_key: String,
    pub mal_client_id: String,
}

impl ProviderCredentials {
    fn non_empty(value: &str) -> Option<&str> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn trakt_client_id(&self) -> Option<&str> {
        Self::non_empty(&self.trakt_client_id)
    }

    pub fn tmdb_api_key(&self) -> Option<&str> {
        Self::non_empty(&self.tmdb_api_key)
    }

    pub fn mal_client_id(&self) -> Option<&str> {
        Self::non_empty(&self.mal_client_id)
    }
}

/// Schedule settings.
///
/// Cron expressions are opaque strings here; the host scheduler parses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub global_enabled: bool,
    pub global_schedule: String,
    /// Grouping names excluded from the global job
    #[serde(alias = "global_exclude_ids")]
    pub global_exclude: Vec<String>,
    pub cleanup_enabled: bool,
    pub cleanup_schedule: String,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            global_enabled: false,
            global_schedule: "0 0 * * *".to_string(),
            global_exclude: Vec::new(),
            cleanup_enabled: true,
            cleanup_schedule: "0 * * * *".to_string(),
        }
    }
}

/// Prefix pair used to rewrite server-side media paths to host paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTranslation {
    pub server_root: String,
    pub host_root: String,
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Parse the persisted JSON document.
    ///
    /// Parsing does not validate; call [`validate`](Self::validate) before a run.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid configuration document: {}", e)))
    }

    /// Validates the settings every run needs.
    pub fn validate(&self) -> Result<()> {
        if self.base_url().is_empty()
            || self.api_key.trim().is_empty()
            || self.target_path.trim().is_empty()
        {
            return Err(Error::Config(NOT_CONFIGURED.to_string()));
        }
        Ok(())
    }

    /// Server URL without surrounding whitespace or trailing slashes.
    pub fn base_url(&self) -> &str {
        self.server_url.trim().trim_end_matches('/')
    }

    pub fn target_root(&self) -> PathBuf {
        PathBuf::from(self.target_path.trim())
    }

    /// Path translation roots, when both sides are configured.
    ///
    /// New key names win over their legacy aliases.
    pub fn path_translation(&self) -> Option<PathTranslation> {
        let pick = |current: &str, legacy: &Option<String>| {
            let current = current.trim();
            if !current.is_empty() {
                return current.to_string();
            }
            legacy.as_deref().unwrap_or("").trim().to_string()
        };

        let server_root = pick(&self.media_path_in_server, &self.jellyfin_root);
        let host_root = pick(&self.media_path_on_host, &self.host_root);

        if server_root.is_empty() || host_root.is_empty() {
            return None;
        }
        Some(PathTranslation {
            server_root,
            host_root,
        })
    }

    /// Trimmed, non-empty names of all grouping records, in config order.
    pub fn group_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter_map(|group| group.get("name").and_then(|name| name.as_str()))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and produce the
/// final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn target_path(mut self, path: impl Into<String>) -> Self {
        self.config.target_path = path.into();
        self
    }

    /// Sets both path translation roots.
    pub fn path_translation(
        mut self,
        media_path_in_server: impl Into<String>,
        media_path_on_host: impl Into<String>,
    ) -> Self {
        self.config.media_path_in_server = media_path_in_server.into();
        self.config.media_path_on_host = media_path_on_host.into();
        self
    }

    pub fn target_path_in_server(mut self, path: impl Into<String>) -> Self {
        self.config.target_path_in_server = path.into();
        self
    }

    pub fn trakt_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.credentials.trakt_client_id = client_id.into();
        self
    }

    pub fn tmdb_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.credentials.tmdb_api_key = api_key.into();
        self
    }

    pub fn mal_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.credentials.mal_client_id = client_id.into();
        self
    }

    pub fn auto_create_libraries(mut self, enabled: bool) -> Self {
        self.config.auto_create_libraries = enabled;
        self
    }

    pub fn auto_set_library_covers(mut self, enabled: bool) -> Self {
        self.config.auto_set_library_covers = enabled;
        self
    }

    pub fn legacy_cover_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.legacy_cover_dir = Some(dir.into());
        self
    }

    /// Appends one raw grouping record.
    pub fn group(mut self, record: serde_json::Value) -> Self {
        self.config.groups.push(record);
        self
    }

    pub fn scheduler(mut self, scheduler: SchedulerSettings) -> Self {
        self.config.scheduler = scheduler;
        self
    }

    /// Builds the final configuration, failing fast on missing core settings.
    pub fn build(self) -> Result<CoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> CoreConfigBuilder {
        CoreConfig::builder()
            .server_url("http://jellyfin:8096/")
            .api_key("key")
            .target_path("/data/groupings")
    }

    #[test]
    fn test_builder_strips_trailing_slash() {
        let config = minimal().build().unwrap();
        assert_eq!(config.base_url(), "http://jellyfin:8096");
        assert_eq!(config.target_root(), PathBuf::from("/data/groupings"));
    }

    #[test]
    fn test_missing_core_settings_fail() {
        for builder in [
            CoreConfig::builder().api_key("k").target_path("/t"),
            CoreConfig::builder().server_url("http://s").target_path("/t"),
            CoreConfig::builder().server_url("http://s").api_key("k"),
            CoreConfig::builder()
                .server_url("  ")
                .api_key("k")
                .target_path("/t"),
        ] {
            match builder.build() {
                Err(Error::Config(message)) => assert_eq!(message, NOT_CONFIGURED),
                other => panic!("expected config error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_path_translation_requires_both_roots() {
        let config = minimal().path_translation("/media", "").build().unwrap();
        assert!(config.path_translation().is_none());

        let config = minimal()
            .path_translation("/media", "/mnt/media")
            .build()
            .unwrap();
        assert_eq!(
            config.path_translation(),
            Some(PathTranslation {
                server_root: "/media".to_string(),
                host_root: "/mnt/media".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_accepts_legacy_keys() {
        let config = CoreConfig::from_json_str(
            r#"{
                "jellyfin_url": "http://jf:8096",
                "api_key": "k",
                "target_path": "/g",
                "jellyfin_root": "/media",
                "host_root": "/srv/media",
                "target_path_in_jellyfin": "/groupings",
                "tmdb_api_key": " tmdb ",
                "scheduler": {"global_enabled": true, "global_exclude_ids": ["Kids"]}
            }"#,
        )
        .unwrap();

        assert_eq!(config.base_url(), "http://jf:8096");
        assert_eq!(config.target_path_in_server, "/groupings");
        assert_eq!(config.credentials.tmdb_api_key(), Some("tmdb"));
        assert_eq!(config.credentials.trakt_client_id(), None);
        assert!(config.scheduler.global_enabled);
        assert_eq!(config.scheduler.global_exclude, vec!["Kids".to_string()]);
        // Defaults fill in the rest of the nested object
        assert_eq!(config.scheduler.cleanup_schedule, "0 * * * *");
        assert_eq!(
            config.path_translation().map(|t| t.host_root),
            Some("/srv/media".to_string())
        );
    }

    #[test]
    fn test_new_keys_win_over_legacy_keys() {
        let config = CoreConfig::from_json_str(
            r#"{"media_path_in_jellyfin": "/new", "jellyfin_root": "/old",
                "media_path_on_host": "/host"}"#,
        )
        .unwrap();
        assert_eq!(
            config.path_translation().map(|t| t.server_root),
            Some("/new".to_string())
        );
    }

    #[test]
    fn test_invalid_document_is_config_error() {
        assert!(matches!(
            CoreConfig::from_json_str("{not json"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_group_names_skip_blank_and_non_string() {
        let config = minimal()
            .group(json!({"name": " Action "}))
            .group(json!({"name": ""}))
            .group(json!({"name": 42}))
            .group(json!("not an object"))
            .group(json!({"name": "Noir"}))
            .build()
            .unwrap();

        assert_eq!(config.group_names(), vec!["Action", "Noir"]);
    }

    #[test]
    fn test_scheduler_defaults() {
        let settings = SchedulerSettings::default();
        assert!(!settings.global_enabled);
        assert_eq!(settings.global_schedule, "0 0 * * *");
        assert!(settings.cleanup_enabled);
    }
}
