//! Domain models for the media catalog
//!
//! A [`CatalogItem`] is the normalized view of one media server entry. Items
//! are immutable once fetched; every synchronization run works on its own
//! snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Provider identifiers
// =============================================================================

/// Well-known provider id keys as the media server reports them.
pub mod provider_keys {
    pub const IMDB: &str = "Imdb";
    pub const TMDB: &str = "Tmdb";
    pub const ANILIST: &str = "AniList";
    pub const MAL: &str = "Mal";
}

/// External ids attached to a catalog item, keyed by provider name.
///
/// Keys are compared exactly (`"Imdb"`, `"Tmdb"`, ...). Empty values are
/// treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderIds(HashMap<String, String>);

impl ProviderIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, provider: impl Into<String>, id: impl Into<String>) -> Self {
        self.insert(provider, id);
        self
    }

    pub fn insert(&mut self, provider: impl Into<String>, id: impl Into<String>) {
        self.0.insert(provider.into(), id.into());
    }

    pub fn get(&self, provider: &str) -> Option<&str> {
        self.0
            .get(provider)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(String::is_empty)
    }
}

impl FromIterator<(String, String)> for ProviderIds {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Catalog model
// =============================================================================

/// A credited person on a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    /// Credit role as reported by the server ("Actor", "Director", ...)
    pub role: Option<String>,
}

impl Person {
    pub fn actor(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Some("Actor".to_string()),
        }
    }

    pub fn is_actor(&self) -> bool {
        self.role.as_deref() == Some("Actor")
    }
}

/// Normalized media server entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Media server item id
    pub id: String,
    /// Display name
    pub name: String,
    /// Item kind as reported by the server ("Movie", "Series")
    pub item_type: Option<String>,
    /// Absolute path as the media server sees it
    pub path: Option<String>,
    pub provider_ids: ProviderIds,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
    pub tags: Vec<String>,
    pub people: Vec<Person>,
    pub production_year: Option<i32>,
    pub community_rating: Option<f64>,
    pub sort_name: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    /// Whether the querying user has watched the item
    pub played: bool,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    pub fn with_provider_id(mut self, provider: &str, id: impl Into<String>) -> Self {
        self.provider_ids.insert(provider, id);
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.production_year = Some(year);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.community_rating = Some(rating);
        self
    }

    pub fn with_played(mut self, played: bool) -> Self {
        self.played = played;
        self
    }

    /// Usable filesystem path, if the server reported a non-empty one.
    pub fn media_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|path| !path.trim().is_empty())
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Metadata field usable in catalog filters and rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataField {
    Genre,
    Actor,
    Studio,
    Tag,
    Year,
}

impl MetadataField {
    pub const ALL: [MetadataField; 5] = [
        MetadataField::Genre,
        MetadataField::Actor,
        MetadataField::Studio,
        MetadataField::Tag,
        MetadataField::Year,
    ];

    /// Case-insensitive parse of `genre`, `actor`, `studio`, `tag`, `year`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(value))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataField::Genre => "genre",
            MetadataField::Actor => "actor",
            MetadataField::Studio => "studio",
            MetadataField::Tag => "tag",
            MetadataField::Year => "year",
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Watch-state restriction applied after matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchState {
    #[default]
    Any,
    Watched,
    Unwatched,
}

impl WatchState {
    /// Unknown or empty values mean no restriction.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "watched" => WatchState::Watched,
            "unwatched" => WatchState::Unwatched,
            _ => WatchState::Any,
        }
    }

    pub fn admits(&self, item: &CatalogItem) -> bool {
        match self {
            WatchState::Any => true,
            WatchState::Watched => item.played,
            WatchState::Unwatched => !item.played,
        }
    }

    /// Keep only items admitted by this state, preserving order.
    pub fn retain(&self, items: &mut Vec<CatalogItem>) {
        if *self != WatchState::Any {
            items.retain(|item| self.admits(item));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_ids_ignore_empty_values() {
        let ids = ProviderIds::new()
            .with(provider_keys::IMDB, "tt0111161")
            .with(provider_keys::TMDB, "");

        assert_eq!(ids.get("Imdb"), Some("tt0111161"));
        assert_eq!(ids.get("Tmdb"), None);
        assert_eq!(ids.get("imdb"), None);
        assert!(!ids.is_empty());
        assert!(ProviderIds::new().with("Tmdb", "").is_empty());
    }

    #[test]
    fn test_only_actor_role_is_actor() {
        assert!(Person::actor("Tom Hanks").is_actor());
        let director = Person {
            name: "Nora Ephron".to_string(),
            role: Some("Director".to_string()),
        };
        assert!(!director.is_actor());
    }

    #[test]
    fn test_media_path_rejects_blank() {
        assert_eq!(CatalogItem::new("1", "A").media_path(), None);
        assert_eq!(CatalogItem::new("1", "A").with_path("  ").media_path(), None);
        assert_eq!(
            CatalogItem::new("1", "A").with_path("/m/a.mkv").media_path(),
            Some("/m/a.mkv")
        );
    }

    #[test]
    fn test_metadata_field_parse() {
        assert_eq!(MetadataField::parse("Genre"), Some(MetadataField::Genre));
        assert_eq!(MetadataField::parse(" YEAR "), Some(MetadataField::Year));
        assert_eq!(MetadataField::parse("director"), None);
    }

    #[test]
    fn test_watch_state_filtering() {
        let mut items = vec![
            CatalogItem::new("1", "Seen").with_played(true),
            CatalogItem::new("2", "Unseen"),
        ];

        WatchState::parse("unwatched").retain(&mut items);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "2");

        assert_eq!(WatchState::parse(""), WatchState::Any);
        assert_eq!(WatchState::parse("Watched"), WatchState::Watched);
    }
}
