//! External list sources and their identifiers.

use crate::error::{ProviderError, Result};
use core_library::provider_keys;
use core_runtime::config::ProviderCredentials;
use serde::{Deserialize, Serialize};
use std::fmt;

/// External source a grouping can pull a ranked id list from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListProvider {
    Imdb,
    Trakt,
    Tmdb,
    AniList,
    MyAnimeList,
    Letterboxd,
    Recommendations,
}

/// How a provider's ids are looked up in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKey {
    /// A single provider-id key (`"Imdb"`, `"Tmdb"`, ...)
    Provider(&'static str),
    /// `tt…` ids match on IMDb, anything else on TMDb
    ImdbOrTmdb,
}

impl ListProvider {
    pub const ALL: [ListProvider; 7] = [
        ListProvider::Imdb,
        ListProvider::Trakt,
        ListProvider::Tmdb,
        ListProvider::AniList,
        ListProvider::MyAnimeList,
        ListProvider::Letterboxd,
        ListProvider::Recommendations,
    ];

    /// Parse a grouping `source_type` (`imdb_list`, `recommendations`, ...).
    pub fn from_source_type(source_type: &str) -> Option<Self> {
        let source_type = source_type.trim();
        Self::ALL
            .into_iter()
            .find(|provider| provider.source_type() == source_type)
    }

    pub fn source_type(&self) -> &'static str {
        match self {
            ListProvider::Imdb => "imdb_list",
            ListProvider::Trakt => "trakt_list",
            ListProvider::Tmdb => "tmdb_list",
            ListProvider::AniList => "anilist_list",
            ListProvider::MyAnimeList => "mal_list",
            ListProvider::Letterboxd => "letterboxd_list",
            ListProvider::Recommendations => "recommendations",
        }
    }

    /// Sort-order sentinel that preserves this provider's list order.
    pub fn list_order_sentinel(&self) -> &'static str {
        match self {
            ListProvider::Imdb => "imdb_list_order",
            ListProvider::Trakt => "trakt_list_order",
            ListProvider::Tmdb => "tmdb_list_order",
            ListProvider::AniList => "anilist_list_order",
            ListProvider::MyAnimeList => "mal_list_order",
            ListProvider::Letterboxd => "letterboxd_list_order",
            ListProvider::Recommendations => "recommendations_list_order",
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ListProvider::Imdb => "IMDb",
            ListProvider::Trakt => "Trakt",
            ListProvider::Tmdb => "TMDb",
            ListProvider::AniList => "AniList",
            ListProvider::MyAnimeList => "MAL",
            ListProvider::Letterboxd => "Letterboxd",
            ListProvider::Recommendations => "Recommendations",
        }
    }

    pub fn match_key(&self) -> MatchKey {
        match self {
            ListProvider::Imdb | ListProvider::Trakt => MatchKey::Provider(provider_keys::IMDB),
            ListProvider::Tmdb | ListProvider::Recommendations => {
                MatchKey::Provider(provider_keys::TMDB)
            }
            ListProvider::AniList => MatchKey::Provider(provider_keys::ANILIST),
            ListProvider::MyAnimeList => MatchKey::Provider(provider_keys::MAL),
            ListProvider::Letterboxd => MatchKey::ImdbOrTmdb,
        }
    }

    /// The credential this provider needs, or a `MissingCredential` error.
    ///
    /// Returns `Ok(None)` for providers that need no credential.
    pub fn require_credential<'a>(
        &self,
        credentials: &'a ProviderCredentials,
    ) -> Result<Option<&'a str>> {
        let (value, name, setting) = match self {
            ListProvider::Trakt => (
                credentials.trakt_client_id(),
                "Trakt Client ID",
                "trakt_client_id",
            ),
            ListProvider::Tmdb | ListProvider::Recommendations => (
                credentials.tmdb_api_key(),
                "TMDb API key",
                "tmdb_api_key",
            ),
            ListProvider::MyAnimeList => (
                credentials.mal_client_id(),
                "MyAnimeList Client ID",
                "mal_client_id",
            ),
            ListProvider::Imdb | ListProvider::AniList | ListProvider::Letterboxd => {
                return Ok(None)
            }
        };

        value
            .map(Some)
            .ok_or(ProviderError::MissingCredential { name, setting })
    }
}

impl fmt::Display for ListProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Provider-typed external identifier (`"tt0111161"`, `"603"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// IMDb title ids start with `tt`.
    pub fn is_imdb_style(&self) -> bool {
        self.0.starts_with("tt")
    }
}

impl From<&str> for ExternalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ExternalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
