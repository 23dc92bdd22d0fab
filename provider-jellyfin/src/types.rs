//! Jellyfin API response types
//!
//! Data structures for deserializing Jellyfin REST responses. Jellyfin uses
//! PascalCase keys and omits most fields that were not requested through
//! `Fields=`, so nearly everything defaults.

use chrono::{DateTime, Utc};
use core_library::{CatalogItem, Person, ProviderIds};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `/Items` and `/Users/{id}/Items` response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsResponse {
    /// Missing on some error-shaped bodies; treated as empty
    #[serde(default)]
    pub items: Vec<BaseItem>,
}

/// Jellyfin item resource (movie or series)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BaseItem {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// `Movie`, `Series`, ...
    #[serde(default, rename = "Type")]
    pub item_type: Option<String>,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub provider_ids: HashMap<String, Option<String>>,

    #[serde(default)]
    pub genres: Vec<String>,

    #[serde(default)]
    pub studios: Vec<NameEntry>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub people: Vec<PersonEntry>,

    #[serde(default)]
    pub production_year: Option<i32>,

    #[serde(default)]
    pub community_rating: Option<f64>,

    #[serde(default)]
    pub sort_name: Option<String>,

    /// RFC 3339
    #[serde(default)]
    pub date_created: Option<String>,

    #[serde(default)]
    pub user_data: Option<UserData>,
}

/// Studio reference
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameEntry {
    #[serde(default)]
    pub name: String,
}

/// Cast or crew member
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersonEntry {
    #[serde(default)]
    pub name: String,

    /// `Actor`, `Director`, ...
    #[serde(default, rename = "Type")]
    pub kind: Option<String>,
}

/// Per-user playback state
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserData {
    #[serde(default)]
    pub played: bool,
}

/// `/Library/VirtualFolders` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VirtualFolder {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub item_id: Option<String>,
}

/// Body of `POST /Library/VirtualFolders/Paths`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddPathRequest<'a> {
    pub name: &'a str,
    pub path: &'a str,
}

impl From<BaseItem> for CatalogItem {
    fn from(item: BaseItem) -> Self {
        let provider_ids: ProviderIds = item
            .provider_ids
            .into_iter()
            .filter_map(|(provider, id)| id.map(|id| (provider, id)))
            .collect();

        CatalogItem {
            id: item.id,
            name: item.name,
            item_type: item.item_type,
            path: item.path,
            provider_ids,
            genres: item.genres,
            studios: item.studios.into_iter().map(|studio| studio.name).collect(),
            tags: item.tags,
            people: item
                .people
                .into_iter()
                .map(|person| Person {
                    name: person.name,
                    role: person.kind,
                })
                .collect(),
            production_year: item.production_year,
            community_rating: item.community_rating,
            sort_name: item.sort_name,
            date_created: item
                .date_created
                .as_deref()
                .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            played: item.user_data.map(|data| data.played).unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_full_item() {
        let body = r#"{
            "Id": "abc",
            "Name": "Heat",
            "Type": "Movie",
            "Path": "/media/movies/Heat (1995)/Heat.mkv",
            "ProviderIds": {"Imdb": "tt0113277", "Tmdb": "949", "Tvdb": null},
            "Genres": ["Action", "Crime"],
            "Studios": [{"Name": "Warner Bros.", "Id": "s1"}],
            "Tags": ["heist"],
            "People": [
                {"Name": "Al Pacino", "Type": "Actor", "Role": "Vincent Hanna"},
                {"Name": "Michael Mann", "Type": "Director"}
            ],
            "ProductionYear": 1995,
            "CommunityRating": 8.3,
            "SortName": "heat",
            "DateCreated": "2023-04-01T12:00:00.0000000Z",
            "UserData": {"Played": true, "PlayCount": 2}
        }"#;

        let item: CatalogItem = serde_json::from_str::<BaseItem>(body).unwrap().into();

        assert_eq!(item.id, "abc");
        assert_eq!(item.item_type.as_deref(), Some("Movie"));
        assert_eq!(item.provider_ids.get("Imdb"), Some("tt0113277"));
        assert_eq!(item.provider_ids.get("Tvdb"), None);
        assert_eq!(item.studios, vec!["Warner Bros."]);
        assert!(item.people[0].is_actor());
        assert!(!item.people[1].is_actor());
        assert_eq!(item.production_year, Some(1995));
        assert_eq!(item.community_rating, Some(8.3));
        assert!(item.date_created.is_some());
        assert!(item.played);
    }

    #[test]
    fn test_sparse_item_defaults() {
        let item: CatalogItem = serde_json::from_str::<BaseItem>(r#"{"Id": "x", "Path": "/m/x.mkv"}"#)
            .unwrap()
            .into();

        assert_eq!(item.media_path(), Some("/m/x.mkv"));
        assert!(item.provider_ids.is_empty());
        assert!(!item.played);
        assert_eq!(item.community_rating, None);
    }

    #[test]
    fn test_items_key_may_be_missing() {
        let response: ItemsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.items.is_empty());
    }
}
