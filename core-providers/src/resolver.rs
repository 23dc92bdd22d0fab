//! # Provider Resolver
//!
//! Maps external ids onto catalog items.
//!
//! ## Overview
//!
//! The catalog is indexed by one provider-id key. Keys are lower-cased for
//! IMDb only; every other provider compares exactly. When several items share
//! a key the last one seen wins, while the key keeps the position where it
//! first appeared.
//!
//! Two modes:
//!
//! - **List order** (the grouping asked for the provider's `_list_order`
//!   sentinel): walk the external ids in order and emit each match.
//!   Unmatched ids are dropped; nothing is reordered.
//! - **Set**: emit matched items in index order and leave ordering to the
//!   ordering engine.
//!
//! Letterboxd lists mix IMDb (`tt…`) and TMDb ids. Each id is looked up in
//! the index its shape calls for. In set mode the merged result is
//! deduplicated by catalog item id, keeping first-seen order.

use crate::list::{ExternalId, ListProvider, MatchKey};
use core_library::{provider_keys, CatalogItem, SortOrder, WatchState};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Catalog index over one provider-id key.
pub struct ProviderIndex<'a> {
    case_insensitive: bool,
    positions: HashMap<String, usize>,
    entries: Vec<(String, &'a CatalogItem)>,
}

impl<'a> ProviderIndex<'a> {
    pub fn build(catalog: &'a [CatalogItem], provider_key: &str) -> Self {
        let case_insensitive = provider_key == provider_keys::IMDB;
        let mut index = Self {
            case_insensitive,
            positions: HashMap::new(),
            entries: Vec::new(),
        };

        for item in catalog {
            let Some(id) = item.provider_ids.get(provider_key) else {
                continue;
            };
            let key = index.normalize(id);
            match index.positions.get(&key) {
                Some(&position) => index.entries[position].1 = item,
                None => {
                    index.positions.insert(key.clone(), index.entries.len());
                    index.entries.push((key, item));
                }
            }
        }

        index
    }

    fn normalize(&self, id: &str) -> String {
        if self.case_insensitive {
            id.to_lowercase()
        } else {
            id.to_string()
        }
    }

    pub fn get(&self, id: &str) -> Option<&'a CatalogItem> {
        self.positions
            .get(&self.normalize(id))
            .map(|&position| self.entries[position].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Items whose key is in `ids`, in index order.
    fn intersect(&self, ids: &[ExternalId]) -> Vec<&'a CatalogItem> {
        let wanted: HashSet<String> = ids.iter().map(|id| self.normalize(id.as_str())).collect();
        self.entries
            .iter()
            .filter(|(key, _)| wanted.contains(key))
            .map(|(_, item)| *item)
            .collect()
    }
}

/// Resolve `external_ids` from `provider` against `catalog`.
///
/// The watch-state filter is applied last and preserves order.
pub fn resolve(
    provider: ListProvider,
    external_ids: &[ExternalId],
    catalog: &[CatalogItem],
    sort_order: &SortOrder,
    watch_state: WatchState,
) -> Vec<CatalogItem> {
    let list_order = sort_order.is_list_order_for(provider.list_order_sentinel());

    let matched: Vec<&CatalogItem> = match provider.match_key() {
        MatchKey::Provider(key) => {
            let index = ProviderIndex::build(catalog, key);
            if list_order {
                external_ids
                    .iter()
                    .filter_map(|id| index.get(id.as_str()))
                    .collect()
            } else {
                index.intersect(external_ids)
            }
        }
        MatchKey::ImdbOrTmdb => resolve_mixed(external_ids, catalog),
    };

    debug!(
        provider = %provider,
        requested = external_ids.len(),
        matched = matched.len(),
        list_order,
        "Resolved external ids against catalog"
    );

    let mut items: Vec<CatalogItem> = matched.into_iter().cloned().collect();
    watch_state.retain(&mut items);
    items
}

/// Ids of either shape, merged in list order. An item reached through both
/// its IMDb and TMDb id is kept once, at its first position.
fn resolve_mixed<'a>(external_ids: &[ExternalId], catalog: &'a [CatalogItem]) -> Vec<&'a CatalogItem> {
    let imdb = ProviderIndex::build(catalog, provider_keys::IMDB);
    let tmdb = ProviderIndex::build(catalog, provider_keys::TMDB);

    let mut seen = HashSet::new();
    external_ids
        .iter()
        .filter_map(|id| {
            if id.is_imdb_style() {
                imdb.get(id.as_str())
            } else {
                tmdb.get(id.as_str())
            }
        })
        .filter(|item| seen.insert(item.id.as_str()))
        .collect()
}
