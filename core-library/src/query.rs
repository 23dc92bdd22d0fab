//! Catalog query and sort-order model.
//!
//! Sort orders come from grouping configuration as free strings. Field sorts
//! map to a fixed table of server-side `SortBy`/`SortOrder` pairs; the
//! `<source>_list_order` sentinels ask for the external list's own order.

use crate::models::{MetadataField, WatchState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix shared by every "keep the external order" sentinel.
pub const LIST_ORDER_SUFFIX: &str = "_list_order";

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "Ascending",
            SortDirection::Descending => "Descending",
        }
    }
}

/// Field sorts known to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    CommunityRating,
    ProductionYear,
    SortName,
    DateCreated,
    Random,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::CommunityRating,
        SortField::ProductionYear,
        SortField::SortName,
        SortField::DateCreated,
        SortField::Random,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CommunityRating => "CommunityRating",
            SortField::ProductionYear => "ProductionYear",
            SortField::SortName => "SortName",
            SortField::DateCreated => "DateCreated",
            SortField::Random => "Random",
        }
    }

    /// Server-side `(SortBy, SortOrder)` parameters.
    ///
    /// Compound keys list secondary tiebreaks; only a data source that sorts
    /// server-side applies them.
    pub fn server_params(&self) -> (&'static str, &'static str) {
        match self {
            SortField::CommunityRating => ("CommunityRating", "Descending"),
            SortField::ProductionYear => ("ProductionYear,SortName", "Descending,Ascending"),
            SortField::SortName => ("SortName", "Ascending"),
            SortField::DateCreated => ("DateCreated", "Descending"),
            SortField::Random => ("Random", "Ascending"),
        }
    }

    /// Direction of the primary key, used by the in-memory sort.
    pub fn primary_direction(&self) -> SortDirection {
        match self {
            SortField::CommunityRating | SortField::ProductionYear | SortField::DateCreated => {
                SortDirection::Descending
            }
            SortField::SortName | SortField::Random => SortDirection::Ascending,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order requested by a grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// No ordering; links keep their bare file names
    #[default]
    Unset,
    /// Field sort from the fixed table
    Field(SortField),
    /// Preserve external list order; holds the full sentinel (`imdb_list_order`)
    ListOrder(String),
    /// Unrecognized value: nothing is sorted, but links are still numbered
    Other(String),
}

impl SortOrder {
    /// Parse a configured value. Unrecognized non-empty values become
    /// [`SortOrder::Other`].
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return SortOrder::Unset;
        }
        if let Some(field) = SortField::parse(value) {
            return SortOrder::Field(field);
        }
        if value.ends_with(LIST_ORDER_SUFFIX) && value.len() > LIST_ORDER_SUFFIX.len() {
            return SortOrder::ListOrder(value.to_string());
        }
        SortOrder::Other(value.to_string())
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, SortOrder::Other(_))
    }

    /// Any explicit order, which turns on numbered link names.
    pub fn is_set(&self) -> bool {
        !matches!(self, SortOrder::Unset)
    }

    pub fn field(&self) -> Option<SortField> {
        match self {
            SortOrder::Field(field) => Some(*field),
            _ => None,
        }
    }

    /// Whether this is the list-order sentinel for the given source key.
    pub fn is_list_order_for(&self, sentinel: &str) -> bool {
        matches!(self, SortOrder::ListOrder(value) if value == sentinel)
    }

    pub fn as_str(&self) -> &str {
        match self {
            SortOrder::Unset => "",
            SortOrder::Field(field) => field.as_str(),
            SortOrder::ListOrder(value) | SortOrder::Other(value) => value,
        }
    }
}

/// Single-field metadata filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFilter {
    pub field: MetadataField,
    pub value: String,
}

/// Filtered, optionally sorted catalog request pushed to the data source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub filter: Option<MetadataFilter>,
    pub watch_state: WatchState,
    pub sort: Option<SortField>,
}

impl CatalogQuery {
    /// Unfiltered query over all movies and series.
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds a filter; blank values leave the query unfiltered.
    pub fn with_filter(mut self, field: MetadataField, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.filter = Some(MetadataFilter {
                field,
                value: value.trim().to_string(),
            });
        }
        self
    }

    pub fn with_watch_state(mut self, watch_state: WatchState) -> Self {
        self.watch_state = watch_state;
        self
    }

    /// Only field sorts are pushed down; list-order sentinels are ignored.
    pub fn with_sort_order(mut self, sort_order: &SortOrder) -> Self {
        self.sort = sort_order.field();
        self
    }
}
