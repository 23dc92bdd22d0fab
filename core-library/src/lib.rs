//! # Catalog Module
//!
//! Owns the normalized view of the media server's catalog.
//!
//! ## Overview
//!
//! This module manages:
//! - Catalog item models, provider ids and watch state
//! - The sort-order table and filtered catalog queries
//! - The ordering engine used for in-memory sorts
//! - Snapshot provider traits and the run-scoped snapshot
//! - The virtual library collaborator used to expose grouping directories

pub mod error;
pub mod libraries;
pub mod models;
pub mod ordering;
pub mod query;
pub mod snapshot;

pub use error::{LibraryError, Result};
pub use libraries::VirtualLibraryManager;
pub use models::{provider_keys, CatalogItem, MetadataField, Person, ProviderIds, WatchState};
pub use ordering::{apply_sort_order, sort_items};
pub use query::{CatalogQuery, MetadataFilter, SortDirection, SortField, SortOrder};
pub use snapshot::{LibrarySnapshotProvider, RecentActivityProvider, RunSnapshot};
