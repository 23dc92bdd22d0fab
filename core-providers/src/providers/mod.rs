//! External List Providers
//!
//! HTTP clients for the list services that have a fetcher in this crate:
//! - TMDb - public lists and recommendations
//! - Trakt - user lists
//!
//! Each client implements [`ExternalListFetcher`](crate::fetcher::ExternalListFetcher)
//! and bounds pagination and request time. Failures are never retried.

pub mod tmdb;
pub mod trakt;

pub use tmdb::TmdbClient;
pub use trakt::{TraktClient, TraktList};
