//! # Jellyfin Provider
//!
//! Implements the catalog and library collaborator traits for the Jellyfin
//! REST API.
//!
//! ## Overview
//!
//! This module provides:
//! - Full library snapshots for rule and external-list matching
//! - Filtered, server-sorted catalog queries
//! - Recently played items for recommendation seeds
//! - Virtual library creation and cover upload

pub mod connector;
pub mod error;
pub mod types;

pub use connector::JellyfinConnector;
pub use error::{JellyfinError, Result};
