//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the groupings core:
//! - Logging and tracing infrastructure
//! - Configuration model and fail-fast validation
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions and the shape of the configuration
//! object every synchronization run reads fresh.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, ProviderCredentials, SchedulerSettings};
pub use error::{Error, Result};
