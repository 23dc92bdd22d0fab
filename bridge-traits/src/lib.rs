//! # Host Bridge Traits
//!
//! Capability traits the synchronization core requires from its host.
//!
//! ## Overview
//!
//! This crate defines the contract between the core crates and host-specific
//! implementations. The core never talks to the network or the wall clock
//! directly; it goes through the traits below so that tests can substitute
//! deterministic doubles.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with bounded retry
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for seasonal gating and deterministic testing
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop / server | `bridge-desktop` | ✅ In Progress |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Host
//! implementations should:
//!
//! - Convert host-specific errors to `BridgeError`
//! - Preserve the HTTP status when a server answered with a non-2xx code
//! - Include error context (URL without secrets, file path)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so a single implementation
//! can be shared across the scheduler and API-triggered runs.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use time::{Clock, FixedClock, LogLevel, SystemClock};
