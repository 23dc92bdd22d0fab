//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! using desktop-appropriate libraries:
//! - `HttpClient` using `reqwest`
//!
//! The clock bridge needs no adapter here; `bridge_traits::SystemClock`
//! already reads the host time.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use bridge_traits::{HttpClient, RetryPolicy};
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new()
//!         .expect("http client")
//!         .with_retry_policy(RetryPolicy::no_retry());
//!
//!     // Use in core configuration
//! }
//! ```

mod http;

pub use http::ReqwestHttpClient;
