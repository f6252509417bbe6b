//! HTTP transport module
//!
//! Provides the `Transport` seam the engine fetches through and an HTTP
//! implementation of it.
//!
//! # Features
//!
//! - **Concurrent batches**: `batch_fetch` drives every lane request at once
//!   and waits for all of them
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Status passthrough**: HTTP statuses are returned, never raised

mod client;
mod rate_limit;
mod transport;

pub use client::{HttpClientConfig, HttpClientConfigBuilder, HttpTransport};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::Transport;

#[cfg(test)]
mod tests;
