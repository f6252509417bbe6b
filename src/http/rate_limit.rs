//! Request rate limiting
//!
//! Every lane request takes one token from a shared bucket before it is
//! sent. When a round has more lanes than the bucket holds, the surplus
//! requests wait for refills instead of hitting the API together.

use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Request budget of the HTTP transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests that may go out back to back
    pub burst_size: u32,
}

impl RateLimiterConfig {
    /// Create a budget from a rate and a burst size
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Budget whose burst covers one full round of `lanes` requests
    pub fn for_lanes(requests_per_second: u32, lanes: usize) -> Self {
        let lanes = u32::try_from(lanes).unwrap_or(u32::MAX);
        Self::new(requests_per_second, requests_per_second.max(lanes))
    }

    /// Zero values count as one
    fn quota(&self) -> Quota {
        let rate = NonZeroU32::MIN.saturating_add(self.requests_per_second.saturating_sub(1));
        let burst = NonZeroU32::MIN.saturating_add(self.burst_size.saturating_sub(1));
        Quota::per_second(rate).allow_burst(burst)
    }
}

/// Token bucket shared by every request of a transport
///
/// Clones draw from the same bucket.
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<DefaultDirectRateLimiter>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    /// Create a limiter with a full bucket
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            bucket: Arc::new(governor::RateLimiter::direct(config.quota())),
            config: *config,
        }
    }

    /// Wait for a token
    pub async fn acquire(&self) {
        self.bucket.until_ready().await;
    }

    /// Take a token if one is available right now
    pub fn try_acquire(&self) -> bool {
        self.bucket.check().is_ok()
    }

    /// The budget this limiter enforces
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("requests_per_second", &self.config.requests_per_second)
            .field("burst_size", &self.config.burst_size)
            .finish()
    }
}
