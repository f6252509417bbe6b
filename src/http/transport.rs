//! Transport abstraction
//!
//! The engine only needs one thing from the network: turn a batch of lane
//! requests into a batch of raw responses. HTTP error statuses are data at
//! this layer; only I/O failures are errors.

use crate::error::Result;
use crate::lanes::LaneRequest;
use crate::types::RawResponse;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

/// Fetches lane requests from the remote API
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a single lane request
    ///
    /// Must return `Ok` for every HTTP status and fail only with a transient
    /// error kind when the request could not be completed.
    async fn fetch(&self, request: &LaneRequest) -> Result<RawResponse>;

    /// Fetch all requests concurrently
    ///
    /// Waits for every request to complete before returning. Responses are
    /// positional: `responses[i]` answers `requests[i]`. If any request
    /// failed, the first failure in request order is returned.
    async fn batch_fetch(&self, requests: &[LaneRequest]) -> Result<Vec<RawResponse>> {
        join_all(requests.iter().map(|request| self.fetch(request)))
            .await
            .into_iter()
            .collect()
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn fetch(&self, request: &LaneRequest) -> Result<RawResponse> {
        (**self).fetch(request).await
    }

    async fn batch_fetch(&self, requests: &[LaneRequest]) -> Result<Vec<RawResponse>> {
        (**self).batch_fetch(requests).await
    }
}
