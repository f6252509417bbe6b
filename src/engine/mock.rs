//! Scripted transport for engine and pager tests

use crate::error::{Error, Result};
use crate::http::Transport;
use crate::lanes::LaneRequest;
use crate::types::RawResponse;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Answers lane requests from per-page scripts
///
/// Each page has a queue of responses; calls pop from the front until one
/// response is left, which then keeps answering. Unscripted pages answer
/// 404. Requests without a cursor are keyed as page 0.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    pages: Mutex<HashMap<u64, VecDeque<RawResponse>>>,
    connection_failures: AtomicU32,
    calls: Mutex<Vec<u64>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a 200 response with the given JSON body for a page
    pub(crate) fn page(self, page: u64, body: Value) -> Self {
        self.respond(page, RawResponse::json(&body))
    }

    /// Queue an arbitrary response for a page
    pub(crate) fn respond(self, page: u64, response: RawResponse) -> Self {
        self.pages
            .lock()
            .unwrap()
            .entry(page)
            .or_default()
            .push_back(response);
        self
    }

    /// Fail the next `count` fetches with a connection error
    pub(crate) fn fail_next(self, count: u32) -> Self {
        self.connection_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Pages requested so far, in dispatch order
    pub(crate) fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, request: &LaneRequest) -> Result<RawResponse> {
        let page = request.cursor()?.unwrap_or(0);
        self.calls.lock().unwrap().push(page);

        let failed = self
            .connection_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Error::connection("connection reset by peer"));
        }

        let mut pages = self.pages.lock().unwrap();
        let response = match pages.get_mut(&page) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(RawResponse::not_found))
    }
}
