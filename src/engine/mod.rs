//! Execution engine module
//!
//! One fetch round: dispatch every active lane, classify the answers,
//! retry the whole round on transient failure.
//!
//! # Overview
//!
//! The engine module provides:
//! - `execute_round` - concurrent fan-out/fan-in over the active lanes
//! - `check_statuses` / `classify` - the response classifier
//! - `RetryController` - bounded, fixed-delay round retries
//! - `run_round` - all of the above composed

mod classify;
mod retry;
mod types;

pub use classify::{check_statuses, classify, classify_response, EXHAUSTED_STATUS};
pub use retry::{RetryController, RetryPolicy};
pub use types::{LaneResponse, LaneVerdict, RoundOutcome, RoundResult};

use crate::error::{Error, Result};
use crate::http::Transport;
use crate::lanes::LaneSet;
use tracing::debug;

/// Dispatch one request per active lane and wait for all of them
///
/// Individual HTTP error statuses are returned in the result. The round
/// fails only if the transport itself fails or breaks the one-response-per
/// -request contract.
pub async fn execute_round<T: Transport + ?Sized>(
    transport: &T,
    lanes: &LaneSet,
) -> Result<RoundResult> {
    if lanes.is_empty() {
        return Err(Error::contract("round dispatched with no active lanes"));
    }

    let requests = lanes.requests();
    let responses = transport.batch_fetch(&requests).await?;
    if responses.len() != requests.len() {
        return Err(Error::contract(format!(
            "transport returned {} responses for {} requests",
            responses.len(),
            requests.len()
        )));
    }

    let responses = lanes
        .indices()
        .into_iter()
        .zip(responses)
        .map(|(lane, raw)| LaneResponse {
            lane,
            status: raw.status,
            body: raw.body,
        })
        .collect();

    Ok(RoundResult::new(responses))
}

/// Run one round to completion under the retry controller
///
/// Each attempt re-dispatches every lane in `lanes`; no cursor moves until
/// an attempt passes the status check.
pub async fn run_round<T: Transport + ?Sized>(
    transport: &T,
    controller: &RetryController,
    lanes: &LaneSet,
) -> Result<RoundOutcome> {
    let round = controller
        .run(|attempt| async move {
            debug!(attempt, lanes = lanes.len(), "dispatching round");
            let round = execute_round(transport, lanes).await?;
            check_statuses(&round)?;
            Ok(round)
        })
        .await?;

    classify(lanes, round)
}

#[cfg(test)]
pub(crate) mod mock;
