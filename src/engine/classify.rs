//! Response classification
//!
//! Decides per lane whether a response carried data or exhausted the lane,
//! and whether the round as a whole must be retried.

use super::types::{LaneVerdict, RoundOutcome, RoundResult};
use crate::error::{Error, Result};
use crate::lanes::LaneSet;
use crate::types::Record;

/// Status that signals a lane ran past the last page
pub const EXHAUSTED_STATUS: u16 = 404;

/// Longest body excerpt carried in a status error
const BODY_EXCERPT: usize = 512;

/// Fail the round if any lane got a status outside 2xx other than 404
///
/// One bad lane invalidates the whole round so every active lane is retried
/// together.
pub fn check_statuses(round: &RoundResult) -> Result<()> {
    for response in round.responses() {
        let status = response.status;
        if !(200..300).contains(&status) && status != EXHAUSTED_STATUS {
            let body = String::from_utf8_lossy(&response.body);
            let excerpt: String = body.chars().take(BODY_EXCERPT).collect();
            return Err(Error::response_status(response.lane, status, excerpt));
        }
    }
    Ok(())
}

/// Classify one lane response
///
/// Only a 200 whose body is a non-empty JSON array yields records. A 404,
/// any other 2xx, an empty body, invalid JSON, a non-array body or an empty
/// array all exhaust the lane.
pub fn classify_response(status: u16, body: &[u8]) -> LaneVerdict {
    if status != 200 {
        return LaneVerdict::Exhausted;
    }

    match serde_json::from_slice::<Vec<Record>>(body) {
        Ok(records) if !records.is_empty() => LaneVerdict::Data(records),
        _ => LaneVerdict::Exhausted,
    }
}

/// Classify a whole round against the lanes it was dispatched for
///
/// Produces the records to buffer and a new lane set holding only the
/// lanes that returned data, each advanced by the lane stride. The input
/// lane set is left untouched.
pub fn classify(lanes: &LaneSet, round: RoundResult) -> Result<RoundOutcome> {
    let mut records = Vec::new();
    let mut next = LaneSet::empty(lanes.stride());
    let mut exhausted = Vec::new();

    for response in round {
        let request = lanes.get(response.lane).ok_or_else(|| {
            Error::contract(format!(
                "response for lane {} which is not active",
                response.lane
            ))
        })?;

        match classify_response(response.status, &response.body) {
            LaneVerdict::Data(lane_records) => {
                records.extend(lane_records);
                // a lane without a cursor cannot move on, so one page is all it has
                match request.advanced(lanes.stride())? {
                    Some(advanced) => next.insert(response.lane, advanced),
                    None => exhausted.push(response.lane),
                }
            }
            LaneVerdict::Exhausted => exhausted.push(response.lane),
        }
    }

    Ok(RoundOutcome {
        records,
        next,
        exhausted,
    })
}
