//! Engine types
//!
//! Results of one fetch round and of classifying it.

use crate::lanes::LaneSet;
use crate::types::Record;
use bytes::Bytes;

/// One lane's answer within a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneResponse {
    /// Lane the request was dispatched for
    pub lane: usize,
    /// HTTP status code
    pub status: u16,
    /// Undecoded body
    pub body: Bytes,
}

/// All responses of one round, in dispatch order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundResult {
    responses: Vec<LaneResponse>,
}

impl RoundResult {
    /// Create a round result from lane responses in dispatch order
    pub fn new(responses: Vec<LaneResponse>) -> Self {
        Self { responses }
    }

    /// Responses in dispatch order
    pub fn responses(&self) -> &[LaneResponse] {
        &self.responses
    }

    /// Number of lanes that answered
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// True if no lane was dispatched
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl IntoIterator for RoundResult {
    type Item = LaneResponse;
    type IntoIter = std::vec::IntoIter<LaneResponse>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.into_iter()
    }
}

/// What a single lane response means for its lane
#[derive(Debug, Clone, PartialEq)]
pub enum LaneVerdict {
    /// Records to buffer; the lane moves on to its next page
    Data(Vec<Record>),
    /// The lane has no more pages
    Exhausted,
}

impl LaneVerdict {
    /// Check if the lane is exhausted
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// Classified round: records to buffer and the lanes for the next round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    /// Records in lane dispatch order, body order within a lane
    pub records: Vec<Record>,
    /// Lanes still active, cursors advanced
    pub next: LaneSet,
    /// Lanes removed in this round
    pub exhausted: Vec<usize>,
}
