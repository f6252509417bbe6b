//! Pager module
//!
//! A lazy, forward-only sequence of records over a paginated entity.
//!
//! # Overview
//!
//! `LanePager` keeps a FIFO buffer of decoded records. When the buffer runs
//! dry it runs one fetch round across all active lanes (retrying the round
//! on transient failure) and refills the buffer with that round's records.
//! No read-ahead happens beyond the current round: a caller that stops
//! pulling stops all fetching.
//!
//! End of sequence is an explicit state, separate from record content, so
//! `null`, `0` or `{}` records are yielded like any other.

use crate::config::PagerConfig;
use crate::engine::{run_round, RetryController};
use crate::entity::Entity;
use crate::error::Result;
use crate::http::Transport;
use crate::lanes::{LaneRequest, LaneSet};
use crate::types::{Record, StringMap};
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Lane-partitioned iterator over one entity
pub struct LanePager<E, T> {
    entity: E,
    transport: T,
    config: PagerConfig,
    query_params: StringMap,
    controller: RetryController,
    /// Caller-supplied lanes a traversal starts from
    preset_lanes: Option<LaneSet>,
    /// Lanes for the next round, built on first fetch
    lanes: Option<LaneSet>,
    buffer: VecDeque<Record>,
    current: Option<Record>,
    key: u64,
    next_key: u64,
    round_count: u64,
    started: bool,
    finished: bool,
}

impl<E: Entity, T: Transport> LanePager<E, T> {
    /// Create a pager for `entity` fetching through `transport`
    ///
    /// Entity default params are merged under the configured query params.
    pub fn new(entity: E, transport: T, config: PagerConfig) -> Result<Self> {
        config.validate()?;

        let mut query_params = entity.default_params();
        query_params.extend(config.query_params.clone());
        let controller = RetryController::new(config.retry_policy());

        Ok(Self {
            entity,
            transport,
            config,
            query_params,
            controller,
            preset_lanes: None,
            lanes: None,
            buffer: VecDeque::new(),
            current: None,
            key: 0,
            next_key: 0,
            round_count: 0,
            started: false,
            finished: false,
        })
    }

    /// Abort retry waits when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.controller = self.controller.with_cancellation(token);
        self
    }

    /// The entity being iterated
    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// The transport requests go through
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Pager configuration
    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    /// Token that aborts retry waits
    pub fn cancellation_token(&self) -> &CancellationToken {
        self.controller.cancellation_token()
    }

    // ========================================================================
    // Query parameters
    // ========================================================================

    /// Base query parameters of every lane request
    pub fn query_params(&self) -> &StringMap {
        &self.query_params
    }

    /// Replace the base query parameters
    ///
    /// Takes effect when lanes are next built, i.e. on the first fetch or
    /// after [`rewind`](Self::rewind).
    pub fn set_query_params(&mut self, params: StringMap) {
        self.query_params = params;
    }

    /// Merge query parameters into the base set, overriding existing keys
    pub fn add_query_params<I, K, V>(&mut self, params: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    // ========================================================================
    // Lanes
    // ========================================================================

    /// Start traversals from caller-supplied lane requests
    ///
    /// Every request must target this pager's entity and carry a positive
    /// integer cursor, and no two requests may walk the same pages at a
    /// stride of `count_lanes`; anything else is a contract error and leaves
    /// the current lanes in place. An empty list goes back to lanes built
    /// from configuration.
    pub fn set_lanes(&mut self, requests: Vec<LaneRequest>) -> Result<()> {
        if requests.is_empty() {
            self.preset_lanes = None;
        } else {
            self.preset_lanes = Some(LaneSet::from_requests(
                requests,
                self.entity.entity(),
                self.config.count_lanes,
            )?);
        }
        self.lanes.clone_from(&self.preset_lanes);
        Ok(())
    }

    /// Number of lanes still active in the current traversal
    pub fn active_lanes(&self) -> usize {
        match &self.lanes {
            Some(lanes) => lanes.len(),
            None if self.finished => 0,
            None => self.initial_lanes().map_or(0, |lanes| lanes.len()),
        }
    }

    fn initial_lanes(&self) -> Result<LaneSet> {
        match &self.preset_lanes {
            Some(preset) => Ok(preset.clone()),
            None => LaneSet::initial(
                self.entity.entity(),
                &self.query_params,
                self.config.cursor_key.as_deref(),
                self.config.count_lanes,
            ),
        }
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Restart the traversal and load the first record
    ///
    /// Clears the buffer and puts every lane back at its starting page.
    pub async fn rewind(&mut self) -> Result<()> {
        self.buffer.clear();
        self.current = None;
        self.key = 0;
        self.next_key = 0;
        self.lanes = None;
        self.finished = false;
        self.started = true;
        self.advance().await
    }

    /// Move to the next record, fetching a round if the buffer is empty
    ///
    /// A fatal error ends the traversal: later calls report end of sequence
    /// until the next [`rewind`](Self::rewind).
    pub async fn advance(&mut self) -> Result<()> {
        self.started = true;

        if self.buffer.is_empty() && !self.finished {
            if let Err(e) = self.fetch_round().await {
                self.finished = true;
                self.current = None;
                return Err(e);
            }
        }

        self.current = self.buffer.pop_front();
        if self.current.is_some() {
            self.key = self.next_key;
            self.next_key += 1;
        }
        Ok(())
    }

    /// Fetch the next record
    ///
    /// Starts the traversal on first use. Returns `Ok(None)` at end of
    /// sequence.
    pub async fn next_record(&mut self) -> Result<Option<Record>> {
        if self.started {
            self.advance().await?;
        } else {
            self.rewind().await?;
        }
        Ok(self.current.clone())
    }

    /// Current record, if the traversal has not ended
    pub fn current(&self) -> Option<&Record> {
        self.current.as_ref()
    }

    /// Sequence number of the current record
    pub fn key(&self) -> Option<u64> {
        self.current.as_ref().map(|_| self.key)
    }

    /// True while positioned on a record
    pub fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    /// True once no lane can produce more records and the buffer is drained
    pub fn is_exhausted(&self) -> bool {
        self.finished && self.buffer.is_empty()
    }

    /// Completed fetch rounds
    pub fn round_count(&self) -> u64 {
        self.round_count
    }

    /// Override the round counter
    pub fn set_round_count(&mut self, count: u64) {
        self.round_count = count;
    }

    /// Consume the pager as a stream of records
    ///
    /// The stream ends after the last record or after yielding an error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Record>> {
        stream::try_unfold(self, |mut pager| async move {
            let record = pager.next_record().await?;
            Ok(record.map(|record| (record, pager)))
        })
    }

    async fn fetch_round(&mut self) -> Result<()> {
        let lanes = match self.lanes.take() {
            Some(lanes) => lanes,
            None => self.initial_lanes()?,
        };

        if lanes.is_empty() {
            self.finished = true;
            self.lanes = Some(lanes);
            return Ok(());
        }

        self.round_count += 1;
        let outcome = run_round(&self.transport, &self.controller, &lanes).await;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.lanes = Some(lanes);
                return Err(e);
            }
        };

        debug!(
            entity = self.entity.entity(),
            round = self.round_count,
            lanes = lanes.len(),
            records = outcome.records.len(),
            exhausted = ?outcome.exhausted,
            "round complete"
        );

        self.buffer.extend(outcome.records);
        if outcome.next.is_empty() {
            self.finished = true;
            info!(
                entity = self.entity.entity(),
                rounds = self.round_count,
                "all lanes exhausted"
            );
        }
        self.lanes = Some(outcome.next);
        Ok(())
    }
}

impl<E: Entity, T> std::fmt::Debug for LanePager<E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanePager")
            .field("entity", &self.entity.entity())
            .field("config", &self.config)
            .field("buffered", &self.buffer.len())
            .field("round_count", &self.round_count)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
