//! Lane request and lane set types

use crate::error::{Error, Result};
use crate::types::StringMap;
use std::collections::{BTreeMap, HashSet};

/// Cursor value used when a request carries none yet
pub const DEFAULT_CURSOR: u64 = 1;

// ============================================================================
// Lane Request
// ============================================================================

/// A request descriptor bound to one lane
///
/// Carries the entity name, the query parameters and, when lanes are
/// enabled, the name of the query parameter holding the lane's page cursor.
/// Requests are immutable; advancing a lane produces a new request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneRequest {
    entity: String,
    query_params: StringMap,
    cursor_key: Option<String>,
}

impl LaneRequest {
    /// Create a request without a cursor key
    pub fn new(entity: impl Into<String>, query_params: StringMap) -> Self {
        Self {
            entity: entity.into(),
            query_params,
            cursor_key: None,
        }
    }

    /// Set the query parameter that carries the page cursor
    #[must_use]
    pub fn with_cursor_key(mut self, key: impl Into<String>) -> Self {
        self.cursor_key = Some(key.into());
        self
    }

    /// Set the cursor to an explicit page
    ///
    /// No-op when the request has no cursor key.
    #[must_use]
    pub fn with_cursor(mut self, page: u64) -> Self {
        if let Some(key) = &self.cursor_key {
            self.query_params.insert(key.clone(), page.to_string());
        }
        self
    }

    /// Entity name
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Query parameters, cursor included
    pub fn query_params(&self) -> &StringMap {
        &self.query_params
    }

    /// Name of the cursor parameter, if lanes are enabled
    pub fn cursor_key(&self) -> Option<&str> {
        self.cursor_key.as_deref()
    }

    /// Current page cursor
    ///
    /// Returns `None` when the request has no cursor key and
    /// [`DEFAULT_CURSOR`] when the key is not set yet. A value that is not a
    /// positive integer is a contract violation.
    pub fn cursor(&self) -> Result<Option<u64>> {
        let Some(key) = &self.cursor_key else {
            return Ok(None);
        };

        match self.query_params.get(key) {
            None => Ok(Some(DEFAULT_CURSOR)),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(page) if page > 0 => Ok(Some(page)),
                _ => Err(Error::contract(format!(
                    "cursor '{key}' must be a positive integer, got '{raw}'"
                ))),
            },
        }
    }

    /// Shift the cursor forward by `offset` pages
    pub fn offset_by(&self, offset: u64) -> Result<Self> {
        match self.cursor()? {
            Some(page) => self.shifted(page, offset),
            None => Ok(self.clone()),
        }
    }

    /// Request for this lane's next page
    ///
    /// Returns `None` when the request has no cursor and therefore cannot
    /// move to another page.
    pub fn advanced(&self, stride: u64) -> Result<Option<Self>> {
        match self.cursor()? {
            Some(page) => self.shifted(page, stride).map(Some),
            None => Ok(None),
        }
    }

    fn shifted(&self, page: u64, by: u64) -> Result<Self> {
        let next = page.checked_add(by).ok_or_else(|| {
            Error::contract(format!("cursor {page} cannot move {by} pages further"))
        })?;
        Ok(self.clone().with_cursor(next))
    }

    /// Query parameters without the cursor
    fn base_params(&self) -> BTreeMap<String, String> {
        self.query_params
            .iter()
            .filter(|(key, _)| Some(key.as_str()) != self.cursor_key.as_deref())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

// ============================================================================
// Lane Set
// ============================================================================

/// Active lanes keyed by lane index
///
/// Lanes are ordered by index, which is also the dispatch order of a round.
/// A lane that has been removed is never added back within a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneSet {
    lanes: BTreeMap<usize, LaneRequest>,
    stride: u64,
}

impl LaneSet {
    /// Build the initial lanes for a traversal
    ///
    /// Produces `count_lanes` requests when a cursor key is configured and
    /// `count_lanes > 1`, otherwise exactly one. Lane `i` starts at the
    /// configured cursor (default 1) plus `i`.
    pub fn initial(
        entity: &str,
        query_params: &StringMap,
        cursor_key: Option<&str>,
        count_lanes: usize,
    ) -> Result<Self> {
        if count_lanes == 0 {
            return Err(Error::invalid_value(
                "count_lanes",
                "at least one lane is required",
            ));
        }

        let mut base = LaneRequest::new(entity, query_params.clone());
        if let Some(key) = cursor_key {
            base = base.with_cursor_key(key);
        }

        let mut lanes = BTreeMap::new();
        let stride = match cursor_key {
            Some(_) if count_lanes > 1 => {
                for lane in 0..count_lanes {
                    lanes.insert(lane, base.offset_by(lane as u64)?);
                }
                count_lanes as u64
            }
            _ => {
                // validates a preset cursor
                base.cursor()?;
                lanes.insert(0, base);
                1
            }
        };

        Ok(Self { lanes, stride })
    }

    /// Build lanes from caller-supplied requests
    ///
    /// Every request must target `entity` and carry a valid cursor. Two
    /// requests with the same parameters whose cursors are congruent modulo
    /// `stride` would walk the same pages, so that is a contract error too.
    pub fn from_requests(requests: Vec<LaneRequest>, entity: &str, stride: usize) -> Result<Self> {
        if stride == 0 {
            return Err(Error::invalid_value("count_lanes", "stride must be positive"));
        }
        let step = stride as u64;

        let mut lanes = BTreeMap::new();
        let mut walks = HashSet::new();
        for (lane, request) in requests.into_iter().enumerate() {
            if request.entity() != entity {
                return Err(Error::contract(format!(
                    "lane {lane} targets entity '{}', expected '{entity}'",
                    request.entity()
                )));
            }
            let residue = request.cursor()?.map(|page| page % step);
            if !walks.insert((request.base_params(), residue)) {
                return Err(Error::contract(format!(
                    "lane {lane} repeats the pages of an earlier lane with stride {stride}"
                )));
            }
            lanes.insert(lane, request);
        }

        Ok(Self {
            lanes,
            stride: stride as u64,
        })
    }

    /// An empty lane set with the given stride
    pub fn empty(stride: u64) -> Self {
        Self {
            lanes: BTreeMap::new(),
            stride,
        }
    }

    /// How far a lane's cursor moves after a page with data
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Number of active lanes
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// True once every lane is exhausted
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Request for a lane
    pub fn get(&self, lane: usize) -> Option<&LaneRequest> {
        self.lanes.get(&lane)
    }

    /// Active lanes in dispatch order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &LaneRequest)> {
        self.lanes.iter().map(|(lane, request)| (*lane, request))
    }

    /// Active lane indices in dispatch order
    pub fn indices(&self) -> Vec<usize> {
        self.lanes.keys().copied().collect()
    }

    /// Requests in dispatch order
    pub fn requests(&self) -> Vec<LaneRequest> {
        self.lanes.values().cloned().collect()
    }

    pub(crate) fn insert(&mut self, lane: usize, request: LaneRequest) {
        self.lanes.insert(lane, request);
    }
}

/// Pages each lane requests per round, assuming no lane runs dry
///
/// `plan[round][lane]` is the page lane `lane` asks for in round `round`.
pub fn page_plan(count_lanes: usize, rounds: usize) -> Result<Vec<Vec<u64>>> {
    let mut lanes = LaneSet::initial("plan", &StringMap::new(), Some("p"), count_lanes)?;
    let mut plan = Vec::with_capacity(rounds);

    for _ in 0..rounds {
        let mut pages = Vec::with_capacity(lanes.len());
        let mut next = LaneSet::empty(lanes.stride());
        for (lane, request) in lanes.iter() {
            pages.push(request.cursor()?.unwrap_or(DEFAULT_CURSOR));
            if let Some(advanced) = request.advanced(lanes.stride())? {
                next.insert(lane, advanced);
            }
        }
        plan.push(pages);
        lanes = next;
    }

    Ok(plan)
}
