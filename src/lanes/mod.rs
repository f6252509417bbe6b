//! Lane module
//!
//! Partitions an unbounded page sequence across N lanes.
//!
//! # Overview
//!
//! Lane `i` starts at page `1 + i` and advances by `N` after every page it
//! receives data for, so lane `i` requests pages `i+1, i+1+N, i+1+2N, ...`.
//! Together the lanes cover every page number exactly once.

mod types;

pub use types::{page_plan, LaneRequest, LaneSet, DEFAULT_CURSOR};
