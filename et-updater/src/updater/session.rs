//! Staleness gate and session state.
//!
//! The updater remembers two things between polls: the response timestamp of
//! the last accepted snapshot, and whether the next accepted snapshot is a
//! full dataset or an incremental update. [`evaluate`] is the only place
//! these change, and it is a pure function so the transitions can be tested
//! without a fetcher.

use std::fmt;

use chrono::{Months, Utc};
use serde::Serialize;

use crate::domain::Timestamp;

/// How a consumer should apply an accepted snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetMode {
    /// Replace the entire timetable view.
    Full,
    /// Apply on top of the existing view.
    Incremental,
}

impl DatasetMode {
    /// Whether this is [`DatasetMode::Full`].
    pub fn is_full(self) -> bool {
        self == DatasetMode::Full
    }
}

impl fmt::Display for DatasetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetMode::Full => f.write_str("full"),
            DatasetMode::Incremental => f.write_str("incremental"),
        }
    }
}

/// State carried by the updater between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    /// Response timestamp of the last accepted snapshot, or the start-up floor.
    pub last_timestamp: Timestamp,
    /// Mode the next accepted snapshot will be delivered under.
    pub mode: DatasetMode,
}

impl SessionState {
    /// Initial state with an explicit staleness floor.
    pub fn new(floor: Timestamp) -> Self {
        Self {
            last_timestamp: floor,
            mode: DatasetMode::Full,
        }
    }

    /// Initial state whose floor is one month before `now`.
    ///
    /// Snapshots older than that are treated as stale even on the first poll.
    pub fn starting_at(now: Timestamp) -> Self {
        let floor = now.checked_sub_months(Months::new(1)).unwrap_or(now);
        Self::new(floor)
    }

    /// Initial state relative to the current wall clock.
    pub fn starting_now() -> Self {
        Self::starting_at(Utc::now().fixed_offset())
    }
}

/// Outcome of the staleness gate for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The snapshot is current; deliver it under `mode`.
    Accept { mode: DatasetMode },
    /// The snapshot is older than the last accepted one.
    Reject { last_accepted: Timestamp },
}

/// Decide whether a snapshot with response timestamp `t` is accepted.
///
/// A snapshot older than the last accepted timestamp is rejected and the
/// state is returned unchanged. Otherwise the snapshot is accepted under the
/// current mode, the timestamp advances to `t`, and the mode becomes
/// incremental. The mode never returns to full.
pub fn evaluate(state: &SessionState, t: Timestamp) -> (SessionState, GateDecision) {
    if t < state.last_timestamp {
        return (
            *state,
            GateDecision::Reject {
                last_accepted: state.last_timestamp,
            },
        );
    }

    let next = SessionState {
        last_timestamp: t,
        mode: DatasetMode::Incremental,
    };
    (next, GateDecision::Accept { mode: state.mode })
}
