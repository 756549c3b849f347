//! The polling updater: configuration, session state and the source that
//! ties fetch, decode and staleness gating together.

mod config;
mod session;
mod source;

pub use config::{ConfigError, DEFAULT_POLL_INTERVAL_SECS, UpdaterConfig};
pub use session::{DatasetMode, GateDecision, SessionState, evaluate};
pub use source::{EstimatedTimetableSource, NoUpdate, PollResult};
