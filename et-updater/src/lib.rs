//! SIRI Lite estimated-timetable updater.
//!
//! Polls a SIRI Lite `estimated-timetable` JSON endpoint, decodes each
//! snapshot into validated domain types, and hands only snapshots newer than
//! the last accepted one to a consumer, marking the first as a full dataset
//! and the rest as incremental.

pub mod domain;
pub mod siri;
pub mod updater;
