//! Domain types for estimated-timetable updates.
//!
//! These are the validated form of a SIRI Lite snapshot. All types enforce
//! their invariants at construction time, so code that receives them can
//! trust their validity.

mod delivery;
mod reference;
mod time;

pub use delivery::{
    EstimatedCall, EstimatedTimetableDelivery, EstimatedVehicleJourney, ServiceDelivery,
    VersionFrame,
};
pub use reference::{
    DatedVehicleJourneyRef, DestinationRef, DirectionRef, EmptyReference, LineRef, ProducerRef,
    StopPointRef,
};
pub use time::{TimeError, Timestamp, parse_timestamp};
