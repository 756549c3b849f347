//! Estimated-timetable delivery types.
//!
//! These are the validated output of the decoder. Every mandatory reference
//! is a non-empty newtype and every timestamp carries its UTC offset, so a
//! consumer never has to re-check what the decoder already enforced.

use serde::Serialize;

use super::reference::{
    DatedVehicleJourneyRef, DestinationRef, DirectionRef, LineRef, ProducerRef, StopPointRef,
};
use super::time::Timestamp;

/// One decoded snapshot of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDelivery {
    /// When the producer generated this snapshot. Drives the staleness gate.
    pub response_timestamp: Timestamp,

    /// The system that produced the snapshot.
    pub producer_ref: ProducerRef,

    /// Timetable deliveries, in feed order.
    pub estimated_timetable_deliveries: Vec<EstimatedTimetableDelivery>,
}

impl ServiceDelivery {
    /// Iterate over every vehicle journey in every frame of every delivery.
    pub fn vehicle_journeys(&self) -> impl Iterator<Item = &EstimatedVehicleJourney> {
        self.estimated_timetable_deliveries
            .iter()
            .flat_map(|d| d.version_frames.iter())
            .flat_map(|f| f.vehicle_journeys.iter())
    }

    /// Total number of vehicle journeys carried by this snapshot.
    pub fn journey_count(&self) -> usize {
        self.vehicle_journeys().count()
    }

    /// Total number of estimated calls carried by this snapshot.
    pub fn call_count(&self) -> usize {
        self.vehicle_journeys()
            .map(|j| j.estimated_calls.len())
            .sum()
    }
}

/// A group of version frames.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EstimatedTimetableDelivery {
    pub version_frames: Vec<VersionFrame>,
}

/// A set of vehicle journeys sharing one version of the timetable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VersionFrame {
    pub vehicle_journeys: Vec<EstimatedVehicleJourney>,
}

/// Predicted progress of one dated vehicle journey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimatedVehicleJourney {
    /// When the producer last observed this journey.
    pub recorded_at_time: Option<Timestamp>,

    pub dated_vehicle_journey_ref: DatedVehicleJourneyRef,
    pub destination_ref: DestinationRef,
    pub direction_ref: DirectionRef,
    pub line_ref: LineRef,

    /// Public name of the line.
    ///
    /// The wire format allows several names; only the first is kept.
    pub published_line_name: Option<String>,

    /// Public name of the destination. Same truncation as `published_line_name`.
    pub destination_name: Option<String>,

    /// Stop visits, in calling order.
    pub estimated_calls: Vec<EstimatedCall>,
}

/// A single predicted stop visit.
///
/// Aimed times are the timetabled values; expected times are the producer's
/// current prediction. Each is independent: an absent value means the feed
/// did not supply it, never "same as aimed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimatedCall {
    pub stop_point_ref: StopPointRef,
    pub aimed_arrival_time: Option<Timestamp>,
    pub aimed_departure_time: Option<Timestamp>,
    pub expected_arrival_time: Option<Timestamp>,
    pub expected_departure_time: Option<Timestamp>,
}
