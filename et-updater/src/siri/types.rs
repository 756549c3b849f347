//! SIRI Lite estimated-timetable wire DTOs.
//!
//! These types map directly to the JSON published by the feed. Every field is
//! an `Option` because producers omit fields rather than sending nulls, and
//! because deciding what is mandatory belongs to the conversion step, where a
//! missing field can be reported with its location.

use serde::Deserialize;

/// Document root: `{ "Siri": { ... } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct SiriDocument {
    #[serde(rename = "Siri")]
    pub siri: Option<Siri>,
}

/// The `Siri` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Siri {
    pub service_delivery: Option<ServiceDeliveryDto>,
}

/// The `serviceDelivery` node.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeliveryDto {
    /// When the response was generated (ISO-8601 with offset).
    pub response_timestamp: Option<String>,

    /// Producer identifier, as a bare string (not wrapped in `{ "value" }`).
    pub producer_ref: Option<String>,

    /// Despite the name, each element is one vehicle journey.
    pub estimated_timetable_delivery: Option<Vec<EstimatedVehicleJourneyDto>>,
}

/// One element of `estimatedTimetableDelivery`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedVehicleJourneyDto {
    pub recorded_at_time: Option<String>,
    pub dated_vehicle_journey_ref: Option<ValueDto>,
    pub destination_ref: Option<ValueDto>,
    pub direction_ref: Option<ValueDto>,
    pub line_ref: Option<ValueDto>,

    /// Alternative names; we keep the first.
    pub published_line_name: Option<Vec<ValueDto>>,

    /// Alternative names; we keep the first.
    pub destination_name: Option<Vec<ValueDto>>,

    pub estimated_calls: Option<EstimatedCallsDto>,
}

/// The `estimatedCalls` wrapper object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedCallsDto {
    pub estimated_call: Option<Vec<EstimatedCallDto>>,
}

/// One stop visit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedCallDto {
    pub stop_point_ref: Option<ValueDto>,
    pub aimed_arrival_time: Option<String>,
    pub aimed_departure_time: Option<String>,
    pub expected_arrival_time: Option<String>,
    pub expected_departure_time: Option<String>,
}

/// SIRI's `{ "value": "..." }` wrapper used for references and names.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueDto {
    pub value: Option<String>,
}
