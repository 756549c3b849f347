//! Conversion from SIRI Lite DTOs to domain types.
//!
//! Decoding happens in two passes: serde maps the bytes onto the all-optional
//! DTOs in [`super::types`], then this module validates them into the domain
//! model. The first problem found anywhere in the tree aborts the whole
//! decode; a partially converted delivery is never returned.

use std::fmt;

use serde_json::error::Category;

use crate::domain::{
    DatedVehicleJourneyRef, DestinationRef, DirectionRef, EstimatedCall,
    EstimatedTimetableDelivery, EstimatedVehicleJourney, LineRef, ProducerRef, ServiceDelivery,
    StopPointRef, Timestamp, VersionFrame, parse_timestamp,
};

use super::types::{
    EstimatedCallDto, EstimatedVehicleJourneyDto, ServiceDeliveryDto, SiriDocument, ValueDto,
};

/// Where in the document a field was being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLocation {
    /// Directly under `serviceDelivery`.
    ServiceDelivery,
    /// On the journey at this index of `estimatedTimetableDelivery`.
    Journey { journey: usize },
    /// On a call of a journey.
    Call { journey: usize, call: usize },
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldLocation::ServiceDelivery => write!(f, "serviceDelivery"),
            FieldLocation::Journey { journey } => write!(f, "journey {journey}"),
            FieldLocation::Call { journey, call } => write!(f, "journey {journey}, call {call}"),
        }
    }
}

/// Error during decoding of a SIRI Lite document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The bytes are not JSON at all.
    #[error("invalid JSON: {message}")]
    InvalidJson { message: String },

    /// The `Siri`/`serviceDelivery` envelope is missing, or a node has the wrong JSON type.
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope { reason: String },

    /// A mandatory field is absent, null, or empty.
    #[error("missing mandatory field {field} at {location}")]
    MissingMandatoryField {
        field: &'static str,
        location: FieldLocation,
    },

    /// A timestamp is present but cannot be parsed as an offset date-time.
    #[error("invalid timestamp in {field} at {location}: {value:?}")]
    InvalidTimestamp {
        field: &'static str,
        location: FieldLocation,
        value: String,
    },
}

impl DecodeError {
    fn missing(field: &'static str, location: FieldLocation) -> Self {
        DecodeError::MissingMandatoryField { field, location }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Data => DecodeError::MalformedEnvelope {
                reason: err.to_string(),
            },
            Category::Io | Category::Syntax | Category::Eof => DecodeError::InvalidJson {
                message: err.to_string(),
            },
        }
    }
}

/// Decode raw feed bytes into a service delivery.
///
/// All journeys are placed in a single version frame of a single timetable
/// delivery, in feed order.
pub fn decode(bytes: &[u8]) -> Result<ServiceDelivery, DecodeError> {
    let document: SiriDocument = serde_json::from_slice(bytes)?;
    convert_document(&document)
}

/// Validate a deserialized document into a service delivery.
pub fn convert_document(document: &SiriDocument) -> Result<ServiceDelivery, DecodeError> {
    let siri = document
        .siri
        .as_ref()
        .ok_or_else(|| DecodeError::MalformedEnvelope {
            reason: "missing Siri node".to_string(),
        })?;

    let delivery = siri
        .service_delivery
        .as_ref()
        .ok_or_else(|| DecodeError::MalformedEnvelope {
            reason: "missing Siri.serviceDelivery node".to_string(),
        })?;

    convert_service_delivery(delivery)
}

fn convert_service_delivery(dto: &ServiceDeliveryDto) -> Result<ServiceDelivery, DecodeError> {
    let location = FieldLocation::ServiceDelivery;

    let response_timestamp = dto
        .response_timestamp
        .as_deref()
        .ok_or(DecodeError::missing("responseTimestamp", location))?;
    let response_timestamp = timestamp("responseTimestamp", response_timestamp, location)?;

    let producer_ref = dto
        .producer_ref
        .clone()
        .and_then(|s| ProducerRef::parse(s).ok())
        .ok_or(DecodeError::missing("producerRef", location))?;

    let journeys = dto
        .estimated_timetable_delivery
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .enumerate()
        .map(|(idx, journey)| convert_journey(journey, idx))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ServiceDelivery {
        response_timestamp,
        producer_ref,
        estimated_timetable_deliveries: vec![EstimatedTimetableDelivery {
            version_frames: vec![VersionFrame {
                vehicle_journeys: journeys,
            }],
        }],
    })
}

/// Convert one element of `estimatedTimetableDelivery`.
fn convert_journey(
    dto: &EstimatedVehicleJourneyDto,
    journey: usize,
) -> Result<EstimatedVehicleJourney, DecodeError> {
    let location = FieldLocation::Journey { journey };

    let recorded_at_time = optional_timestamp("recordedAtTime", &dto.recorded_at_time, location)?;

    let dated_vehicle_journey_ref = DatedVehicleJourneyRef::parse(mandatory_value(
        "datedVehicleJourneyRef",
        &dto.dated_vehicle_journey_ref,
        location,
    )?)
    .map_err(|_| DecodeError::missing("datedVehicleJourneyRef", location))?;

    let destination_ref = DestinationRef::parse(mandatory_value(
        "destinationRef",
        &dto.destination_ref,
        location,
    )?)
    .map_err(|_| DecodeError::missing("destinationRef", location))?;

    let direction_ref =
        DirectionRef::parse(mandatory_value("directionRef", &dto.direction_ref, location)?)
            .map_err(|_| DecodeError::missing("directionRef", location))?;

    let line_ref = LineRef::parse(mandatory_value("lineRef", &dto.line_ref, location)?)
        .map_err(|_| DecodeError::missing("lineRef", location))?;

    let published_line_name =
        first_name("publishedLineName", dto.published_line_name.as_deref(), location)?;
    let destination_name = first_name("destinationName", dto.destination_name.as_deref(), location)?;

    let estimated_calls = dto
        .estimated_calls
        .as_ref()
        .and_then(|calls| calls.estimated_call.as_deref())
        .unwrap_or(&[])
        .iter()
        .enumerate()
        .map(|(call, cp)| convert_call(cp, journey, call))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EstimatedVehicleJourney {
        recorded_at_time,
        dated_vehicle_journey_ref,
        destination_ref,
        direction_ref,
        line_ref,
        published_line_name,
        destination_name,
        estimated_calls,
    })
}

/// Convert one element of `estimatedCalls.estimatedCall`.
fn convert_call(
    dto: &EstimatedCallDto,
    journey: usize,
    call: usize,
) -> Result<EstimatedCall, DecodeError> {
    let location = FieldLocation::Call { journey, call };

    let stop_point_ref =
        StopPointRef::parse(mandatory_value("stopPointRef", &dto.stop_point_ref, location)?)
            .map_err(|_| DecodeError::missing("stopPointRef", location))?;

    Ok(EstimatedCall {
        stop_point_ref,
        aimed_arrival_time: optional_timestamp(
            "aimedArrivalTime",
            &dto.aimed_arrival_time,
            location,
        )?,
        aimed_departure_time: optional_timestamp(
            "aimedDepartureTime",
            &dto.aimed_departure_time,
            location,
        )?,
        expected_arrival_time: optional_timestamp(
            "expectedArrivalTime",
            &dto.expected_arrival_time,
            location,
        )?,
        expected_departure_time: optional_timestamp(
            "expectedDepartureTime",
            &dto.expected_departure_time,
            location,
        )?,
    })
}

/// Read the string inside a mandatory `{ "value": ... }` node.
fn mandatory_value(
    field: &'static str,
    node: &Option<ValueDto>,
    location: FieldLocation,
) -> Result<String, DecodeError> {
    node.as_ref()
        .and_then(|n| n.value.clone())
        .ok_or(DecodeError::missing(field, location))
}

/// Keep the first entry of a name array.
///
/// Feeds model names as a list of alternatives but in practice send one. We
/// keep the first and drop the rest; an empty list counts as no name.
fn first_name(
    field: &'static str,
    names: Option<&[ValueDto]>,
    location: FieldLocation,
) -> Result<Option<String>, DecodeError> {
    match names.and_then(|n| n.first()) {
        None => Ok(None),
        Some(first) => first
            .value
            .clone()
            .map(Some)
            .ok_or(DecodeError::missing(field, location)),
    }
}

fn optional_timestamp(
    field: &'static str,
    raw: &Option<String>,
    location: FieldLocation,
) -> Result<Option<Timestamp>, DecodeError> {
    raw.as_deref()
        .map(|s| timestamp(field, s, location))
        .transpose()
}

fn timestamp(
    field: &'static str,
    raw: &str,
    location: FieldLocation,
) -> Result<Timestamp, DecodeError> {
    parse_timestamp(raw).map_err(|_| DecodeError::InvalidTimestamp {
        field,
        location,
        value: raw.to_string(),
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_call() -> impl Strategy<Value = String> {
        (
            "[A-Z0-9:]{1,12}",
            prop::option::of(0u32..60),
            prop::option::of(0u32..60),
        )
            .prop_map(|(stop, aimed, expected)| {
                let mut fields = vec![format!(r#""stopPointRef": {{"value": "{stop}"}}"#)];
                if let Some(m) = aimed {
                    fields.push(format!(r#""aimedArrivalTime": "2023-01-01T10:{m:02}:00+01:00""#));
                }
                if let Some(m) = expected {
                    fields.push(format!(r#""expectedArrivalTime": "2023-01-01T10:{m:02}:00Z""#));
                }
                format!("{{{}}}", fields.join(","))
            })
    }

    fn arb_journey() -> impl Strategy<Value = String> {
        ("[A-Z0-9]{1,8}", prop::collection::vec(arb_call(), 0..5)).prop_map(|(line, calls)| {
            format!(
                r#"{{
                    "datedVehicleJourneyRef": {{"value": "J-{line}"}},
                    "destinationRef": {{"value": "D"}},
                    "directionRef": {{"value": "1"}},
                    "lineRef": {{"value": "{line}"}},
                    "estimatedCalls": {{"estimatedCall": [{}]}}
                }}"#,
                calls.join(",")
            )
        })
    }

    fn wrap(journeys: &[String]) -> String {
        format!(
            r#"{{"Siri": {{"serviceDelivery": {{
                "responseTimestamp": "2023-01-01T10:00:00Z",
                "producerRef": "P",
                "estimatedTimetableDelivery": [{}]
            }}}}}}"#,
            journeys.join(",")
        )
    }

    proptest! {
        /// Decoding the same bytes twice yields the same value
        #[test]
        fn decode_is_pure(journeys in prop::collection::vec(arb_journey(), 0..6)) {
            let json = wrap(&journeys);
            let first = decode(json.as_bytes());
            prop_assert!(first.is_ok());
            prop_assert_eq!(first, decode(json.as_bytes()));
        }

        /// Every journey and call in the feed survives decoding, in order
        #[test]
        fn nothing_is_dropped(journeys in prop::collection::vec(arb_journey(), 0..6)) {
            let json = wrap(&journeys);
            let delivery = decode(json.as_bytes()).unwrap();
            prop_assert_eq!(delivery.journey_count(), journeys.len());
            let expected_calls: usize = journeys
                .iter()
                .map(|j| j.matches("stopPointRef").count())
                .sum();
            prop_assert_eq!(delivery.call_count(), expected_calls);
        }

        /// Breaking any one journey fails the whole decode
        #[test]
        fn one_bad_journey_fails_all(
            journeys in prop::collection::vec(arb_journey(), 1..6),
            pick in any::<prop::sample::Index>(),
        ) {
            let bad = pick.index(journeys.len());
            let mut journeys = journeys;
            journeys[bad] = journeys[bad].replacen(r#""directionRef""#, r#""directionRefX""#, 1);

            let result = decode(wrap(&journeys).as_bytes());
            prop_assert_eq!(
                result,
                Err(DecodeError::MissingMandatoryField {
                    field: "directionRef",
                    location: FieldLocation::Journey { journey: bad },
                })
            );
        }
    }
}
