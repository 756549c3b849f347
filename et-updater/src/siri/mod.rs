//! SIRI Lite estimated-timetable feed access.
//!
//! This module fetches and decodes the JSON ("SIRI Lite") encoding of the
//! SIRI Estimated Timetable service, as published by the Île-de-France feed.
//!
//! Key characteristics of the feed:
//! - The whole document is one `Siri.serviceDelivery` object
//! - `estimatedTimetableDelivery` is an array of vehicle journeys, not of
//!   deliveries, despite its name
//! - References and names are wrapped as `{ "value": "..." }`
//! - Timestamps are ISO-8601 with a UTC offset

mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use client::{DEFAULT_TIMEOUT_SECS, Fetcher, HttpFetcher};
pub use convert::{DecodeError, FieldLocation, convert_document, decode};
pub use error::FetchError;
pub use mock::{MockFetcher, MockResponse};
pub use types::{
    EstimatedCallDto, EstimatedCallsDto, EstimatedVehicleJourneyDto, ServiceDeliveryDto, Siri,
    SiriDocument, ValueDto,
};
