//! Reference identifier types.
//!
//! SIRI identifies producers, journeys, lines, directions and stop points by
//! opaque strings. Each kind gets its own newtype so a `LineRef` can never be
//! passed where a `StopPointRef` is expected.

use std::fmt;

use serde::Serialize;

/// Error returned when parsing an empty reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: must not be empty")]
pub struct EmptyReference {
    kind: &'static str,
}

macro_rules! reference_type {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse a reference, rejecting the empty string.
            pub fn parse(s: impl Into<String>) -> Result<Self, EmptyReference> {
                let s = s.into();
                if s.is_empty() {
                    return Err(EmptyReference { kind: $kind });
                }
                Ok(Self(s))
            }

            /// Returns the reference as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

reference_type!(
    /// Identifier of the system that produced a service delivery.
    ProducerRef,
    "producer reference"
);

reference_type!(
    /// Identifier of one dated run of a vehicle.
    ///
    /// Downstream consumers namespace this with the feed id to build trip ids.
    DatedVehicleJourneyRef,
    "dated vehicle journey reference"
);

reference_type!(
    /// Identifier of the final stop of a journey.
    DestinationRef,
    "destination reference"
);

reference_type!(
    /// Identifier of the direction of travel along a line.
    DirectionRef,
    "direction reference"
);

reference_type!(
    /// Identifier of a line.
    LineRef,
    "line reference"
);

reference_type!(
    /// Identifier of a stop point visited by a call.
    StopPointRef,
    "stop point reference"
);
