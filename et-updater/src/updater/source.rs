//! Estimated-timetable polling source.
//!
//! Each [`EstimatedTimetableSource::poll`] runs fetch, decode and the
//! staleness gate in sequence and reports the outcome as a [`PollResult`].
//! Failures never escape a poll: they become [`NoUpdate`] reasons so the
//! caller can log them and try again on the next tick.
//!
//! `poll` takes `&mut self`, so two polls can never run against the same
//! session state at once. A host that shares a source between tasks must put
//! it behind a `tokio::sync::Mutex`.

use std::fmt;
use std::time::Instant;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::domain::{EstimatedTimetableDelivery, ProducerRef, Timestamp};
use crate::siri::{DecodeError, FetchError, Fetcher, HttpFetcher, decode};

use super::config::{ConfigError, UpdaterConfig};
use super::session::{DatasetMode, GateDecision, SessionState, evaluate};

/// Outcome of one poll.
#[derive(Debug)]
pub enum PollResult {
    /// A current snapshot was decoded and accepted.
    Accepted {
        /// Timetable deliveries to hand to the consumer.
        deliveries: Vec<EstimatedTimetableDelivery>,
        /// Whether the consumer should replace its view or apply a delta.
        mode: DatasetMode,
        /// Producer timestamp of the snapshot.
        response_timestamp: Timestamp,
        /// Producer of the snapshot.
        producer_ref: ProducerRef,
    },
    /// Nothing new for the consumer.
    NoUpdate(NoUpdate),
}

impl PollResult {
    /// Whether this poll produced data.
    pub fn is_accepted(&self) -> bool {
        matches!(self, PollResult::Accepted { .. })
    }

    /// The accepted deliveries and mode, or `None` for any kind of no-update.
    pub fn into_update(self) -> Option<(Vec<EstimatedTimetableDelivery>, DatasetMode)> {
        match self {
            PollResult::Accepted {
                deliveries, mode, ..
            } => Some((deliveries, mode)),
            PollResult::NoUpdate(_) => None,
        }
    }
}

/// Why a poll produced no update.
#[derive(Debug)]
pub enum NoUpdate {
    /// The fetcher failed.
    FetchFailed(FetchError),

    /// The fetcher answered but returned no bytes.
    NoData,

    /// The bytes could not be decoded.
    DecodeFailed(DecodeError),

    /// The snapshot is older than one already accepted. Not a failure.
    Stale {
        response_timestamp: Timestamp,
        last_accepted: Timestamp,
    },
}

impl NoUpdate {
    /// Whether this reason indicates a problem worth alerting on.
    ///
    /// An empty answer or a stale snapshot is normal operation.
    pub fn is_failure(&self) -> bool {
        matches!(self, NoUpdate::FetchFailed(_) | NoUpdate::DecodeFailed(_))
    }
}

impl fmt::Display for NoUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoUpdate::FetchFailed(e) => write!(f, "fetch failed: {e}"),
            NoUpdate::NoData => write!(f, "feed returned no data"),
            NoUpdate::DecodeFailed(e) => write!(f, "decode failed: {e}"),
            NoUpdate::Stale {
                response_timestamp,
                last_accepted,
            } => write!(
                f,
                "stale snapshot: {} is older than {}",
                response_timestamp.to_rfc3339(),
                last_accepted.to_rfc3339()
            ),
        }
    }
}

/// Polling source of SIRI Lite estimated-timetable snapshots.
pub struct EstimatedTimetableSource<F> {
    config: UpdaterConfig,
    fetcher: F,
    session: SessionState,
}

impl EstimatedTimetableSource<HttpFetcher> {
    /// Create a source that fetches over HTTP as described by `config`.
    ///
    /// The config is validated first, so a zero poll interval or timeout is
    /// reported here rather than when the scheduler starts.
    pub fn from_config(config: UpdaterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fetcher = HttpFetcher::new(config.url.clone(), config.timeout).map_err(|e| {
            ConfigError::HttpClient {
                message: e.to_string(),
            }
        })?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: Fetcher> EstimatedTimetableSource<F> {
    /// Create a source with a fresh session starting from the current time.
    pub fn new(config: UpdaterConfig, fetcher: F) -> Self {
        Self::with_session(config, fetcher, SessionState::starting_now())
    }

    /// Create a source with an explicit initial session.
    pub fn with_session(config: UpdaterConfig, fetcher: F, session: SessionState) -> Self {
        Self {
            config,
            fetcher,
            session,
        }
    }

    /// Fetch, decode and gate one snapshot.
    ///
    /// The session is updated only when the snapshot is accepted.
    pub async fn poll(&mut self) -> PollResult {
        let url = &self.config.url;
        let started = Instant::now();

        let bytes = match self.fetcher.fetch().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                info!(%url, "Feed returned no data");
                return PollResult::NoUpdate(NoUpdate::NoData);
            }
            Err(e) => {
                warn!(
                    %url,
                    elapsed_ms = elapsed_ms(started),
                    error = %e,
                    "Failed to fetch SIRI Lite ET feed"
                );
                return PollResult::NoUpdate(NoUpdate::FetchFailed(e));
            }
        };
        info!(
            elapsed_ms = elapsed_ms(started),
            bytes = bytes.len(),
            "Fetched ET data"
        );

        let started = Instant::now();
        let delivery = match decode(&bytes) {
            Ok(delivery) => delivery,
            Err(e) => {
                warn!(%url, error = %e, "Failed to decode SIRI Lite ET feed");
                return PollResult::NoUpdate(NoUpdate::DecodeFailed(e));
            }
        };
        info!(
            elapsed_ms = elapsed_ms(started),
            journeys = delivery.journey_count(),
            calls = delivery.call_count(),
            "Decoded ET data"
        );

        let response_timestamp = delivery.response_timestamp;
        let (next, decision) = evaluate(&self.session, response_timestamp);

        match decision {
            GateDecision::Reject { last_accepted } => {
                info!(
                    response_timestamp = %response_timestamp.to_rfc3339(),
                    last_accepted = %last_accepted.to_rfc3339(),
                    "Newer data has already been processed"
                );
                PollResult::NoUpdate(NoUpdate::Stale {
                    response_timestamp,
                    last_accepted,
                })
            }
            GateDecision::Accept { mode } => {
                debug!(from = %self.session.mode, to = %next.mode, "Session advanced");
                self.session = next;
                info!(
                    producer = %delivery.producer_ref,
                    response_timestamp = %response_timestamp.to_rfc3339(),
                    %mode,
                    "Accepted ET snapshot"
                );
                PollResult::Accepted {
                    deliveries: delivery.estimated_timetable_deliveries,
                    mode,
                    response_timestamp,
                    producer_ref: delivery.producer_ref,
                }
            }
        }
    }

    /// Feed identifier for trip id namespacing, as configured.
    pub fn feed_id(&self) -> Option<&str> {
        self.config.feed_id.as_deref()
    }

    /// The configured feed URL.
    pub fn url(&self) -> &Url {
        &self.config.url
    }

    /// Current session state.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Whether the next accepted snapshot will be a full dataset.
    pub fn is_full_dataset(&self) -> bool {
        self.session.mode.is_full()
    }

    /// Timestamp below which snapshots are rejected as stale.
    pub fn last_timestamp(&self) -> Timestamp {
        self.session.last_timestamp
    }

    /// The underlying fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

impl<F> fmt::Display for EstimatedTimetableSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SiriLiteEtSource({})", self.config.url)
    }
}

fn elapsed_ms(started: Instant) -> u128 {
    started.elapsed().as_millis()
}
