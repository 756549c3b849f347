//! Updater configuration.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::siri::DEFAULT_TIMEOUT_SECS;

/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Errors that make an updater impossible to construct.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No feed URL was configured
    #[error("missing mandatory 'url' parameter")]
    MissingUrl,

    /// The feed URL cannot be used
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The configuration document is not valid JSON or has wrong types
    #[error("invalid updater configuration: {message}")]
    Json { message: String },

    /// The poll interval is zero
    #[error("invalid poll interval: must be greater than zero")]
    InvalidPollInterval,

    /// The request timeout is zero
    #[error("invalid timeout: must be greater than zero")]
    InvalidTimeout,

    /// The HTTP client could not be built with these settings
    #[error("failed to build HTTP client: {message}")]
    HttpClient { message: String },
}

/// Configuration for one estimated-timetable updater.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterConfig {
    /// Feed URL, polled with `Accept: application/json`.
    pub url: Url,

    /// Opaque feed identifier handed to consumers for trip id namespacing.
    pub feed_id: Option<String>,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Time between polls when run by the bundled scheduler.
    pub poll_interval: Duration,
}

/// Updater configuration as written in a router's JSON updater list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUpdaterConfig {
    url: Option<String>,
    feed_id: Option<String>,
    timeout_secs: Option<u64>,
    poll_interval_secs: Option<u64>,
}

impl UpdaterConfig {
    /// Create a config for the given feed URL with default timings.
    ///
    /// The URL must be an absolute `http` or `https` URL.
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_url(url)?,
            feed_id: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        })
    }

    /// Set the feed identifier.
    pub fn with_feed_id(mut self, feed_id: impl Into<String>) -> Self {
        self.feed_id = Some(feed_id.into());
        self
    }

    /// Set the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the time between polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build a config from a JSON object such as
    /// `{"url": "https://...", "feedId": "STIF", "pollIntervalSecs": 30}`.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ConfigError> {
        let raw: RawUpdaterConfig = serde_json::from_value(value).map_err(|e| ConfigError::Json {
            message: e.to_string(),
        })?;
        Self::from_raw(raw)
    }

    /// Build a config from a JSON string. See [`UpdaterConfig::from_json`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawUpdaterConfig = serde_json::from_str(json).map_err(|e| ConfigError::Json {
            message: e.to_string(),
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawUpdaterConfig) -> Result<Self, ConfigError> {
        let url = raw.url.ok_or(ConfigError::MissingUrl)?;
        let mut config = Self::new(&url)?;
        config.feed_id = raw.feed_id;
        if let Some(secs) = raw.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = raw.poll_interval_secs {
            config.poll_interval = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    /// Check the timings set through the builder.
    ///
    /// Both the poll interval and the request timeout must be non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingUrl);
    }

    let url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.org/siri-lite/estimated-timetable";

    #[test]
    fn config_defaults() {
        let config = UpdaterConfig::new(URL).unwrap();

        assert_eq!(config.url.as_str(), URL);
        assert_eq!(config.feed_id, None);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(
            config.poll_interval,
            Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)
        );
    }

    #[test]
    fn config_builder() {
        let config = UpdaterConfig::new(URL)
            .unwrap()
            .with_feed_id("STIF")
            .with_timeout(Duration::from_secs(5))
            .with_poll_interval(Duration::from_secs(15));

        assert_eq!(config.feed_id.as_deref(), Some("STIF"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_secs(15));
    }

    #[test]
    fn missing_url() {
        assert_eq!(UpdaterConfig::new(""), Err(ConfigError::MissingUrl));
        assert_eq!(UpdaterConfig::new("   "), Err(ConfigError::MissingUrl));
        assert_eq!(
            UpdaterConfig::from_json_str(r#"{"feedId": "STIF"}"#),
            Err(ConfigError::MissingUrl)
        );
        assert_eq!(
            UpdaterConfig::from_json(serde_json::json!({"url": null})),
            Err(ConfigError::MissingUrl)
        );
    }

    #[test]
    fn invalid_url() {
        assert!(matches!(
            UpdaterConfig::new("not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            UpdaterConfig::new("ftp://example.org/et.json"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn from_json_object() {
        let config = UpdaterConfig::from_json(serde_json::json!({
            "type": "siri-lite-et-updater",
            "url": URL,
            "feedId": "STIF",
            "timeoutSecs": 10,
            "pollIntervalSecs": 30
        }))
        .unwrap();

        assert_eq!(config.url.as_str(), URL);
        assert_eq!(config.feed_id.as_deref(), Some("STIF"));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
    }

    #[test]
    fn feed_id_passes_through_unvalidated() {
        let config = UpdaterConfig::from_json_str(&format!(r#"{{"url": "{URL}", "feedId": ""}}"#))
            .unwrap();
        assert_eq!(config.feed_id.as_deref(), Some(""));
    }

    #[test]
    fn wrong_types_are_json_errors() {
        assert!(matches!(
            UpdaterConfig::from_json_str(r#"{"url": 42}"#),
            Err(ConfigError::Json { .. })
        ));
        assert!(matches!(
            UpdaterConfig::from_json_str("url = 'x'"),
            Err(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert_eq!(
            UpdaterConfig::from_json_str(&format!(r#"{{"url": "{URL}", "pollIntervalSecs": 0}}"#)),
            Err(ConfigError::InvalidPollInterval)
        );

        let config = UpdaterConfig::new(URL)
            .unwrap()
            .with_poll_interval(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::InvalidPollInterval));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert_eq!(
            UpdaterConfig::from_json_str(&format!(r#"{{"url": "{URL}", "timeoutSecs": 0}}"#)),
            Err(ConfigError::InvalidTimeout)
        );

        let config = UpdaterConfig::new(URL).unwrap().with_timeout(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeout));
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(UpdaterConfig::new(URL).unwrap().validate(), Ok(()));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            ConfigError::MissingUrl.to_string(),
            "missing mandatory 'url' parameter"
        );
    }
}
