//! Fetch error types.

/// Errors from fetching raw feed bytes.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("feed returned status {status}: {message}")]
    Status { status: u16, message: String },
}
