//! Scripted fetcher for testing without a live feed.
//!
//! Serves a queue of canned responses, one per fetch, so tests and local runs
//! can drive the updater through a precise sequence of snapshots.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::client::Fetcher;
use super::error::FetchError;

/// One scripted fetch outcome.
#[derive(Debug)]
pub enum MockResponse {
    /// The source returned these bytes.
    Body(Vec<u8>),
    /// The source answered with nothing.
    Empty,
    /// The source failed.
    Error(FetchError),
}

/// Fetcher that replays scripted responses in order.
///
/// Once the script is exhausted every further fetch returns no data.
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
}

impl MockFetcher {
    /// Create a fetcher that replays `responses` in order.
    pub fn new(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
        }
    }

    /// Create a fetcher that serves each JSON document once, in order.
    pub fn from_documents<S: Into<String>>(documents: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            documents
                .into_iter()
                .map(|doc| MockResponse::Body(doc.into().into_bytes())),
        )
    }

    /// Create a fetcher that serves the contents of each file once, in order.
    ///
    /// Useful for replaying captured feeds.
    pub fn from_files<P: AsRef<Path>>(
        paths: impl IntoIterator<Item = P>,
    ) -> std::io::Result<Self> {
        let bodies = paths
            .into_iter()
            .map(|path| std::fs::read(path).map(MockResponse::Body))
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self::new(bodies))
    }

    /// Append a response to the end of the script.
    pub async fn push(&self, response: MockResponse) {
        self.responses.lock().await.push_back(response);
    }

    /// Number of scripted responses not yet served.
    pub async fn remaining(&self) -> usize {
        self.responses.lock().await.len()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self) -> Result<Option<Vec<u8>>, FetchError> {
        match self.responses.lock().await.pop_front() {
            Some(MockResponse::Body(bytes)) => Ok(Some(bytes)),
            Some(MockResponse::Empty) | None => Ok(None),
            Some(MockResponse::Error(err)) => Err(err),
        }
    }
}
