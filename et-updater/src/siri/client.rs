//! SIRI Lite HTTP fetcher.
//!
//! Retrieves the raw estimated-timetable document. Decoding and staleness
//! checks live elsewhere; this module only moves bytes.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use super::error::FetchError;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest error body kept in a [`FetchError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Source of raw feed snapshots.
///
/// `Ok(None)` means the source answered but had nothing to offer, which is
/// not a failure but still produces no update.
pub trait Fetcher {
    /// Fetch the current snapshot.
    fn fetch(&self) -> impl Future<Output = Result<Option<Vec<u8>>, FetchError>> + Send;
}

/// Fetches the feed with an HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    url: Url,
}

impl HttpFetcher {
    /// Create a fetcher for the given URL with a request timeout.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!("et-updater/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, url })
    }

    /// The URL this fetcher polls.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Option<Vec<u8>>, FetchError> {
        let response = self.http.get(self.url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }

        Ok(Some(body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one HTTP response on a local port and hand back the raw request.
    async fn serve_once(response: Vec<u8>) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(&response).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        let url = Url::parse(&format!("http://{addr}/siri-lite/estimated-timetable")).unwrap();
        (url, handle)
    }

    fn response(status_line: &str, body: &str) -> Vec<u8> {
        format!(
            "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .into_bytes()
    }

    fn fetcher(url: Url) -> HttpFetcher {
        HttpFetcher::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn ok_with_body_returns_bytes() {
        let body = r#"{"Siri": {}}"#;
        let (url, server) = serve_once(response("200 OK", body)).await;

        let result = fetcher(url).fetch().await.unwrap();
        assert_eq!(result, Some(body.as_bytes().to_vec()));

        let request = server.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /siri-lite/estimated-timetable "));
        assert!(request.contains("accept: application/json"), "{request}");
    }

    #[tokio::test]
    async fn no_content_is_no_data() {
        let (url, server) = serve_once(
            b"HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_vec(),
        )
        .await;

        assert_eq!(fetcher(url).fetch().await.unwrap(), None);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn empty_body_is_no_data() {
        let (url, server) = serve_once(response("200 OK", "")).await;

        assert_eq!(fetcher(url).fetch().await.unwrap(), None);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn error_status_keeps_truncated_body() {
        let body = "x".repeat(MAX_ERROR_BODY_CHARS + 100);
        let (url, server) = serve_once(response("503 Service Unavailable", &body)).await;

        match fetcher(url).fetch().await {
            Err(FetchError::Status { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("expected status error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[test]
    fn fetcher_creation() {
        let url = Url::parse("https://example.org/siri-lite/estimated-timetable").unwrap();
        let fetcher = HttpFetcher::new(url.clone(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(fetcher.is_ok());
        assert_eq!(fetcher.unwrap().url(), &url);
    }

    #[tokio::test]
    async fn unreachable_host_is_http_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let url = Url::parse("http://127.0.0.1:9/et").unwrap();
        let fetcher = HttpFetcher::new(url, Duration::from_millis(500)).unwrap();

        let result = fetcher.fetch().await;
        assert!(matches!(result, Err(FetchError::Http(_))));
    }
}
