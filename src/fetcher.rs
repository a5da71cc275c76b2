//! HTTP fetching under a global concurrency cap.
//!
//! The module uses a trait-based design, so the orchestrator never depends on
//! a concrete HTTP client:
//! - [`Fetch`]: core trait, `url + timeout -> body | FetchError`
//! - [`HttpFetcher`]: `reqwest`-backed implementation
//! - [`RateLimited`]: decorator that bounds the number of in-flight requests
//!   of any [`Fetch`] implementation with a counting permit pool
//!
//! Failures are never raised as fatal errors; callers decide the record-level
//! fallback.

use crate::errors::FetchError;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

/// A successful response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub status: u16,
    pub body: String,
}

/// Trait for async page fetching.
pub trait Fetch {
    /// Fetch `url`, giving up after `timeout`.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Fetched, FetchError>;
}

/// Wrapper that caps how many fetches of the inner [`Fetch`] run at once.
///
/// Callers beyond the cap suspend until a running fetch completes and
/// releases its permit. Listing and article fetches share one pool.
pub struct RateLimited<T> {
    inner: T,
    permits: Arc<Semaphore>,
    limit: usize,
}

impl<T> RateLimited<T> {
    /// Wrap `inner`, allowing at most `limit` concurrent fetches (minimum 1).
    pub fn new(inner: T, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            inner,
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    #[cfg(test)]
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for RateLimited<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimited")
            .field("limit", &self.limit)
            .field("available", &self.permits.available_permits())
            .finish()
    }
}

impl<T: Fetch> Fetch for RateLimited<T> {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Fetched, FetchError> {
        let wait_t0 = Instant::now();
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        debug!(%url, waited_ms = wait_t0.elapsed().as_millis() as u64, "Acquired fetch permit");
        self.inner.fetch(url, timeout).await
    }
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let user_agent = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }

    fn classify(url: &str, timeout: Duration, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                after: timeout,
            }
        } else if let Some(status) = e.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Fetched, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    after: timeout,
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        debug!(
            %url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(Fetched {
            status: status.as_u16(),
            body,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticFetcher;
    use super::*;
    use futures::future::join_all;

    #[tokio::test]
    async fn test_rate_limited_caps_in_flight() {
        let mut fake = StaticFetcher::new();
        for i in 0..20 {
            fake = fake.ok(&format!("https://x/{i}"), 20, "ok");
        }
        let limited = RateLimited::new(fake, 5);

        let urls: Vec<String> = (0..20).map(|i| format!("https://x/{i}")).collect();
        let results = join_all(
            urls.iter()
                .map(|u| limited.fetch(u, Duration::from_secs(1))),
        )
        .await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(limited.inner().calls(), 20);
        assert!(limited.inner().max_in_flight() <= 5);
        assert!(limited.inner().max_in_flight() >= 2);
    }

    #[tokio::test]
    async fn test_rate_limited_zero_limit_still_progresses() {
        let limited = RateLimited::new(StaticFetcher::new().ok("https://x/a", 0, "a"), 0);
        assert_eq!(limited.limit(), 1);
        let got = limited.fetch("https://x/a", Duration::from_secs(1)).await.unwrap();
        assert_eq!(got.body, "a");
    }

    #[tokio::test]
    async fn test_failures_are_returned_not_raised() {
        let fake = StaticFetcher::new().fail(
            "https://x/slow",
            0,
            FetchError::Timeout {
                url: "https://x/slow".into(),
                after: Duration::from_secs(60),
            },
        );
        let limited = RateLimited::new(fake, 2);
        let err = limited
            .fetch("https://x/slow", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "timeout");

        let missing = limited
            .fetch("https://x/none", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), "status");
    }

    /// Serve one canned HTTP response per accepted connection, after `delay`.
    async fn serve(status_line: &'static str, body: &'static str, delay: Duration) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut read = Vec::new();
                    while !read.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => read.extend_from_slice(&buf[..n]),
                        }
                    }
                    tokio::time::sleep(delay).await;
                    let response = format!(
                        "HTTP/1.1 {status_line}\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}/noticia")
    }

    #[tokio::test]
    async fn test_http_fetcher_success() {
        let url = serve("200 OK", "<p>ok</p>", Duration::ZERO).await;
        let fetcher = HttpFetcher::new().unwrap();
        let got = fetcher.fetch(&url, Duration::from_secs(5)).await.unwrap();
        assert_eq!(got.status, 200);
        assert_eq!(got.body, "<p>ok</p>");
    }

    #[tokio::test]
    async fn test_http_fetcher_non_success_is_status_error() {
        let url = serve("503 Service Unavailable", "busy", Duration::ZERO).await;
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&url, Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err.kind(), "status");
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_http_fetcher_slow_response_is_timeout() {
        let url = serve("200 OK", "late", Duration::from_millis(500)).await;
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.fetch(&url, Duration::from_millis(100)).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert!(matches!(err, FetchError::Timeout { after, .. } if after == Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_http_fetcher_refused_connection_is_transport() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher
            .fetch(&format!("http://{addr}/"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }
}
