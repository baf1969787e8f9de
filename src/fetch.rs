//! Page fetching.
//!
//! The crawl and extraction stages are generic over [`Fetch`] so the HTTP
//! client can be swapped for an in-memory site in tests. Fetches are not
//! retried; a failure aborts the current run.

use crate::error::{ScrapeError, ScrapeResult};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Retrieve the body of a page as text.
pub trait Fetch {
    async fn fetch(&self, url: &str) -> ScrapeResult<String>;
}

/// [`Fetch`] implementation backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> ScrapeResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ScrapeError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> ScrapeResult<String> {
        let t0 = Instant::now();
        let transport = |source: reqwest::Error| ScrapeError::Transport {
            url: url.to_string(),
            source,
        };

        let res = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        let body = match res {
            Ok(resp) => resp.text().await.map_err(transport)?,
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "Fetch failed");
                return Err(transport(e));
            }
        };

        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}
