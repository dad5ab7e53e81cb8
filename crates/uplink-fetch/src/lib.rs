//! uplink-fetch — retrieval of satellite source text.
//!
//! A satellite location is an absolute URL; the fetcher issues a plain
//! GET and returns the body as source text. The declared Content-Length
//! is checked against the size ceiling before the body is read, so an
//! oversized satellite is rejected without transferring it. An upstream
//! error status is reported with the fetched body as diagnostic
//! context.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tracing::debug;
use uplink_core::FetchError;

/// HTTP fetcher for satellite source, with a size ceiling and request
/// timeout.
pub struct SatelliteFetcher {
    client: Client,
    max_size: usize,
}

impl SatelliteFetcher {
    /// Build a fetcher enforcing `max_size` on declared satellite size,
    /// with `timeout` covering the whole fetch.
    pub fn new(max_size: usize, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, max_size })
    }

    /// Fetch satellite source text from `location`.
    pub async fn fetch(&self, location: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let size = declared_length(&response)?;
        if size > self.max_size {
            return Err(FetchError::TooLarge {
                limit: self.max_size,
                size,
            });
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!(%location, bytes = body.len(), "satellite source fetched");
        Ok(body)
    }
}

fn declared_length(response: &reqwest::Response) -> Result<usize, FetchError> {
    let header = response
        .headers()
        .get(CONTENT_LENGTH)
        .ok_or_else(|| FetchError::MissingLength("header not present".to_string()))?;
    header
        .to_str()
        .map_err(|e| FetchError::MissingLength(e.to_string()))?
        .parse::<usize>()
        .map_err(|e| FetchError::MissingLength(e.to_string()))
}
