//! HTTP transport to the K2 backend.

use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};

/// Applied when no timeout is configured, so an unreachable backend still resolves.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends one POST per call and hands back the response body.
/// Holds no state besides the connection pool.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    base_url: Url,
}

impl Transport {
    /// Creates a transport rooted at `base_url`, which should end with a slash.
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// POSTs without a body.
    pub async fn post_empty(&self, path: &str) -> Result<String> {
        let url = self.base_url.join(path)?;
        debug!("HTTP POST {}", url);

        self.send(self.client.post(url)).await
    }

    /// POSTs the payload as JSON.
    pub async fn post_json<T>(&self, path: &str, payload: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        let url = self.base_url.join(path)?;
        let body = serde_json::to_string(payload)?;
        debug!("HTTP POST {} body: {}", url, body);

        self.send(
            self.client
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body),
        )
        .await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpStatus(status));
        }

        let body = response.text().await?;
        debug!("HTTP {} body: {}", status, body);

        Ok(body)
    }
}
