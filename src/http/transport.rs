//! HTTP transport with the single-retry policy
//!
//! A request that completes with a non-success status is retried exactly
//! once after a fixed sleep, then fails with the status and body. There is
//! no backoff and no status classification; connection-level errors are not
//! retried.

use super::rate_limit::RateLimiter;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Capability interface for issuing API requests
///
/// The client depends on this trait rather than a concrete HTTP stack so
/// tests can substitute canned responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET and parse the JSON body
    async fn get_json(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> Result<JsonValue>;
}

/// Transport backed by reqwest
pub struct HttpTransport {
    client: Client,
    retry_sleep: Duration,
    rate_limiter: Option<RateLimiter>,
}

impl HttpTransport {
    /// Build a transport from the API configuration
    pub fn new(config: &ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(format!("ezyvet-sync/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        let rate_limiter = config
            .rate_limit
            .as_ref()
            .map(|rl| RateLimiter::new(rl.requests_per_second, rl.burst_size));

        Self {
            client,
            retry_sleep: Duration::from_secs(config.retry_sleep_seconds),
            rate_limiter,
        }
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    async fn send(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> Result<reqwest::Response> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self.client.get(url);
        for (key, value) in headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !params.is_empty() {
            req = req.query(params);
        }
        Ok(req.send().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &HashMap<String, String>,
    ) -> Result<JsonValue> {
        let response = self.send(url, params, headers).await?;
        let status = response.status();

        let response = if status.is_success() {
            response
        } else {
            warn!(
                "Server replied with status code {}. Retrying in {}s.",
                status.as_u16(),
                self.retry_sleep.as_secs()
            );
            tokio::time::sleep(self.retry_sleep).await;

            let retried = self.send(url, params, headers).await?;
            let retried_status = retried.status();
            if !retried_status.is_success() {
                let body = retried.text().await.unwrap_or_default();
                warn!("Retry failed with status {}: {}", retried_status.as_u16(), body);
                return Err(Error::http_status(retried_status.as_u16(), body));
            }
            retried
        };

        debug!("Request succeeded: GET {url}");
        let json: JsonValue = response.json().await.map_err(Error::Http)?;
        Ok(json)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("retry_sleep", &self.retry_sleep)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
