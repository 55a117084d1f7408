//! Marketplace HTTP Client - Rate-limited REST API Client
//!
//! Wraps reqwest with rate limiting, bounded concurrency, retries and
//! the API key header for all marketplace REST interactions. Errors
//! are mapped straight onto the marketplace port's error type.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::MarketplaceConfig;
use crate::domain::error::MarketplaceError;

/// Configuration for the marketplace HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for the REST API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum concurrent requests.
    pub max_concurrent: usize,
    /// Maximum retries on transient errors.
    pub max_retries: u32,
    /// Base delay between retries (exponential backoff).
    pub retry_base_delay: Duration,
    /// Client-side request budget.
    pub requests_per_second: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.opensea.io/api/v2".to_string(),
            timeout: Duration::from_secs(30),
            max_concurrent: 4,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            requests_per_second: 2,
        }
    }
}

impl From<&MarketplaceConfig> for HttpClientConfig {
    fn from(config: &MarketplaceConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
            max_concurrent: config.max_concurrent,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay(),
            requests_per_second: config.requests_per_second,
        }
    }
}

/// Rate-limited HTTP client for the marketplace REST API.
pub struct MarketplaceHttp {
    /// Underlying HTTP client.
    http: Client,
    /// Parsed base URL.
    base_url: Url,
    /// Value of the `X-API-KEY` header.
    api_key: String,
    /// Client configuration.
    config: HttpClientConfig,
    /// Concurrency limiter.
    semaphore: Arc<Semaphore>,
    /// Request-rate limiter.
    limiter: DefaultDirectRateLimiter,
}

impl MarketplaceHttp {
    /// Create a new client.
    ///
    /// # Errors
    /// Fails on an unparsable base URL or if the HTTP client cannot be built.
    pub fn new(api_key: String, config: HttpClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(5)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid marketplace base URL: {}", config.base_url))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_second(per_second));
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));

        Ok(Self {
            http,
            base_url,
            api_key,
            config,
            semaphore,
            limiter,
        })
    }

    /// Build a URL from path segments, percent-encoding each one.
    pub fn url(&self, segments: &[&str]) -> Result<Url, MarketplaceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| MarketplaceError::Transport("base URL cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON document. Retries on 429, 5xx and transport errors.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, MarketplaceError> {
        let url = self.url(segments)?;
        let request = self.http.get(url).query(query);
        let response = self.execute_with_retry(request, "GET", true).await?;
        decode(response).await
    }

    /// POST a JSON body. Only retried when the server rate-limits us,
    /// since a 5xx may have been processed.
    pub async fn post_json<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, MarketplaceError> {
        let url = self.url(segments)?;
        let request = self.http.post(url).json(body);
        let response = self.execute_with_retry(request, "POST", false).await?;
        decode(response).await
    }

    /// Execute request with API key, rate limiting, and retries.
    async fn execute_with_retry(
        &self,
        request: RequestBuilder,
        method: &str,
        idempotent: bool,
    ) -> Result<Response, MarketplaceError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| MarketplaceError::Transport("HTTP client shut down".into()))?;

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.config.retry_base_delay, attempt);
                debug!(attempt, delay_ms = delay.as_millis(), "Retrying request");
                sleep(delay).await;
            }

            self.limiter.until_ready().await;

            let req = request
                .try_clone()
                .ok_or_else(|| MarketplaceError::Transport("request body not cloneable".into()))?
                .header("X-API-KEY", &self.api_key)
                .header("Accept", "application/json");

            match req.send().await {
                Ok(response) => match response.status() {
                    status if status.is_success() => return Ok(response),
                    StatusCode::NOT_FOUND => {
                        let path = response.url().path().to_string();
                        return Err(MarketplaceError::NotFound(path));
                    }
                    StatusCode::TOO_MANY_REQUESTS => {
                        warn!(method, "Rate limited by marketplace API, backing off");
                        last_error = Some(MarketplaceError::Transport("rate limited".into()));
                    }
                    status if status.is_server_error() && idempotent => {
                        warn!(method, status = %status, "Server error, retrying");
                        last_error = Some(MarketplaceError::Transport(format!("server error: {status}")));
                    }
                    status => {
                        let body = response.text().await.unwrap_or_default();
                        return Err(MarketplaceError::Transport(format!(
                            "API error {status}: {}",
                            truncate(&body, 200)
                        )));
                    }
                },
                Err(e) if idempotent => {
                    warn!(method, error = %e, attempt, "Request failed");
                    last_error = Some(MarketplaceError::Transport(e.to_string()));
                }
                Err(e) => return Err(MarketplaceError::Transport(e.to_string())),
            }
        }

        Err(last_error
            .unwrap_or_else(|| MarketplaceError::Transport("max retries exceeded".into())))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, MarketplaceError> {
    response
        .json::<T>()
        .await
        .map_err(|e| MarketplaceError::Transport(format!("invalid response body: {e}")))
}

/// `base × 2^(attempt-1)`, saturating instead of overflowing.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
