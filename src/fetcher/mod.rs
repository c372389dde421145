//! Announcements endpoint poller
//!
//! One bounded request per tick, no retries, no redirects. Every outcome,
//! including transport failures, is normalized into a [`PollResult`]; the
//! fetch itself never returns an error.

pub mod headers;
pub mod url;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ETAG};
use reqwest::{redirect, Client};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::models::{NoticeSummary, PollResult, MISSING_HEADER};
use crate::scheduler::Clock;
use crate::utils::error::FetchError;

use self::headers::HeaderProvider;

/// Server-reported processing time header
const X_RUNTIME: &str = "x-runtime";

/// Source of one [`PollResult`] per call
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self) -> PollResult;
}

/// Endpoint and timeouts for [`NoticeFetcher`]
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub api_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            api_url: url::DEFAULT_API_URL.to_string(),
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(3),
        }
    }
}

/// reqwest-backed fetcher for the announcements endpoint
pub struct NoticeFetcher {
    /// HTTP client with fixed timeouts and redirects disabled
    client: Client,

    /// Parsed endpoint, query replaced on every request
    endpoint: ::url::Url,

    /// Randomized headers and anti-cache token
    headers: Arc<dyn HeaderProvider>,

    /// Wall-clock source for the cache token; latency uses a monotonic timer
    clock: Arc<dyn Clock>,
}

impl NoticeFetcher {
    /// Create a new fetcher
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for an unusable endpoint and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn new(
        config: &FetcherConfig,
        headers: Arc<dyn HeaderProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FetchError> {
        let endpoint = url::parse_endpoint(&config.api_url)?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .redirect(redirect::Policy::none())
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            headers,
            clock,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Issue one request and normalize the outcome
    pub async fn poll(&self) -> PollResult {
        let token = self.headers.cache_token((self.clock.now() * 1000.0) as i64);
        let started = Instant::now();
        let request_url = url::build_request_url(&self.endpoint, &token).to_string();

        let response = self
            .client
            .get(&request_url)
            .headers(self.headers.headers())
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let err = FetchError::classify(e);
                return self.failed(err, started, request_url);
            }
        };

        let status = response.status().as_u16();
        let etag = header_or_dash(response.headers(), ETAG.as_str());
        let server_runtime = header_or_dash(response.headers(), X_RUNTIME);

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                let err = FetchError::Body(e.to_string());
                return self.failed(err, started, request_url);
            }
        };

        let latency_ms = elapsed_ms(started);
        let top_notice = if status == 200 {
            parse_top_notice(&body)
        } else {
            None
        };

        tracing::info!(
            status,
            latency_ms = %format!("{latency_ms:.1}"),
            size = body.len(),
            etag = %etag,
            x_runtime = %server_runtime,
            "req"
        );

        let result = PollResult::response(status, top_notice, latency_ms, request_url)
            .with_etag(etag)
            .with_server_runtime(server_runtime)
            .with_body_size(body.len());

        crate::metrics::record_poll(result.outcome(), latency_ms);
        result
    }

    fn failed(&self, err: FetchError, started: Instant, request_url: String) -> PollResult {
        let latency_ms = elapsed_ms(started);
        tracing::warn!(
            latency_ms = %format!("{latency_ms:.1}"),
            error = %err,
            "req failed"
        );

        let result = PollResult::transport_error(err.to_string(), latency_ms, request_url);
        crate::metrics::record_poll(result.outcome(), latency_ms);
        result
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[async_trait]
impl Fetch for NoticeFetcher {
    async fn fetch(&self) -> PollResult {
        self.poll().await
    }
}

fn header_or_dash(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| MISSING_HEADER.to_string())
}

/// First record of `data.notices`, if the body has that shape
///
/// Anything else (invalid JSON, missing keys, empty list) yields `None`.
pub fn parse_top_notice(body: &[u8]) -> Option<NoticeSummary> {
    let value: Value = serde_json::from_slice(body).ok()?;

    value
        .get("data")?
        .get("notices")?
        .as_array()?
        .first()
        .filter(|record| record.is_object())
        .map(NoticeSummary::from_value)
}
