//! HTTP fetcher implementation
//!
//! This module handles every outbound request the crawler makes:
//! - Building one pooled HTTP client with browser-like default headers
//! - Throttling all requests through a shared rate limiter
//! - Retrying connection failures and 503 responses with backoff and jitter
//! - Treating every other non-success status as terminal

use crate::config::{CrawlerConfig, HttpConfig};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Why a single attempt produced no body
#[derive(Debug)]
pub enum FetchFailure {
    /// Connection-level failure (refused, reset, timeout, TLS)
    Transport(reqwest::Error),

    /// Non-success HTTP status
    Status(StatusCode),

    /// The body could not be read
    Body(reqwest::Error),
}

impl FetchFailure {
    /// Only transport failures and 503 are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchFailure::Transport(_) => true,
            FetchFailure::Status(status) => *status == StatusCode::SERVICE_UNAVAILABLE,
            FetchFailure::Body(_) => false,
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Transport(e) => write!(f, "request failed: {}", e),
            FetchFailure::Status(status) => write!(f, "HTTP {}", status.as_u16()),
            FetchFailure::Body(e) => write!(f, "failed to read body: {}", e),
        }
    }
}

/// Retry budget and backoff curve
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub backoff_factor: f64,
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff(),
            backoff_factor: config.backoff_factor,
            max_jitter: Duration::from_millis(config.max_jitter_ms),
        }
    }

    /// Backoff before retry number `retry` (0-based), without jitter
    ///
    /// # Examples
    ///
    /// ```
    /// use exam_harvest::crawler::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy {
    ///     max_retries: 3,
    ///     initial_backoff: Duration::from_secs(1),
    ///     backoff_factor: 2.0,
    ///     max_jitter: Duration::ZERO,
    /// };
    /// assert_eq!(policy.backoff(0), Duration::from_secs(1));
    /// assert_eq!(policy.backoff(2), Duration::from_secs(4));
    /// ```
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        self.initial_backoff
            .mul_f64(self.backoff_factor.powi(exponent).min(1e6))
    }

    fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }

    /// Full delay before retry number `retry`: backoff plus random jitter
    pub fn delay(&self, retry: u32) -> Duration {
        self.backoff(retry) + self.jitter()
    }
}

/// Builds the shared HTTP client
///
/// # Arguments
///
/// * `http` - Header and connection pool settings
/// * `crawler` - Supplies the whole-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use exam_harvest::config::{CrawlerConfig, HttpConfig};
/// use exam_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(http: &HttpConfig, crawler: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    insert_header(&mut headers, ACCEPT, &http.accept);
    insert_header(&mut headers, ACCEPT_LANGUAGE, &http.accept_language);
    insert_header(&mut headers, REFERER, &http.referer);

    Client::builder()
        .user_agent(http.user_agent.clone())
        .default_headers(headers)
        .timeout(crawler.request_timeout())
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Duration::from_secs(http.pool_idle_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

fn insert_header(headers: &mut HeaderMap, name: reqwest::header::HeaderName, value: &str) {
    if value.is_empty() {
        return;
    }
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!("Ignoring invalid {} header value", name),
    }
}

/// Builds a limiter releasing one request every `1 / requests_per_second`
pub fn build_rate_limiter(requests_per_second: f64) -> DefaultDirectRateLimiter {
    let period = if requests_per_second.is_finite() && requests_per_second > 0.0 {
        Duration::try_from_secs_f64(1.0 / requests_per_second).unwrap_or(Duration::from_secs(3600))
    } else {
        Duration::from_secs(1)
    };

    let quota = Quota::with_period(period).unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));
    RateLimiter::direct(quota)
}

/// Rate-limited, retrying page fetcher
///
/// Cloning is cheap; clones share the client pool and the rate limiter, so
/// the configured request rate holds across every worker.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Arc<DefaultDirectRateLimiter>,
    policy: RetryPolicy,
    debug: bool,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("policy", &self.policy)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Creates a fetcher from configuration
    pub fn new(http: &HttpConfig, crawler: &CrawlerConfig, debug: bool) -> Result<Self, reqwest::Error> {
        let client = build_http_client(http, crawler)?;
        Ok(Self::with_client(client, crawler, debug))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, crawler: &CrawlerConfig, debug: bool) -> Self {
        Self {
            client,
            limiter: Arc::new(build_rate_limiter(crawler.requests_per_second)),
            policy: RetryPolicy::from_config(crawler),
            debug,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL and returns its body, or `None` if no attempt succeeded
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return body |
    /// | HTTP 503 | Retry with backoff |
    /// | Connection failure / timeout | Retry with backoff |
    /// | Any other status | Immediate → `None` |
    /// | Body read failure | Immediate → `None` |
    ///
    /// Every attempt waits on the shared rate limiter first.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let mut retry = 0;

        loop {
            self.limiter.until_ready().await;

            let failure = match self.attempt(url).await {
                Ok(body) => return Some(body),
                Err(failure) => failure,
            };

            if !failure.is_retryable() || retry >= self.policy.max_retries {
                if self.debug {
                    tracing::debug!("Giving up on {} after {} retries: {}", url, retry, failure);
                }
                return None;
            }

            let delay = self.policy.delay(retry);
            if self.debug {
                tracing::debug!(
                    "Retrying {} in {:?} (retry {}/{}): {}",
                    url,
                    delay,
                    retry + 1,
                    self.policy.max_retries,
                    failure
                );
            }
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }

    async fn attempt(&self, url: &str) -> Result<String, FetchFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchFailure::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status));
        }

        response.text().await.map_err(FetchFailure::Body)
    }
}
