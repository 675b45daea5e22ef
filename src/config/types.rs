use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Exam-Harvest
///
/// Every section is optional in the TOML file; missing keys fall back to the
/// defaults below, so `Config::default()` is a complete working setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enables per-unit diagnostic logging in the fetcher and coordinator.
    /// Read once at construction.
    pub debug: bool,
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub site: SiteConfig,
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            crawler: CrawlerConfig::default(),
            http: HttpConfig::default(),
            site: SiteConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of in-flight page fetches per phase
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Aggregate outbound request rate shared by every worker
    #[serde(rename = "requests-per-second")]
    pub requests_per_second: f64,

    /// Retries after the first attempt (503 or connection failures only)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "initial-backoff-ms")]
    pub initial_backoff_ms: u64,

    /// Multiplier applied to the backoff after each retry
    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,

    /// Upper bound of the random jitter added to each retry delay (milliseconds)
    #[serde(rename = "max-jitter-ms")]
    pub max_jitter_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Attempts at reading the discussion index during provider discovery
    #[serde(rename = "provider-discovery-attempts")]
    pub provider_discovery_attempts: u32,

    /// Pause between provider discovery attempts (milliseconds)
    #[serde(rename = "provider-discovery-pause-ms")]
    pub provider_discovery_pause_ms: u64,

    /// Provider count considered adequate when the page declares no category count
    #[serde(rename = "provider-floor")]
    pub provider_floor: usize,

    /// Share of declared categories that must be represented
    #[serde(rename = "category-coverage")]
    pub category_coverage: f64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 15,
            requests_per_second: 2.0,
            max_retries: 3,
            initial_backoff_ms: 1000,
            backoff_factor: 2.0,
            max_jitter_ms: 500,
            request_timeout_secs: 20,
            provider_discovery_attempts: 3,
            provider_discovery_pause_ms: 600,
            provider_floor: 150,
            category_coverage: 0.8,
        }
    }
}

impl CrawlerConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn provider_discovery_pause(&self) -> Duration {
        Duration::from_millis(self.provider_discovery_pause_ms)
    }
}

/// Request headers and connection pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    pub accept: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,

    pub referer: String,

    /// Idle keep-alive connections retained per host
    #[serde(rename = "pool-max-idle-per-host")]
    pub pool_max_idle_per_host: usize,

    #[serde(rename = "pool-idle-timeout-secs")]
    pub pool_idle_timeout_secs: u64,

    /// Bounds TCP connect plus TLS handshake
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            referer: "https://www.examtopics.com/".to_string(),
            pool_max_idle_per_host: 100,
            pool_idle_timeout_secs: 90,
            connect_timeout_secs: 10,
        }
    }
}

/// The one host the crawler talks to
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.examtopics.com".to_string(),
        }
    }
}

/// Discovery cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Overrides the per-user cache location
    pub path: Option<PathBuf>,

    #[serde(rename = "ttl-hours")]
    pub ttl_hours: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            ttl_hours: 24,
        }
    }
}
