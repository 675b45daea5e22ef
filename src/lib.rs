//! Exam-Harvest: a discussion-site question harvester
//!
//! This crate crawls an exam-discussion site and assembles a deduplicated,
//! stably ordered set of question records for one provider and exam. It
//! covers a rate-limited retrying fetcher, markup extraction, exam slug
//! normalization, a TTL-backed discovery cache and the crawl orchestration
//! that ties them together.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod slug;
pub mod url;

use thiserror::Error;

/// Main error type for Exam-Harvest operations
///
/// Only the orchestrator's top-level entry points surface these. Per-page and
/// per-question failures shrink the result set instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("No providers could be discovered")]
    NoProviders,

    #[error("Invalid provider id: {0:?}")]
    InvalidProvider(String),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Exam-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::DiscoveryCache;
pub use config::Config;
pub use crawler::{Coordinator, CrawlOutcome, ExamCatalog, ProviderSet};
pub use model::{AnswerOption, Comment, DiscussionLink, QuestionRecord};
pub use slug::{matches_selection, normalize_exam_slug};
