//! Crawler module for page fetching and record harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry, backoff and a shared rate limiter
//! - Markup extraction for listing and question pages
//! - A bounded worker pool for concurrent fan-out
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
pub mod parser;
mod scheduler;

pub use coordinator::{Coordinator, CrawlOutcome, ExamCatalog, ProviderSet, ALL_DISCUSSIONS};
pub use fetcher::{build_http_client, build_rate_limiter, FetchFailure, Fetcher, RetryPolicy};
pub use scheduler::{Progress, WorkerPool};
