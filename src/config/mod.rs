//! Configuration module for Exam-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All settings have defaults, so a harvest can run without any file.
//!
//! # Example
//!
//! ```no_run
//! use exam_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Requests per second: {}", config.crawler.requests_per_second);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CacheConfig, Config, CrawlerConfig, HttpConfig, SiteConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
