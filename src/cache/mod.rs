//! Discovery cache
//!
//! Persists the exam slugs inferred from a provider's discussion pages so
//! repeated catalog lookups skip the full discussion scan. Entries expire
//! after a configurable TTL (24 hours by default).

mod store;

pub use store::{CacheDocument, CacheEntry, DiscoveryCache};

use crate::config::CacheConfig;
use chrono::Duration;

/// Builds the cache described by `config`, or `None` when caching is disabled
pub fn from_config(config: &CacheConfig, debug: bool) -> Option<DiscoveryCache> {
    if !config.enabled {
        return None;
    }

    let ttl = Duration::hours(i64::from(config.ttl_hours));
    let cache = match &config.path {
        Some(path) => DiscoveryCache::new(path, ttl),
        None => DiscoveryCache::at_default_location(ttl),
    };

    Some(cache.with_debug(debug))
}
