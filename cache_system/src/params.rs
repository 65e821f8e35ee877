//! Cache parameter configuration
//!
//! This module defines the CacheParams struct
//! for configuring key prefix and TTL of a response cache.

use config::CacheConfig;
use std::time::Duration;

/// Cache parameters shared by every entry of one cache
#[derive(Debug, Clone)]
pub struct CacheParams {
    /// TTL applied when the caller does not pick one
    pub ttl: Duration,
    /// Prefix for cache keys
    pub prefix: String,
    /// Disabled caches always miss
    pub enabled: bool,
}

impl CacheParams {
    pub fn new(ttl: Duration, prefix: &str) -> Self {
        Self {
            ttl,
            prefix: prefix.to_string(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl From<&CacheConfig> for CacheParams {
    fn from(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl_duration(),
            prefix: config.key_prefix.clone(),
            enabled: config.enabled,
        }
    }
}
