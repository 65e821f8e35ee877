//! Cache system for request-keyed response caching
//!
//! This crate provides an in-process, TTL-bounded response cache
//! with deterministic key derivation and pattern invalidation.

pub mod errors;
pub mod key;
pub mod manager;
pub mod params;
pub mod prelude;

// Re-export centralized config
pub use config::CacheConfig;

pub use errors::CacheError;
pub use key::{CacheKey, KeyPattern};
pub use manager::{CacheManager, CacheStats};
pub use params::CacheParams;
