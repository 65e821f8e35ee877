//! Cache manager implementation
//!
//! This module provides the main CacheManager struct: an in-process,
//! TTL-bounded store of serialized read responses.
//!
//! Expiry is lazy. An entry past its TTL is reported as a miss and removed
//! on that same access; nothing sweeps in the background unless the owner
//! calls [`CacheManager::purge_expired`].

use crate::errors::CacheError;
use crate::key::{CacheKey, KeyPattern};
use crate::params::CacheParams;
use config::CacheConfig;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

struct CacheEntry {
    payload: Value,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= self.ttl
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    /// Puts dropped because an invalidation raced the read that produced them
    pub stale_puts: u64,
    /// Entries removed because their TTL lapsed
    pub expirations: u64,
    /// Entries removed by explicit invalidation
    pub invalidations: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    stale_puts: AtomicU64,
    expirations: AtomicU64,
    invalidations: AtomicU64,
}

/// In-process response cache
pub struct CacheManager {
    entries: DashMap<String, CacheEntry>,
    /// Bumped by every invalidation; puts and invalidations serialize on it
    generation: Mutex<u64>,
    params: CacheParams,
    counters: Counters,
}

impl Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("params", &self.params)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new(params: CacheParams) -> Self {
        Self {
            entries: DashMap::new(),
            generation: Mutex::new(0),
            params,
            counters: Counters::default(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(CacheParams::from(config))
    }

    /// Derive the key for a request against this cache's prefix
    pub fn key<I, K, V>(&self, method: &str, path: &str, query: I) -> CacheKey
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        CacheKey::derive(&self.params.prefix, method, path, query)
    }

    /// Pattern for every query variant of `path`
    pub fn family(&self, method: &str, path: &str) -> KeyPattern {
        KeyPattern::family(&self.params.prefix, method, path)
    }

    /// Pattern for `path` and everything below it
    pub fn subtree(&self, method: &str, path: &str) -> KeyPattern {
        KeyPattern::subtree(&self.params.prefix, method, path)
    }

    /// Look up a cached payload; expired entries count as a miss and are evicted
    pub fn get<T>(&self, key: &CacheKey) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        if !self.params.enabled {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        let now = Instant::now();
        let fresh = match self.entries.get(key.as_str()) {
            Some(entry) if !entry.is_expired(now) => Some(entry.payload.clone()),
            Some(_) => None,
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
        };

        match fresh {
            Some(payload) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(serde_json::from_value(payload)?))
            }
            None => {
                // Re-check under the shard lock so a concurrent fresh put survives
                if self
                    .entries
                    .remove_if(key.as_str(), |_, entry| entry.is_expired(now))
                    .is_some()
                {
                    self.counters.expirations.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(key = %key, "evicted expired cache entry");
                }
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    /// Store a payload under `key` for `ttl`
    pub fn put<T>(&self, key: &CacheKey, value: &T, ttl: Duration) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let _guard = self.generation.lock().map_err(|_| CacheError::Poisoned)?;
        self.insert(key, value, ttl)
    }

    /// Store a payload with the default TTL
    pub fn put_default<T>(&self, key: &CacheKey, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        self.put(key, value, self.params.ttl)
    }

    /// Current invalidation generation
    ///
    /// Read it before querying the source of truth and hand it to
    /// [`CacheManager::put_if_fresh`] afterwards.
    pub fn generation(&self) -> Result<u64, CacheError> {
        let generation = self.generation.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(*generation)
    }

    /// Store a payload only if no invalidation happened since `observed`
    ///
    /// Returns whether the payload was stored.
    pub fn put_if_fresh<T>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
        observed: u64,
    ) -> Result<bool, CacheError>
    where
        T: Serialize,
    {
        let generation = self.generation.lock().map_err(|_| CacheError::Poisoned)?;
        if *generation != observed {
            self.counters.stale_puts.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, observed, current = *generation, "dropped stale cache put");
            return Ok(false);
        }
        self.insert(key, value, ttl)?;
        Ok(self.params.enabled)
    }

    fn insert<T>(&self, key: &CacheKey, value: &T, ttl: Duration) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl(ttl));
        }
        if !self.params.enabled {
            return Ok(());
        }

        let payload = serde_json::to_value(value)?;
        self.entries.insert(
            key.as_str().to_string(),
            CacheEntry {
                payload,
                inserted_at: Instant::now(),
                ttl,
            },
        );
        self.counters.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Remove every entry matching `pattern`; returns how many were removed
    pub fn invalidate(&self, pattern: &KeyPattern) -> Result<usize, CacheError> {
        let mut generation = self.generation.lock().map_err(|_| CacheError::Poisoned)?;
        *generation += 1;

        let removed = match pattern {
            KeyPattern::Exact(key) => usize::from(self.entries.remove(key).is_some()),
            KeyPattern::Prefix(_) => {
                let matching: Vec<String> = self
                    .entries
                    .iter()
                    .filter(|entry| pattern.matches(entry.key()))
                    .map(|entry| entry.key().clone())
                    .collect();
                matching
                    .iter()
                    .filter(|key| self.entries.remove(key.as_str()).is_some())
                    .count()
            }
        };

        self.counters
            .invalidations
            .fetch_add(removed as u64, Ordering::Relaxed);
        tracing::debug!(pattern = %pattern, removed, "invalidated cache entries");
        Ok(removed)
    }

    /// Drop every expired entry now; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        self.counters
            .expirations
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            puts: self.counters.puts.load(Ordering::Relaxed),
            stale_puts: self.counters.stale_puts.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
        }
    }

    /// Get current parameters
    pub fn params(&self) -> &CacheParams {
        &self.params
    }
}
