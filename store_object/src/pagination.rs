//! Pagination utilities
//!
//! Listing is always ordered by item id ascending so that consecutive pages
//! are stable. Page size is bounded by [`PageLimits`].

use config::RepositoryConfig;
use serde::{Deserialize, Serialize};

/// Listing request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub offset: u64,
    pub category: Option<String>,
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub offset: u64,
    pub limit: u32,
}

/// Bounds applied to every listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl PageLimits {
    pub fn new(default_page_size: u32, max_page_size: u32) -> Self {
        Self {
            default_page_size: default_page_size.min(max_page_size),
            max_page_size,
        }
    }

    /// Effective page size: default when absent, silently clamped to the maximum
    pub fn resolve(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self::from(&RepositoryConfig::default())
    }
}

impl From<&RepositoryConfig> for PageLimits {
    fn from(config: &RepositoryConfig) -> Self {
        Self::new(config.default_page_size, config.max_page_size)
    }
}
