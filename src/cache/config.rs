//! Cache configuration.
//!
//! Controls the listing cache via the `[cache]` table of `pasar.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_LISTING_TTL_SECS: u64 = 300;
const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Longest accepted listing TTL: one day.
pub const MAX_LISTING_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached listing page, in seconds.
    pub listing_ttl_secs: u64,
    /// Most listing pages held at once; the least recently used page is
    /// dropped first, even before its TTL runs out.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            listing_ttl_secs: DEFAULT_LISTING_TTL_SECS,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    pub fn listing_ttl(&self) -> Duration {
        Duration::from_secs(self.listing_ttl_secs)
    }

    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
