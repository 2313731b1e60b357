//! Listing cache.
//!
//! Serialized listing pages are stored under a key derived from the full
//! listing filter and expire after a fixed TTL. Writes to the catalog never
//! invalidate cached pages, so a page can trail the store by up to one TTL.
//! The store is bounded; the least recently used page is evicted first.
//!
//! ```toml
//! [cache]
//! listing_ttl_secs = 300
//! max_entries = 1024
//! ```

mod config;
mod keys;
mod lock;
mod store;

pub use config::{CacheConfig, MAX_LISTING_TTL_SECS};
pub use keys::{CacheKey, LISTING_KEY_VERSION};
pub use store::{CacheError, CacheStore, MemoryCacheStore};

pub const METRIC_LISTING_CACHE_HIT: &str = "pasar_listing_cache_hit_total";
pub const METRIC_LISTING_CACHE_MISS: &str = "pasar_listing_cache_miss_total";
pub const METRIC_LISTING_CACHE_WRITE_FAILED: &str = "pasar_listing_cache_write_failed_total";
