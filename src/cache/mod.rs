//! Query cache layer
//!
//! Typed in-memory caches (moka) shared by the list, detail and stats
//! sources. Keys are namespaced strings:
//! - `ads:<encoded filters>` for list pages
//! - `ad:<id>` for single listings
//! - `stats:<period>` for statistics bundles
//!
//! # Usage
//!
//! ```rust,ignore
//! use modqueue::cache::create_cache;
//! use modqueue::config::CacheConfig;
//!
//! let pages = create_cache::<Arc<AdsPage>>(&CacheConfig::default());
//! pages.invalidate_pattern("ads:*").await;
//! ```

pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::{pattern_matches, QueryCache};

/// Key prefix of list pages
pub const LIST_KEY_PREFIX: &str = "ads:";

/// Pattern matching every list page
pub const LIST_KEY_PATTERN: &str = "ads:*";

/// Key of a single listing
pub fn detail_key(id: i64) -> String {
    format!("ad:{}", id)
}

/// Create a cache instance based on configuration
///
/// # Arguments
/// * `config` - Cache configuration with TTL and capacity
///
/// # Returns
/// An `Arc<QueryCache<V>>` that can be shared across tasks
pub fn create_cache<V>(config: &CacheConfig) -> Arc<QueryCache<V>>
where
    V: Clone + Send + Sync + 'static,
{
    tracing::debug!(
        "Creating query cache (capacity {}, ttl {}s)",
        config.max_capacity,
        config.ttl_seconds
    );
    Arc::new(QueryCache::with_capacity_and_ttl(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}
