//! In-memory query cache using moka
//!
//! Each cache holds values of one type under string query keys.
//!
//! # Features
//! - TTL-based expiration for each cache entry
//! - Coalesced loading: concurrent loads of one key share a single request
//! - Glob-style pattern matching for bulk invalidation

use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 256;

/// Default TTL for cache entries (5 minutes)
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Typed query cache
///
/// Values are cloned out on every hit, so store `Arc`s for anything large.
pub struct QueryCache<V> {
    cache: Cache<String, V>,
    ttl: Duration,
}

impl<V> std::fmt::Debug for QueryCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache with default settings
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a new cache with custom capacity and TTL
    ///
    /// # Arguments
    /// * `max_capacity` - Maximum number of entries the cache can hold
    /// * `ttl` - Time-to-live for cache entries
    pub fn with_capacity_and_ttl(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a cached value, if present and not expired
    pub async fn get(&self, key: &str) -> Option<V> {
        self.cache.get(key).await
    }

    /// Insert or overwrite a value
    pub async fn insert(&self, key: &str, value: V) {
        self.cache.insert(key.to_string(), value).await;
    }

    /// Return the cached value or run `init` to load it.
    ///
    /// Concurrent callers for the same key wait on one `init` future. Errors
    /// are not cached and are shared between the waiting callers.
    pub async fn try_get_with<F, E>(&self, key: &str, init: F) -> Result<V, Arc<E>>
    where
        F: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        self.cache.try_get_with(key.to_string(), init).await
    }

    /// Drop one key. Missing keys are a no-op.
    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// Drop every key matching a glob-style pattern
    ///
    /// Supports:
    /// - `*` matches any sequence of characters
    /// - `?` matches any single character
    ///
    /// # Examples
    /// - `ads:*` drops every cached list page
    /// - `ad:?` drops single-digit detail entries
    pub async fn invalidate_pattern(&self, pattern: &str) {
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| pattern_matches(pattern, key.as_ref()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in keys {
            self.cache.invalidate(&key).await;
        }
    }

    /// Drop everything
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

impl<V> Default for QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a glob pattern matches a key
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let key_chars: Vec<char> = key.chars().collect();
    glob_match(&pattern_chars, &key_chars)
}

fn glob_match(pattern: &[char], key: &[char]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some(('*', rest)) => {
            // zero characters, or one more and stay on the star
            glob_match(rest, key) || (!key.is_empty() && glob_match(pattern, &key[1..]))
        }
        Some(('?', rest)) => !key.is_empty() && glob_match(rest, &key[1..]),
        Some((c, rest)) => key.first() == Some(c) && glob_match(rest, &key[1..]),
    }
}
