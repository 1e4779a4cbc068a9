//! List data source
//!
//! Fetches pages of listings keyed by the full filter state:
//! - A cached page is shown at once and always revalidated with a request
//! - Concurrent fetches of one key share a request
//! - While a new key loads, the last resolved page stays visible
//! - A late response for filters that are no longer requested is cached but
//!   never shown
//! - A request that started before an invalidation never writes the cache
//! - Reads are retried once on transient failure

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::api::{get_with_retry, ApiError, ModerationApi};
use crate::cache::{QueryCache, LIST_KEY_PATTERN};
use crate::filters::{cache_key, FilterState};
use crate::models::{Ad, AdsPage};

/// A list request awaited by every concurrent fetch of its key
type PageLoad = Shared<BoxFuture<'static, Result<Arc<AdsPage>, ApiError>>>;

/// Loading phase of the list view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// What the list view should render
#[derive(Debug, Clone, Default)]
pub struct ListState {
    /// Filters of the latest fetch
    pub requested: Option<FilterState>,
    /// Filters the visible page was fetched for
    pub shown_for: Option<FilterState>,
    /// Last resolved page
    pub page: Option<Arc<AdsPage>>,
    pub status: LoadStatus,
    /// Cache generation the visible page was loaded in
    generation: u64,
}

impl ListState {
    /// The visible page belongs to older filters and a newer fetch is pending or failed
    pub fn is_placeholder(&self) -> bool {
        match (&self.page, &self.shown_for, &self.requested) {
            (Some(_), Some(shown), Some(requested)) => cache_key(shown) != cache_key(requested),
            _ => false,
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn ads(&self) -> &[Ad] {
        self.page.as_ref().map(|p| p.ads.as_slice()).unwrap_or(&[])
    }

    /// Ids of the visible listings, in display order
    pub fn ids(&self) -> Vec<i64> {
        self.ads().iter().map(|ad| ad.id).collect()
    }

    /// Total item count of the visible page
    pub fn rendered_total(&self) -> Option<u64> {
        self.page.as_ref().map(|p| p.total_items())
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Cached, stale-while-revalidate source of list pages
pub struct ListDataSource {
    api: Arc<dyn ModerationApi>,
    cache: Arc<QueryCache<Arc<AdsPage>>>,
    state: RwLock<ListState>,
    /// Requests in flight per cache key, tagged with the generation they started in
    in_flight: Mutex<HashMap<String, (u64, PageLoad)>>,
    /// Bumped by every invalidation
    generation: AtomicU64,
}

impl ListDataSource {
    /// Create a new list data source
    ///
    /// # Arguments
    /// * `api` - Moderation API client
    /// * `cache` - Page cache, shared with whoever invalidates list pages
    pub fn new(api: Arc<dyn ModerationApi>, cache: Arc<QueryCache<Arc<AdsPage>>>) -> Self {
        Self {
            api,
            cache,
            state: RwLock::new(ListState::default()),
            in_flight: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the view state
    pub async fn state(&self) -> ListState {
        self.state.read().await.clone()
    }

    /// Fetch the page for `filters` and make it the requested view
    ///
    /// A cached page for `filters` is shown right away while the request
    /// revalidates it. The view state only takes the response if `filters`
    /// is still the latest request when it resolves.
    ///
    /// # Errors
    /// The request's [`ApiError`] after at most one retry. The previously
    /// visible page stays in the view state.
    pub async fn fetch(&self, filters: &FilterState) -> Result<Arc<AdsPage>, ApiError> {
        let key = cache_key(filters);
        let cached = self.cache.get(&key).await;
        {
            let mut state = self.state.write().await;
            state.requested = Some(filters.clone());
            state.status = LoadStatus::Loading;
            if let Some(page) = cached {
                tracing::debug!("Showing cached {} while revalidating", key);
                state.page = Some(page);
                state.shown_for = Some(filters.clone());
                state.generation = self.generation.load(Ordering::Acquire);
            }
        }

        let (generation, load) = self.start_load(&key, filters).await;
        let result = load.await;
        self.finish_load(&key, filters, generation, result).await
    }

    /// Join the request in flight for `key`, or send a new one
    async fn start_load(&self, key: &str, filters: &FilterState) -> (u64, PageLoad) {
        let mut in_flight = self.in_flight.lock().await;
        let generation = self.generation.load(Ordering::Acquire);
        if let Some((started, load)) = in_flight.get(key) {
            if *started == generation {
                tracing::debug!("Joining request in flight for {}", key);
                return (generation, load.clone());
            }
        }

        tracing::debug!("Fetching {}", key);
        let api = self.api.clone();
        let filters = filters.clone();
        let load = async move {
            get_with_retry("ad list", || api.list_ads(&filters))
                .await
                .map(Arc::new)
        }
        .boxed()
        .shared();
        in_flight.insert(key.to_string(), (generation, load.clone()));
        (generation, load)
    }

    async fn finish_load(
        &self,
        key: &str,
        filters: &FilterState,
        generation: u64,
        result: Result<Arc<AdsPage>, ApiError>,
    ) -> Result<Arc<AdsPage>, ApiError> {
        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight.get(key).is_some_and(|(started, _)| *started == generation) {
                in_flight.remove(key);
            }
        }
        if let Ok(page) = &result {
            self.store(key, page, generation).await;
        }

        let mut state = self.state.write().await;
        let still_requested = state
            .requested
            .as_ref()
            .is_some_and(|requested| cache_key(requested) == key);
        if !still_requested || generation < state.generation {
            tracing::debug!("Discarding stale result for {}", key);
            return result;
        }
        match &result {
            Ok(page) => {
                state.page = Some(page.clone());
                state.shown_for = Some(filters.clone());
                state.status = LoadStatus::Ready;
                state.generation = generation;
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", key, e);
                state.status = LoadStatus::Failed(e.to_string());
            }
        }
        result
    }

    /// Cache `page` unless the list was invalidated since its request started
    async fn store(&self, key: &str, page: &Arc<AdsPage>, generation: u64) {
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!("Not caching {}: invalidated while loading", key);
            return;
        }
        self.cache.insert(key, page.clone()).await;
        // an invalidation can land during the insert
        if self.generation.load(Ordering::Acquire) != generation {
            self.cache.invalidate(key).await;
        }
    }

    /// Drop every cached page and fetch the current filters again
    ///
    /// Never joins a request that was already in flight.
    pub async fn refresh(&self) -> Result<Arc<AdsPage>, ApiError> {
        let filters = self.state.read().await.requested.clone().unwrap_or_default();
        self.invalidate_all().await;
        self.fetch(&filters).await
    }

    /// Drop every cached page and detach requests in flight from the cache
    pub async fn invalidate_all(&self) {
        tracing::debug!("Invalidating cached list pages");
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.in_flight.lock().await.clear();
        self.cache.invalidate_pattern(LIST_KEY_PATTERN).await;
    }
}
