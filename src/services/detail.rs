//! Detail view source
//!
//! `fetch_one` reads a single listing; `watch` keeps re-reading it on an
//! interval so decisions made elsewhere show up. A missing listing is
//! terminal: it is never retried and ends the polling.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::{get_with_retry, ApiError, ModerationApi};
use crate::cache::{detail_key, QueryCache};
use crate::models::Ad;

/// What the detail view should render
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Ready(Arc<Ad>),
    NotFound,
    Failed(String),
}

impl DetailState {
    pub fn ad(&self) -> Option<&Arc<Ad>> {
        match self {
            DetailState::Ready(ad) => Some(ad),
            _ => None,
        }
    }
}

/// Source of single listings
#[derive(Clone)]
pub struct AdDetailSource {
    api: Arc<dyn ModerationApi>,
    cache: Arc<QueryCache<Arc<Ad>>>,
    interval: Duration,
}

impl AdDetailSource {
    /// Create a new detail source
    ///
    /// # Arguments
    /// * `api` - Moderation API client
    /// * `cache` - Detail cache, shared with the decision service
    /// * `interval` - Refresh interval of [`AdDetailSource::watch`]
    pub fn new(
        api: Arc<dyn ModerationApi>,
        cache: Arc<QueryCache<Arc<Ad>>>,
        interval: Duration,
    ) -> Self {
        Self { api, cache, interval }
    }

    /// Read listing `id` from the API and refresh its cache entry
    ///
    /// # Errors
    /// `ApiError::NotFound` when the listing does not exist, without a retry.
    /// Other failures are retried once when transient.
    pub async fn fetch_one(&self, id: i64) -> Result<Arc<Ad>, ApiError> {
        let key = detail_key(id);
        match get_with_retry("ad detail", || self.api.get_ad(id)).await {
            Ok(ad) => {
                let ad = Arc::new(ad);
                self.cache.insert(&key, ad.clone()).await;
                Ok(ad)
            }
            Err(e) => {
                if e.is_not_found() {
                    self.cache.invalidate(&key).await;
                }
                Err(e)
            }
        }
    }

    /// Last listing read for `id`, if still cached
    pub async fn cached(&self, id: i64) -> Option<Arc<Ad>> {
        self.cache.get(&detail_key(id)).await
    }

    /// Poll listing `id` until the watch is dropped or the listing is gone
    pub fn watch(&self, id: i64) -> DetailWatch {
        let (tx, rx) = watch::channel(DetailState::Loading);
        let source = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(source.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match source.fetch_one(id).await {
                    Ok(ad) => {
                        tx.send_replace(DetailState::Ready(ad));
                    }
                    Err(e) if e.is_not_found() => {
                        tracing::info!("Ad {} no longer exists, stopping refresh", id);
                        tx.send_replace(DetailState::NotFound);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to refresh ad {}: {}", id, e);
                        // a loaded listing stays on screen
                        tx.send_if_modified(|state| {
                            if state.ad().is_some() {
                                return false;
                            }
                            *state = DetailState::Failed(e.to_string());
                            true
                        });
                    }
                }
            }
        });

        DetailWatch { task, state: rx }
    }
}

/// Running detail poller; dropping it stops the polling
#[derive(Debug)]
pub struct DetailWatch {
    task: JoinHandle<()>,
    state: watch::Receiver<DetailState>,
}

impl DetailWatch {
    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    /// Wait for the next state change. `None` once polling has ended.
    pub async fn changed(&mut self) -> Option<DetailState> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    /// Whether polling has stopped for good
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for DetailWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Id of the previous listing, if there is one
pub fn previous_id(id: i64) -> Option<i64> {
    (id > 1).then(|| id - 1)
}

/// Id of the next listing
pub fn next_id(id: i64) -> i64 {
    id + 1
}
