//! New-items detection
//!
//! While the moderator looks at the first page of the unsearched,
//! uncategorized queue, the remote total is polled in the background. The
//! visible list is never replaced; the difference between the polled and the
//! rendered total is offered as a "new items" notice instead.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::ModerationApi;
use crate::filters::FilterState;

/// Spawns pollers of the remote item total
pub struct NewItemsWatcher {
    api: Arc<dyn ModerationApi>,
    interval: Duration,
}

impl NewItemsWatcher {
    pub fn new(api: Arc<dyn ModerationApi>, interval: Duration) -> Self {
        Self { api, interval }
    }

    /// Request used to read the total: first page, one item, no filters
    pub fn count_query() -> FilterState {
        FilterState {
            page: 1,
            limit: 1,
            ..FilterState::default()
        }
    }

    /// Start polling. The first request goes out immediately.
    pub fn spawn(&self) -> PollHandle {
        let (tx, rx) = watch::channel(None);
        let api = self.api.clone();
        let interval = self.interval;

        let task = tokio::spawn(async move {
            let query = Self::count_query();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match api.list_ads(&query).await {
                    Ok(page) => {
                        let total = page.total_items();
                        tracing::debug!("New-items check: remote total {}", total);
                        tx.send_replace(Some(total));
                    }
                    // keep the last known total
                    Err(e) => tracing::warn!("New-items check failed: {}", e),
                }
            }
        });

        tracing::debug!("Started new-items polling every {:?}", interval);
        PollHandle { task, latest: rx }
    }
}

/// Running poller; dropping it stops the polling
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
    latest: watch::Receiver<Option<u64>>,
}

impl PollHandle {
    /// Latest remote total, `None` until the first successful poll
    pub fn polled_total(&self) -> Option<u64> {
        *self.latest.borrow()
    }

    /// Items the server has beyond `rendered_total`, never negative
    pub fn new_items_since(&self, rendered_total: u64) -> u64 {
        self.polled_total()
            .map_or(0, |polled| polled.saturating_sub(rendered_total))
    }

    /// Receiver notified after every successful poll
    pub fn subscribe(&self) -> watch::Receiver<Option<u64>> {
        self.latest.clone()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!("Stopped new-items polling");
    }
}
