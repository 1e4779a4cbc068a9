//! Queue view session
//!
//! Ties the list view together: filters live in the location, pages come
//! from the list data source, the selection survives page changes and the
//! new-items poller runs only while the filters qualify for it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::bulk::{BulkActionCoordinator, BulkOutcome};
use super::list::{ListDataSource, ListState};
use super::new_items::{NewItemsWatcher, PollHandle};
use super::selection::SelectionSet;
use super::ModerationError;
use crate::api::ModerationApi;
use crate::cache::QueryCache;
use crate::filters::{FilterEdit, FilterState, Navigator, UrlFilters};
use crate::models::{Ad, AdsPage};

/// One moderator's list view
pub struct QueueView<N: Navigator> {
    url: UrlFilters<N>,
    list: Arc<ListDataSource>,
    bulk: BulkActionCoordinator,
    watcher: NewItemsWatcher,
    selection: SelectionSet,
    poll: Option<PollHandle>,
}

impl<N: Navigator> QueueView<N> {
    /// Create a new queue view
    ///
    /// # Arguments
    /// * `navigator` - Location holding the filters
    /// * `api` - Moderation API client
    /// * `list` - List data source, possibly shared with other views
    /// * `poll_interval` - Interval of the new-items check
    pub fn new(
        navigator: N,
        api: Arc<dyn ModerationApi>,
        list: Arc<ListDataSource>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            url: UrlFilters::new(navigator),
            bulk: BulkActionCoordinator::new(api.clone(), list.clone()),
            watcher: NewItemsWatcher::new(api, poll_interval),
            list,
            selection: SelectionSet::new(),
            poll: None,
        }
    }

    /// Also drop cached details of listings decided in bulk
    pub fn with_detail_cache(mut self, cache: Arc<QueryCache<Arc<Ad>>>) -> Self {
        self.bulk = self.bulk.with_detail_cache(cache);
        self
    }

    pub fn filters(&self) -> FilterState {
        self.url.filters()
    }

    pub fn navigator(&self) -> &N {
        self.url.navigator()
    }

    pub async fn state(&self) -> ListState {
        self.list.state().await
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    /// Load the page for the filters currently in the location
    pub async fn open(&mut self) -> Result<Arc<AdsPage>, ModerationError> {
        let filters = self.url.filters();
        self.load(&filters).await
    }

    /// Apply a filter panel edit, then load the resulting page
    ///
    /// # Errors
    /// `ValidationError` when the edit yields invalid filters. The location
    /// and the visible page are left as they were.
    pub async fn apply(&mut self, edit: FilterEdit) -> Result<Arc<AdsPage>, ModerationError> {
        let filters = self.url.apply(edit)?;
        self.load(&filters).await
    }

    pub async fn go_to_page(&mut self, page: u32) -> Result<Arc<AdsPage>, ModerationError> {
        self.apply(FilterEdit::Page(page)).await
    }

    async fn load(&mut self, filters: &FilterState) -> Result<Arc<AdsPage>, ModerationError> {
        self.sync_polling(filters);
        Ok(self.list.fetch(filters).await?)
    }

    fn sync_polling(&mut self, filters: &FilterState) {
        if !filters.watches_new_items() {
            self.poll = None;
        } else if self.poll.is_none() {
            self.poll = Some(self.watcher.spawn());
        }
    }

    /// Drop every cached page and reload the current filters
    pub async fn refresh(&mut self) -> Result<Arc<AdsPage>, ModerationError> {
        let filters = self.url.filters();
        self.sync_polling(&filters);
        self.list.invalidate_all().await;
        Ok(self.list.fetch(&filters).await?)
    }

    /// Items the server has beyond the rendered total; 0 while not polling
    pub async fn new_items_available(&self) -> u64 {
        let Some(poll) = &self.poll else {
            return 0;
        };
        match self.list.state().await.rendered_total() {
            Some(rendered) => poll.new_items_since(rendered),
            None => 0,
        }
    }

    /// Receiver of polled totals while polling
    pub fn subscribe_new_items(&self) -> Option<watch::Receiver<Option<u64>>> {
        self.poll.as_ref().map(PollHandle::subscribe)
    }

    pub fn toggle(&mut self, id: i64) {
        self.selection.toggle(id);
    }

    /// Select-all checkbox over the currently shown page
    ///
    /// Does nothing while the shown page is a placeholder for filters that
    /// are still loading or failed to load.
    pub async fn select_all_on_page(&mut self) {
        let state = self.list.state().await;
        if state.is_placeholder() {
            tracing::debug!("Ignoring select-all: the requested page is not shown yet");
            return;
        }
        self.selection.select_all_on_page(&state.ids());
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub async fn bulk_approve(&mut self) -> BulkOutcome {
        let outcome = self.bulk.apply_approve(&self.selection.ids()).await;
        self.settle(outcome).await
    }

    pub async fn bulk_reject(
        &mut self,
        reason: &str,
        comment: Option<&str>,
    ) -> Result<BulkOutcome, ModerationError> {
        let outcome = self
            .bulk
            .apply_reject(&self.selection.ids(), reason, comment)
            .await?;
        Ok(self.settle(outcome).await)
    }

    pub async fn bulk_request_changes(
        &mut self,
        reason: &str,
        comment: Option<&str>,
    ) -> Result<BulkOutcome, ModerationError> {
        let outcome = self
            .bulk
            .apply_request_changes(&self.selection.ids(), reason, comment)
            .await?;
        Ok(self.settle(outcome).await)
    }

    /// Keep the selection after a partial failure so it can be retried
    async fn settle(&mut self, outcome: BulkOutcome) -> BulkOutcome {
        if outcome.attempted() == 0 {
            return outcome;
        }
        if outcome.is_complete_success() {
            self.selection.clear();
        }
        let filters = self.url.filters();
        if let Err(e) = self.list.fetch(&filters).await {
            tracing::warn!("Failed to reload list after bulk action: {}", e);
        }
        outcome
    }
}
