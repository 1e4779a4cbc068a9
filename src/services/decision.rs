//! Single-listing decisions taken from the detail view

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::list::ListDataSource;
use super::ModerationError;
use crate::api::{dispatch, ModerationApi};
use crate::cache::{detail_key, QueryCache};
use crate::models::{Ad, Decision, DecisionPayload};

/// Decision service
///
/// Holds at most one decision in flight. A second call while one is running
/// fails with [`ModerationError::Busy`] instead of sending a duplicate.
pub struct DecisionService {
    api: Arc<dyn ModerationApi>,
    list: Arc<ListDataSource>,
    details: Arc<QueryCache<Arc<Ad>>>,
    busy: AtomicBool,
}

/// Clears the busy flag when the decision ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DecisionService {
    /// Create a new decision service
    ///
    /// # Arguments
    /// * `api` - Moderation API client
    /// * `list` - List source whose pages go stale after a decision
    /// * `details` - Detail cache, shared with the detail source
    pub fn new(
        api: Arc<dyn ModerationApi>,
        list: Arc<ListDataSource>,
        details: Arc<QueryCache<Arc<Ad>>>,
    ) -> Self {
        Self {
            api,
            list,
            details,
            busy: AtomicBool::new(false),
        }
    }

    /// Only listings awaiting moderation take decisions
    pub fn can_decide(ad: &Ad) -> bool {
        ad.awaits_decision()
    }

    /// Whether a decision is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn approve(&self, id: i64) -> Result<(), ModerationError> {
        self.decide(id, Decision::Approve).await
    }

    /// Reject listing `id`
    ///
    /// # Errors
    /// `ValidationError` for an empty or unknown reason, before any request.
    pub async fn reject(
        &self,
        id: i64,
        reason: &str,
        comment: Option<&str>,
    ) -> Result<(), ModerationError> {
        let payload = DecisionPayload::parse(reason, comment)?;
        self.decide(id, Decision::Reject(payload)).await
    }

    /// Send listing `id` back to its seller for changes
    ///
    /// # Errors
    /// Same validation as [`DecisionService::reject`].
    pub async fn request_changes(
        &self,
        id: i64,
        reason: &str,
        comment: Option<&str>,
    ) -> Result<(), ModerationError> {
        let payload = DecisionPayload::parse(reason, comment)?;
        self.decide(id, Decision::RequestChanges(payload)).await
    }

    /// Send `decision` for listing `id`. Not retried.
    pub async fn decide(&self, id: i64, decision: Decision) -> Result<(), ModerationError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(
                "Ignoring {} of ad {}: another decision is in flight",
                decision.verb(),
                id
            );
            return Err(ModerationError::Busy);
        }
        let _guard = InFlight(&self.busy);

        if let Err(e) = dispatch(self.api.as_ref(), id, &decision).await {
            tracing::warn!("Failed to {} ad {}: {}", decision.verb(), id, e);
            return Err(e.into());
        }

        tracing::info!("Ad {}: {}", id, decision.verb());
        self.details.invalidate(&detail_key(id)).await;
        self.list.invalidate_all().await;
        Ok(())
    }
}
