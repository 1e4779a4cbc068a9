//! Bulk action coordinator
//!
//! Applies one decision to many listings by sending one independent request
//! per id, all at once. There is no ordering and no atomicity: each id
//! succeeds or fails on its own and the outcome reports both sides. Requests
//! run as their own tasks, so a caller that stops waiting does not cancel
//! requests already sent.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

use super::list::ListDataSource;
use super::ModerationError;
use crate::api::{dispatch, ModerationApi};
use crate::cache::{detail_key, QueryCache};
use crate::models::{Ad, Decision, DecisionPayload};

/// Kind of bulk action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Approve,
    Reject,
    RequestChanges,
}

impl BulkAction {
    fn of(decision: &Decision) -> Self {
        match decision {
            Decision::Approve => BulkAction::Approve,
            Decision::Reject(_) => BulkAction::Reject,
            Decision::RequestChanges(_) => BulkAction::RequestChanges,
        }
    }
}

/// One failed request of a bulk action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub id: i64,
    pub message: String,
}

/// Per-id results of a bulk action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub action: BulkAction,
    pub succeeded: Vec<i64>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    fn empty(action: BulkAction) -> Self {
        Self {
            action,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Every request succeeded
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<i64> {
        self.failed.iter().map(|f| f.id).collect()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Succeeded ids, or `PartialBulkFailure` if anything failed
    pub fn into_result(self) -> Result<Vec<i64>, ModerationError> {
        if self.failed.is_empty() {
            return Ok(self.succeeded);
        }
        Err(ModerationError::PartialBulkFailure {
            failed_ids: self.failed_ids(),
            succeeded: self.succeeded,
        })
    }
}

/// Fans decisions out over many listings
pub struct BulkActionCoordinator {
    api: Arc<dyn ModerationApi>,
    list: Arc<ListDataSource>,
    detail_cache: Option<Arc<QueryCache<Arc<Ad>>>>,
}

impl BulkActionCoordinator {
    /// Create a coordinator that invalidates `list` after every action
    pub fn new(api: Arc<dyn ModerationApi>, list: Arc<ListDataSource>) -> Self {
        Self {
            api,
            list,
            detail_cache: None,
        }
    }

    /// Also drop cached details of listings that were decided
    pub fn with_detail_cache(mut self, cache: Arc<QueryCache<Arc<Ad>>>) -> Self {
        self.detail_cache = Some(cache);
        self
    }

    /// Approve every id
    pub async fn apply_approve(&self, ids: &[i64]) -> BulkOutcome {
        self.apply(ids, Decision::Approve).await
    }

    /// Reject every id with the same reason
    ///
    /// # Errors
    /// `ValidationError` when the reason is empty or unknown. Nothing is
    /// sent in that case.
    pub async fn apply_reject(
        &self,
        ids: &[i64],
        reason: &str,
        comment: Option<&str>,
    ) -> Result<BulkOutcome, ModerationError> {
        let payload = DecisionPayload::parse(reason, comment)?;
        Ok(self.apply(ids, Decision::Reject(payload)).await)
    }

    /// Request changes on every id with the same reason
    ///
    /// # Errors
    /// Same validation as [`BulkActionCoordinator::apply_reject`].
    pub async fn apply_request_changes(
        &self,
        ids: &[i64],
        reason: &str,
        comment: Option<&str>,
    ) -> Result<BulkOutcome, ModerationError> {
        let payload = DecisionPayload::parse(reason, comment)?;
        Ok(self.apply(ids, Decision::RequestChanges(payload)).await)
    }

    /// Send `decision` for every id concurrently and collect the results
    ///
    /// Repeated ids are sent once. The list cache is invalidated afterwards
    /// whatever the results.
    pub async fn apply(&self, ids: &[i64], decision: Decision) -> BulkOutcome {
        let action = BulkAction::of(&decision);
        let mut outcome = BulkOutcome::empty(action);

        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if unique.is_empty() {
            return outcome;
        }

        tracing::info!("Bulk {} of {} ads", decision.verb(), unique.len());
        let decision = Arc::new(decision);
        let requests = unique.into_iter().map(|id| {
            let api = self.api.clone();
            let decision = decision.clone();
            let task = tokio::spawn(async move { dispatch(api.as_ref(), id, &decision).await });
            async move { (id, task.await) }
        });

        for (id, result) in join_all(requests).await {
            match result {
                Ok(Ok(())) => outcome.succeeded.push(id),
                Ok(Err(e)) => outcome.failed.push(BulkFailure {
                    id,
                    message: e.to_string(),
                }),
                Err(e) => outcome.failed.push(BulkFailure {
                    id,
                    message: format!("request task failed: {}", e),
                }),
            }
        }

        self.list.invalidate_all().await;
        if let Some(cache) = &self.detail_cache {
            for id in &outcome.succeeded {
                cache.invalidate(&detail_key(*id)).await;
            }
        }

        if outcome.is_complete_success() {
            tracing::info!(
                "Bulk {} finished: {} succeeded",
                decision.verb(),
                outcome.succeeded.len()
            );
        } else {
            tracing::warn!(
                "Bulk {} partially failed: {} succeeded, failed ids {:?}",
                decision.verb(),
                outcome.succeeded.len(),
                outcome.failed_ids()
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterState;
    use crate::models::{AdStatus, RejectionReason};
    use crate::testing::FakeApi;
    use std::time::Duration;

    fn setup(api: &Arc<FakeApi>) -> (Arc<ListDataSource>, BulkActionCoordinator) {
        let list = Arc::new(ListDataSource::new(api.clone(), Arc::new(QueryCache::new())));
        let coordinator = BulkActionCoordinator::new(api.clone(), list.clone());
        (list, coordinator)
    }

    /// Yields until `done` holds, giving up after a while
    async fn wait_until(mut done: impl FnMut() -> bool) {
        for _ in 0..1000 {
            if done() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_partial_failure_reports_both_sides() {
        let api = Arc::new(FakeApi::with_pending(3));
        api.fail_decisions_for(2);
        let (list, coordinator) = setup(&api);
        list.fetch(&FilterState::default()).await.unwrap();

        let outcome = coordinator.apply_approve(&[1, 2, 3]).await;

        assert_eq!(outcome.action, BulkAction::Approve);
        assert_eq!(outcome.succeeded.len(), 2);
        assert!(outcome.succeeded.contains(&1) && outcome.succeeded.contains(&3));
        assert_eq!(outcome.failed_ids(), vec![2]);
        assert!(!outcome.is_complete_success());
        assert_eq!(outcome.attempted(), 3);

        // cache was invalidated, so the next read goes to the server
        let page = list.fetch(&FilterState::default()).await.unwrap();
        assert_eq!(api.list_call_count(), 2);
        let statuses: Vec<AdStatus> = page.ads.iter().map(|ad| ad.status).collect();
        assert_eq!(statuses, vec![AdStatus::Approved, AdStatus::Pending, AdStatus::Approved]);
    }

    #[tokio::test]
    async fn test_into_result() {
        let api = Arc::new(FakeApi::with_pending(3));
        api.fail_decisions_for(3);
        let (_, coordinator) = setup(&api);

        let err = coordinator.apply_approve(&[1, 3]).await.into_result().unwrap_err();
        assert_eq!(
            err,
            ModerationError::PartialBulkFailure {
                succeeded: vec![1],
                failed_ids: vec![3],
            }
        );

        let ok = coordinator.apply_approve(&[2]).await.into_result().unwrap();
        assert_eq!(ok, vec![2]);
    }

    #[tokio::test]
    async fn test_reject_without_reason_sends_nothing() {
        let api = Arc::new(FakeApi::with_pending(3));
        let (_, coordinator) = setup(&api);

        let err = coordinator.apply_reject(&[1, 2], "", None).await.unwrap_err();

        assert!(matches!(err, ModerationError::ValidationError(_)));
        assert!(api.decisions().is_empty());
    }

    #[tokio::test]
    async fn test_reject_sends_payload_per_id() {
        let api = Arc::new(FakeApi::with_pending(3));
        let (_, coordinator) = setup(&api);

        let outcome = coordinator
            .apply_reject(&[3, 1, 3], "Неверная категория", Some("move to Транспорт"))
            .await
            .unwrap();

        assert!(outcome.is_complete_success());
        let mut decisions = api.decisions();
        decisions.sort_by_key(|(_, id, _)| *id);
        let expected = DecisionPayload::new(
            RejectionReason::WrongCategory,
            Some("move to Транспорт".to_string()),
        );
        assert_eq!(
            decisions,
            vec![
                ("reject".to_string(), 1, Some(expected.clone())),
                ("reject".to_string(), 3, Some(expected)),
            ]
        );
    }

    #[tokio::test]
    async fn test_request_changes_uses_its_endpoint() {
        let api = Arc::new(FakeApi::with_pending(2));
        let (_, coordinator) = setup(&api);

        let outcome = coordinator
            .apply_request_changes(&[2], "photo-issues", None)
            .await
            .unwrap();

        assert_eq!(outcome.action, BulkAction::RequestChanges);
        assert_eq!(api.decisions()[0].0, "request-changes");
    }

    #[tokio::test]
    async fn test_empty_selection_sends_nothing() {
        let api = Arc::new(FakeApi::with_pending(2));
        let (_, coordinator) = setup(&api);

        let outcome = coordinator.apply_approve(&[]).await;

        assert_eq!(outcome.attempted(), 0);
        assert!(api.decisions().is_empty());
    }

    #[tokio::test]
    async fn test_detail_cache_dropped_for_decided_ads() {
        let api = Arc::new(FakeApi::with_pending(2));
        let details: Arc<QueryCache<Arc<Ad>>> = Arc::new(QueryCache::new());
        let (list, _) = setup(&api);
        let coordinator =
            BulkActionCoordinator::new(api.clone(), list).with_detail_cache(details.clone());
        let cached = Arc::new(crate::testing::sample_ad(1, AdStatus::Pending));
        details.insert(&detail_key(1), cached.clone()).await;
        details.insert(&detail_key(2), cached).await;

        coordinator.apply_approve(&[1]).await;

        assert!(details.get(&detail_key(1)).await.is_none());
        assert!(details.get(&detail_key(2)).await.is_some());
    }

    #[tokio::test]
    async fn test_requests_run_concurrently() {
        let api = Arc::new(FakeApi::with_pending(3));
        let gate = api.gate_decisions();
        let (_, coordinator) = setup(&api);

        let release = async {
            wait_until(|| api.decisions_started() == 3).await;
            // every request is in flight before any of them answers
            assert_eq!(api.decisions_started(), 3);
            assert!(api.decisions().is_empty());
            gate.add_permits(3);
        };
        let (outcome, ()) = tokio::join!(coordinator.apply_approve(&[1, 2, 3]), release);

        assert!(outcome.is_complete_success());
        assert_eq!(outcome.succeeded, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_caller_does_not_cancel_requests() {
        let api = Arc::new(FakeApi::with_pending(3));
        let gate = api.gate_decisions();
        let (_, coordinator) = setup(&api);

        let waited = tokio::time::timeout(
            Duration::from_millis(10),
            coordinator.apply_approve(&[1, 2, 3]),
        )
        .await;
        assert!(waited.is_err());

        gate.add_permits(3);
        wait_until(|| api.decisions().len() == 3).await;

        let mut ids: Vec<i64> = api.decisions().iter().map(|(_, id, _)| *id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_large_selection_with_repeats_sent_once_per_id() {
        let api = Arc::new(FakeApi::with_pending(3));
        let (_, coordinator) = setup(&api);
        let ids: Vec<i64> = [3, 1, 3, 2, 1].repeat(10_000);

        let outcome = coordinator.apply_approve(&ids).await;

        assert_eq!(outcome.succeeded, vec![3, 1, 2]);
        assert_eq!(api.decisions().len(), 3);
    }
}
