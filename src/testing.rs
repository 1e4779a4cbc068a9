//! Test doubles shared by the unit tests

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::api::{ApiError, ModerationApi};
use crate::filters::FilterState;
use crate::models::{
    ActivityData, Ad, AdStatus, AdsPage, CategoryStats, DecisionPayload, DecisionsData,
    Pagination, Priority, Seller, StatsPeriod, StatsSummary,
};

/// A listing with predictable fields
pub fn sample_ad(id: i64, status: AdStatus) -> Ad {
    Ad {
        id,
        title: format!("Listing {}", id),
        price: 1000.0 + id as f64,
        description: "Test listing".to_string(),
        images: vec![format!("https://img.example/{}.jpg", id)],
        category: "Электроника".to_string(),
        category_id: (id % 8) as u32,
        status,
        priority: Priority::Normal,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        seller: Seller {
            id: 100 + id,
            name: "Seller".to_string(),
            rating: 4.5,
            total_ads: 3,
            registered_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        },
        characteristics: BTreeMap::new(),
        moderation_history: Vec::new(),
    }
}

/// In-memory [`ModerationApi`] with failure injection
#[derive(Default)]
pub struct FakeApi {
    ads: Mutex<Vec<Ad>>,
    /// Overrides `totalItems` of every list response
    total_override: Mutex<Option<u64>>,
    /// Decisions on these ids fail with a server error
    failing_ids: Mutex<HashSet<i64>>,
    /// Number of upcoming `list_ads` calls that fail with a network error
    list_failures: AtomicUsize,
    /// Number of upcoming `get_ad` calls that fail with a network error
    detail_failures: AtomicUsize,
    /// When set, `list_ads` waits for a permit before answering
    list_gate: Mutex<Option<Arc<Semaphore>>>,
    /// When set, decisions wait for a permit before being recorded
    decision_gate: Mutex<Option<Arc<Semaphore>>>,
    decisions_started: AtomicUsize,
    list_calls: Mutex<Vec<FilterState>>,
    detail_calls: AtomicUsize,
    stats_calls: AtomicUsize,
    decisions: Mutex<Vec<(String, i64, Option<DecisionPayload>)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ads 1..=count, all pending
    pub fn with_pending(count: i64) -> Self {
        let api = Self::new();
        api.set_ads((1..=count).map(|id| sample_ad(id, AdStatus::Pending)).collect());
        api
    }

    pub fn set_ads(&self, ads: Vec<Ad>) {
        *self.ads.lock().unwrap() = ads;
    }

    pub fn remove_ad(&self, id: i64) {
        self.ads.lock().unwrap().retain(|ad| ad.id != id);
    }

    pub fn set_total(&self, total: u64) {
        *self.total_override.lock().unwrap() = Some(total);
    }

    pub fn fail_decisions_for(&self, id: i64) {
        self.failing_ids.lock().unwrap().insert(id);
    }

    pub fn fail_next_lists(&self, count: usize) {
        self.list_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_details(&self, count: usize) {
        self.detail_failures.store(count, Ordering::SeqCst);
    }

    /// Hold every `list_ads` call until permits are added to the returned semaphore
    pub fn gate_lists(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold every decision until permits are added to the returned semaphore
    pub fn gate_decisions(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.decision_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn list_calls(&self) -> Vec<FilterState> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn detail_call_count(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn stats_call_count(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    /// Decision requests received, answered or not
    pub fn decisions_started(&self) -> usize {
        self.decisions_started.load(Ordering::SeqCst)
    }

    /// Recorded decisions as (verb, id, payload)
    pub fn decisions(&self) -> Vec<(String, i64, Option<DecisionPayload>)> {
        self.decisions.lock().unwrap().clone()
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    async fn decide(
        &self,
        verb: &str,
        id: i64,
        payload: Option<&DecisionPayload>,
        status: AdStatus,
    ) -> Result<(), ApiError> {
        self.decisions_started.fetch_add(1, Ordering::SeqCst);
        let gate = self.decision_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.map_err(|e| ApiError::network(e.to_string()))?.forget();
        }
        self.decisions
            .lock()
            .unwrap()
            .push((verb.to_string(), id, payload.cloned()));
        if self.failing_ids.lock().unwrap().contains(&id) {
            return Err(ApiError::Status {
                status: 500,
                message: format!("cannot {} ad {}", verb, id),
            });
        }
        let mut ads = self.ads.lock().unwrap();
        match ads.iter_mut().find(|ad| ad.id == id) {
            Some(ad) => {
                ad.status = status;
                Ok(())
            }
            None => Err(ApiError::not_found(format!("ad {}", id))),
        }
    }
}

#[async_trait]
impl ModerationApi for FakeApi {
    async fn list_ads(&self, filters: &FilterState) -> Result<AdsPage, ApiError> {
        self.list_calls.lock().unwrap().push(filters.clone());
        let gate = self.list_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.map_err(|e| ApiError::network(e.to_string()))?.forget();
        }
        if Self::take_failure(&self.list_failures) {
            return Err(ApiError::network("connection reset"));
        }

        let ads = self.ads.lock().unwrap();
        let matching: Vec<&Ad> = ads
            .iter()
            .filter(|ad| filters.status.is_empty() || filters.status.contains(&ad.status))
            .filter(|ad| filters.category_id.map_or(true, |c| ad.category_id == c))
            .filter(|ad| {
                filters
                    .search
                    .as_ref()
                    .map_or(true, |s| ad.title.to_lowercase().contains(&s.to_lowercase()))
            })
            .collect();
        let total = self
            .total_override
            .lock()
            .unwrap()
            .unwrap_or(matching.len() as u64);
        let start = ((filters.page - 1) * filters.limit) as usize;
        let page_ads = matching
            .into_iter()
            .skip(start)
            .take(filters.limit as usize)
            .cloned()
            .collect();

        Ok(AdsPage {
            ads: page_ads,
            pagination: Pagination::new(filters.page, filters.limit, total),
        })
    }

    async fn get_ad(&self, id: i64) -> Result<Ad, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.detail_failures) {
            return Err(ApiError::network("timeout"));
        }
        self.ads
            .lock()
            .unwrap()
            .iter()
            .find(|ad| ad.id == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("ad {}", id)))
    }

    async fn approve_ad(&self, id: i64) -> Result<(), ApiError> {
        self.decide("approve", id, None, AdStatus::Approved).await
    }

    async fn reject_ad(&self, id: i64, payload: &DecisionPayload) -> Result<(), ApiError> {
        self.decide("reject", id, Some(payload), AdStatus::Rejected).await
    }

    async fn request_changes_ad(&self, id: i64, payload: &DecisionPayload) -> Result<(), ApiError> {
        // the server keeps the listing visible as a draft for its seller
        self.decide("request-changes", id, Some(payload), AdStatus::Draft)
            .await
    }

    async fn stats_summary(&self, _period: StatsPeriod) -> Result<StatsSummary, ApiError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StatsSummary {
            total_reviewed: 10,
            approved_percentage: 50.0,
            rejected_percentage: 30.0,
            request_changes_percentage: 20.0,
            ..StatsSummary::default()
        })
    }

    async fn activity_chart(&self, period: StatsPeriod) -> Result<Vec<ActivityData>, ApiError> {
        Ok(vec![ActivityData {
            date: format!("{}-1", period),
            approved: 5,
            rejected: 3,
            request_changes: 2,
        }])
    }

    async fn decisions_chart(&self, _period: StatsPeriod) -> Result<DecisionsData, ApiError> {
        Ok(DecisionsData {
            approved: 5.0,
            rejected: 3.0,
            request_changes: 2.0,
        })
    }

    async fn categories_chart(&self, _period: StatsPeriod) -> Result<CategoryStats, ApiError> {
        Ok(CategoryStats::from([
            ("Транспорт".to_string(), 2),
            ("Электроника".to_string(), 7),
            ("Работа".to_string(), 1),
        ]))
    }
}
