//! API layer - moderation REST client
//!
//! This module contains the client side of the moderation API:
//! - `ModerationApi`, the seam every service talks through
//! - `HttpModerationApi`, its reqwest implementation
//! - `ApiError`, the failure taxonomy of a single request
//! - the retry policy for idempotent reads

pub mod client;
pub mod error;
pub mod retry;

use async_trait::async_trait;

use crate::filters::FilterState;
use crate::models::{
    ActivityData, Ad, AdsPage, CategoryStats, Decision, DecisionPayload, DecisionsData,
    StatsPeriod, StatsSummary,
};

pub use client::HttpModerationApi;
pub use error::ApiError;
pub use retry::get_with_retry;

/// Moderation API operations
#[async_trait]
pub trait ModerationApi: Send + Sync {
    /// Fetch one page of listings matching `filters`
    async fn list_ads(&self, filters: &FilterState) -> Result<AdsPage, ApiError>;

    /// Fetch one listing by ID
    async fn get_ad(&self, id: i64) -> Result<Ad, ApiError>;

    /// Approve a listing
    async fn approve_ad(&self, id: i64) -> Result<(), ApiError>;

    /// Reject a listing
    async fn reject_ad(&self, id: i64, payload: &DecisionPayload) -> Result<(), ApiError>;

    /// Send a listing back to its seller for changes
    async fn request_changes_ad(&self, id: i64, payload: &DecisionPayload) -> Result<(), ApiError>;

    async fn stats_summary(&self, period: StatsPeriod) -> Result<StatsSummary, ApiError>;

    async fn activity_chart(&self, period: StatsPeriod) -> Result<Vec<ActivityData>, ApiError>;

    async fn decisions_chart(&self, period: StatsPeriod) -> Result<DecisionsData, ApiError>;

    async fn categories_chart(&self, period: StatsPeriod) -> Result<CategoryStats, ApiError>;
}

/// Send `decision` for listing `id` through the matching endpoint
pub async fn dispatch(
    api: &dyn ModerationApi,
    id: i64,
    decision: &Decision,
) -> Result<(), ApiError> {
    match decision {
        Decision::Approve => api.approve_ad(id).await,
        Decision::Reject(payload) => api.reject_ad(id, payload).await,
        Decision::RequestChanges(payload) => api.request_changes_ad(id, payload).await,
    }
}
