//! reqwest implementation of [`ModerationApi`]

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::error::error_message;
use super::{ApiError, ModerationApi};
use crate::config::ApiConfig;
use crate::filters::{to_api_query, FilterState};
use crate::models::{
    ActivityData, Ad, AdsPage, CategoryStats, DecisionPayload, DecisionsData, StatsPeriod,
    StatsSummary,
};

/// HTTP client for the moderation REST API
#[derive(Debug, Clone)]
pub struct HttpModerationApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpModerationApi {
    /// Build a client for `config.base_url`
    ///
    /// Requests have no timeout unless `config.timeout_seconds` is set.
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("modqueue/", env!("CARGO_PKG_VERSION")));
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        tracing::debug!("GET {}", path);
        self.client.get(self.url(path))
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let body = check_status(response, what).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{}: {}", what, e)))
    }

    async fn post(
        &self,
        path: &str,
        payload: Option<&DecisionPayload>,
        what: &str,
    ) -> Result<(), ApiError> {
        tracing::debug!("POST {}", path);
        let mut request = self.client.post(self.url(path));
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        let response = request.send().await?;
        check_status(response, what).await?;
        Ok(())
    }
}

/// Map non-success statuses to [`ApiError`]
async fn check_status(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::not_found(what));
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

#[async_trait]
impl ModerationApi for HttpModerationApi {
    async fn list_ads(&self, filters: &FilterState) -> Result<AdsPage, ApiError> {
        let request = self.get("/ads").query(&to_api_query(filters));
        self.fetch_json(request, "ad list").await
    }

    async fn get_ad(&self, id: i64) -> Result<Ad, ApiError> {
        let request = self.get(&format!("/ads/{}", id));
        self.fetch_json(request, &format!("ad {}", id)).await
    }

    async fn approve_ad(&self, id: i64) -> Result<(), ApiError> {
        self.post(&format!("/ads/{}/approve", id), None, &format!("ad {}", id))
            .await
    }

    async fn reject_ad(&self, id: i64, payload: &DecisionPayload) -> Result<(), ApiError> {
        self.post(&format!("/ads/{}/reject", id), Some(payload), &format!("ad {}", id))
            .await
    }

    async fn request_changes_ad(&self, id: i64, payload: &DecisionPayload) -> Result<(), ApiError> {
        self.post(
            &format!("/ads/{}/request-changes", id),
            Some(payload),
            &format!("ad {}", id),
        )
        .await
    }

    async fn stats_summary(&self, period: StatsPeriod) -> Result<StatsSummary, ApiError> {
        let request = self.get("/stats/summary").query(&[("period", period.as_str())]);
        self.fetch_json(request, "stats summary").await
    }

    async fn activity_chart(&self, period: StatsPeriod) -> Result<Vec<ActivityData>, ApiError> {
        let request = self.get("/stats/chart/activity").query(&[("period", period.as_str())]);
        self.fetch_json(request, "activity chart").await
    }

    async fn decisions_chart(&self, period: StatsPeriod) -> Result<DecisionsData, ApiError> {
        let request = self.get("/stats/chart/decisions").query(&[("period", period.as_str())]);
        self.fetch_json(request, "decisions chart").await
    }

    async fn categories_chart(&self, period: StatsPeriod) -> Result<CategoryStats, ApiError> {
        let request = self.get("/stats/chart/categories").query(&[("period", period.as_str())]);
        self.fetch_json(request, "categories chart").await
    }
}
