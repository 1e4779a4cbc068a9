//! Moderator statistics

use std::sync::Arc;

use crate::api::{get_with_retry, ApiError, ModerationApi};
use crate::cache::QueryCache;
use crate::models::{ActivityData, CategoryStats, DecisionsData, StatsPeriod, StatsSummary};

/// Everything the statistics page shows for one period
#[derive(Debug, Clone, PartialEq)]
pub struct StatsBundle {
    pub period: StatsPeriod,
    pub summary: StatsSummary,
    pub activity: Vec<ActivityData>,
    pub decisions: DecisionsData,
    pub categories: CategoryStats,
}

impl StatsBundle {
    /// Categories by reviewed count, largest first; ties by name
    pub fn ranked_categories(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .categories
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// (approved, rejected, request_changes) for a pie legend
    pub fn decision_shares(&self) -> (f64, f64, f64) {
        let d = self.decisions;
        (d.approved, d.rejected, d.request_changes)
    }

    /// Decisions over the whole activity chart
    pub fn activity_total(&self) -> u64 {
        self.activity
            .iter()
            .map(|day| day.approved + day.rejected + day.request_changes)
            .sum()
    }
}

/// Cached loader of [`StatsBundle`]s
pub struct StatsService {
    api: Arc<dyn ModerationApi>,
    cache: Arc<QueryCache<Arc<StatsBundle>>>,
}

impl StatsService {
    pub fn new(api: Arc<dyn ModerationApi>, cache: Arc<QueryCache<Arc<StatsBundle>>>) -> Self {
        Self { api, cache }
    }

    fn cache_key(period: StatsPeriod) -> String {
        format!("stats:{}", period)
    }

    /// Load the four statistics of `period` concurrently
    ///
    /// # Errors
    /// The first failing request's error, each request having been retried
    /// once when transient. Nothing is cached on failure.
    pub async fn load(&self, period: StatsPeriod) -> Result<Arc<StatsBundle>, ApiError> {
        let api = self.api.clone();
        self.cache
            .try_get_with(&Self::cache_key(period), async move {
                tracing::debug!("Loading stats for {}", period);
                let (summary, activity, decisions, categories) = tokio::try_join!(
                    get_with_retry("stats summary", || api.stats_summary(period)),
                    get_with_retry("activity chart", || api.activity_chart(period)),
                    get_with_retry("decisions chart", || api.decisions_chart(period)),
                    get_with_retry("categories chart", || api.categories_chart(period)),
                )?;
                Ok::<_, ApiError>(Arc::new(StatsBundle {
                    period,
                    summary,
                    activity,
                    decisions,
                    categories,
                }))
            })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Forget every cached period
    pub async fn invalidate(&self) {
        self.cache.invalidate_pattern("stats:*").await;
    }
}
