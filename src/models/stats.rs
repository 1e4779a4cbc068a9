//! Moderation statistics

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reporting period of the statistics endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Today,
    #[default]
    Week,
    Month,
}

impl StatsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl std::fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatsPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(format!("Invalid stats period: {}", s)),
        }
    }
}

/// Headline numbers for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_reviewed: u64,
    pub total_reviewed_today: u64,
    pub total_reviewed_this_week: u64,
    pub total_reviewed_this_month: u64,
    /// Average review time in minutes
    pub average_review_time: f64,
    pub approved_percentage: f64,
    pub rejected_percentage: f64,
    pub request_changes_percentage: f64,
}

/// Decisions made on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityData {
    pub date: String,
    pub approved: u64,
    pub rejected: u64,
    #[serde(default)]
    pub request_changes: u64,
}

/// Decision counts over a period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DecisionsData {
    pub approved: f64,
    pub rejected: f64,
    pub request_changes: f64,
}

/// Reviewed listings per category name
pub type CategoryStats = BTreeMap<String, u64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parse_and_default() {
        assert_eq!(StatsPeriod::default(), StatsPeriod::Week);
        assert_eq!("Month".parse::<StatsPeriod>().unwrap(), StatsPeriod::Month);
        assert!("year".parse::<StatsPeriod>().is_err());
        assert_eq!(serde_json::to_string(&StatsPeriod::Today).unwrap(), "\"today\"");
    }

    #[test]
    fn test_activity_without_request_changes() {
        let day: ActivityData =
            serde_json::from_str(r#"{"date": "2025-03-01", "approved": 4, "rejected": 1}"#)
                .unwrap();
        assert_eq!(day.request_changes, 0);
    }

    #[test]
    fn test_summary_camel_case() {
        let summary: StatsSummary = serde_json::from_str(
            r#"{
                "totalReviewed": 100,
                "totalReviewedToday": 5,
                "totalReviewedThisWeek": 30,
                "totalReviewedThisMonth": 90,
                "averageReviewTime": 2.5,
                "approvedPercentage": 60.0,
                "rejectedPercentage": 30.0,
                "requestChangesPercentage": 10.0
            }"#,
        )
        .unwrap();
        assert_eq!(summary.total_reviewed_this_week, 30);
        assert_eq!(summary.request_changes_percentage, 10.0);
    }
}
