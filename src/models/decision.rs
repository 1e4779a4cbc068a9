//! Moderation decisions and their payloads

use serde::{Deserialize, Serialize};

/// Fixed set of reasons a moderator can give for reject / request-changes
///
/// Serialized as the labels the API stores verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    #[serde(rename = "Запрещенный товар")]
    ProhibitedItem,
    #[serde(rename = "Неверная категория")]
    WrongCategory,
    #[serde(rename = "Некорректное описание")]
    IncorrectDescription,
    #[serde(rename = "Проблемы с фото")]
    PhotoIssues,
    #[serde(rename = "Подозрение на мошенничество")]
    SuspectedFraud,
    #[serde(rename = "Другое")]
    Other,
}

impl RejectionReason {
    pub const ALL: [RejectionReason; 6] = [
        RejectionReason::ProhibitedItem,
        RejectionReason::WrongCategory,
        RejectionReason::IncorrectDescription,
        RejectionReason::PhotoIssues,
        RejectionReason::SuspectedFraud,
        RejectionReason::Other,
    ];

    /// Label sent to the API
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProhibitedItem => "Запрещенный товар",
            Self::WrongCategory => "Неверная категория",
            Self::IncorrectDescription => "Некорректное описание",
            Self::PhotoIssues => "Проблемы с фото",
            Self::SuspectedFraud => "Подозрение на мошенничество",
            Self::Other => "Другое",
        }
    }

    /// Short ASCII name for command lines
    pub fn slug(&self) -> &'static str {
        match self {
            Self::ProhibitedItem => "prohibited-item",
            Self::WrongCategory => "wrong-category",
            Self::IncorrectDescription => "incorrect-description",
            Self::PhotoIssues => "photo-issues",
            Self::SuspectedFraud => "suspected-fraud",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a decision payload could not be built
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDecision {
    #[error("A reason is required")]
    MissingReason,
    #[error("Unknown reason: {0}")]
    UnknownReason(String),
}

impl std::str::FromStr for RejectionReason {
    type Err = InvalidDecision;

    /// Accepts either the API label or the ASCII slug
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InvalidDecision::MissingReason);
        }
        Self::ALL
            .into_iter()
            .find(|reason| reason.label() == s || reason.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| InvalidDecision::UnknownReason(s.to_string()))
    }
}

/// Body of reject and request-changes requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPayload {
    pub reason: RejectionReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl DecisionPayload {
    pub fn new(reason: RejectionReason, comment: Option<String>) -> Self {
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Self { reason, comment }
    }

    /// Build a payload from free-form input
    ///
    /// # Errors
    /// `MissingReason` when `reason` is empty, `UnknownReason` when it is
    /// not one of the fixed reasons.
    pub fn parse(reason: &str, comment: Option<&str>) -> Result<Self, InvalidDecision> {
        let reason = reason.parse::<RejectionReason>()?;
        Ok(Self::new(reason, comment.map(str::to_string)))
    }
}

/// A moderation decision on one listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject(DecisionPayload),
    RequestChanges(DecisionPayload),
}

impl Decision {
    /// Short verb for logs
    pub fn verb(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject(_) => "reject",
            Decision::RequestChanges(_) => "request-changes",
        }
    }
}
