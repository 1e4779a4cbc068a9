//! Errors of the moderation workflow

use crate::api::ApiError;
use crate::filters::FilterError;
use crate::models::InvalidDecision;

/// Error types for decision and bulk operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModerationError {
    /// Input rejected before anything was sent
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Another decision on the same view is still in flight
    #[error("A decision is already in progress")]
    Busy,

    /// Some requests of a bulk action failed
    #[error(
        "{} of {} requests failed (ids: {:?})",
        .failed_ids.len(),
        .failed_ids.len() + .succeeded.len(),
        .failed_ids
    )]
    PartialBulkFailure {
        succeeded: Vec<i64>,
        failed_ids: Vec<i64>,
    },

    /// A single request failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<InvalidDecision> for ModerationError {
    fn from(e: InvalidDecision) -> Self {
        ModerationError::ValidationError(e.to_string())
    }
}

impl From<FilterError> for ModerationError {
    fn from(e: FilterError) -> Self {
        ModerationError::ValidationError(e.to_string())
    }
}

impl ModerationError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModerationError::Api(e) if e.is_not_found())
    }
}
