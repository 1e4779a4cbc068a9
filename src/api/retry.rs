//! Retry policy for idempotent reads
//!
//! A GET is attempted at most twice. Mutations never go through here.

use std::future::Future;

use super::ApiError;

/// Run `op`, repeating it once if the first failure is transient
pub async fn get_with_retry<T, F, Fut>(label: &str, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    match op().await {
        Err(e) if e.is_transient() => {
            tracing::warn!("{} failed ({}), retrying once", label, e);
            op().await
        }
        other => other,
    }
}
