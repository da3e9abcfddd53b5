//! Rate limiting for form submissions.

use std::sync::Arc;

use yablog_core::ports::RateLimiter;

use crate::middleware::error::{AppError, AppResult};

/// Count one request against `key`. Limiter failures let the request
/// through.
pub async fn enforce(limiter: Option<&Arc<dyn RateLimiter>>, key: &str) -> AppResult<()> {
    let Some(limiter) = limiter else {
        return Ok(());
    };

    match limiter.check(key).await {
        Ok(result) if !result.allowed => {
            tracing::warn!("Rate limit exceeded for key: {}", key);
            Err(AppError::TooManyRequests {
                retry_after_secs: result.reset_after.as_secs().max(1),
            })
        }
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!(error = %e, "Rate limiter error, failing open");
            Ok(())
        }
    }
}
