use anyhow::Result;
use futures::future::BoxFuture;
use log::{debug, info, warn};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(20),
            backoff_multiplier: 2.0,
        }
    }
}

/// Retry an operation with exponential backoff. Only transient failures
/// are retried; auth and validation errors surface immediately.
pub async fn retry_with_backoff<T, F>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> BoxFuture<'static, Result<T>>,
{
    let mut delay = config.base_delay;

    for attempt in 1..=config.max_attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("Operation succeeded on attempt {}", attempt);
                }
                return Ok(value);
            }
            Err(e) => {
                if attempt == config.max_attempts {
                    warn!("Operation failed after {} attempts: {}", config.max_attempts, e);
                    return Err(anyhow::anyhow!(
                        "Failed after {} retry attempts: {}",
                        config.max_attempts,
                        e
                    ));
                }

                if is_transient_error(&e) {
                    debug!("Attempt {} failed transiently, retrying in {:?}: {}", attempt, delay, e);
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * config.backoff_multiplier) as u64,
                        ),
                        config.max_delay,
                    );
                } else {
                    debug!("Attempt {} failed with non-transient error, not retrying: {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }

    unreachable!()
}

fn is_transient_error(error: &anyhow::Error) -> bool {
    if let Some(app_error) = error.downcast_ref::<crate::error::AppError>() {
        // Auth failures flip the write path instead of retrying; not-found
        // and bad-input never heal on retry.
        if app_error.is_auth_failure()
            || matches!(
                app_error,
                crate::error::AppError::NotFound(_) | crate::error::AppError::InvalidInput(_)
            )
        {
            return false;
        }
    }

    let error_str = error.to_string().to_lowercase();
    error_str.contains("timeout")
        || error_str.contains("connection")
        || error_str.contains("network")
        || error_str.contains("temporary")
        || error_str.contains("rate limit")
        || error_str.contains("too many requests")
        || error_str.contains("service unavailable")
        || error_str.contains("unreachable")
        || error_str.contains("429")
        || error_str.contains("502")
        || error_str.contains("503")
        || error_str.contains("504")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_success_on_second_attempt() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let counter = attempt_count.clone();

        let result = retry_with_backoff(&quick_config(), move || {
            let counter = counter.clone();
            Box::pin(async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(anyhow::anyhow!("connection reset"))
                } else {
                    Ok("success")
                }
            })
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_errors_are_not_retried() {
        let attempt_count = Arc::new(AtomicU32::new(0));
        let counter = attempt_count.clone();

        let result: Result<&str> = retry_with_backoff(&quick_config(), move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::Error::new(crate::error::AppError::auth("expired token")))
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }
}
