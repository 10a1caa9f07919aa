use std::time::Duration;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};

use super::{DataError, DataResult};

/// Run `operation` with exponential backoff, retrying only errors that
/// `DataError::is_retryable` accepts.
pub async fn retry_with_backoff<F, Fut, T>(operation: F, max_attempts: usize) -> DataResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = DataResult<T>>,
{
    let retry_strategy = ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(max_attempts);

    RetryIf::spawn(retry_strategy, operation, |e: &DataError| {
        match e {
            DataError::RateLimit { retry_after } => {
                tracing::warn!("Rate limited, retry after {} seconds", retry_after);
                true
            }
            e if e.is_retryable() => {
                tracing::warn!("Retryable error: {}", e);
                true
            }
            e => {
                tracing::error!("Non-retryable error: {}", e);
                false
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_retries_server_errors_until_success() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_backoff(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(DataError::api_error(502, "bad gateway"))
                    } else {
                        Ok(n)
                    }
                }
            },
            3,
        )
        .await;

        assert_eq!(result.ok(), Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_parse_errors() {
        let calls = AtomicUsize::new(0);
        let result: DataResult<()> = retry_with_backoff(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(DataError::parse_error("broken html")) }
            },
            3,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
