//! Retry with exponential back-off and jitter for data API reads.
//!
//! Writes are never retried: a rejected write must reach the caller as-is.

use std::future::Future;
use std::time::Duration;

use crate::error::DataError;

/// Upper bound on any single wait, including a server-supplied `Retry-After`.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Returns `true` for errors that are worth retrying after a delay.
///
/// Retriable: timeouts, connection failures, 5xx and throttled (429) reads.
pub(crate) fn is_retriable(err: &DataError) -> bool {
    match err {
        DataError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        DataError::UnexpectedStatus { status, .. } => *status >= 500,
        DataError::Throttled { .. } => true,
        DataError::Deserialize { .. }
        | DataError::Rejected { .. }
        | DataError::NotFound { .. }
        | DataError::InvalidBaseUrl { .. } => false,
    }
}

/// How long to wait before retry number `attempt` (1-based).
///
/// A throttled read waits exactly what the API asked for. Anything else
/// backs off exponentially from `backoff_base_ms` with ±25 % jitter.
pub(crate) fn retry_delay(err: &DataError, attempt: u32, backoff_base_ms: u64) -> Duration {
    if let DataError::Throttled {
        retry_after: Some(wait),
        ..
    } = err
    {
        return (*wait).min(MAX_DELAY);
    }
    let exponential = Duration::from_millis(
        backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10)),
    );
    exponential
        .min(MAX_DELAY)
        .mul_f64(rand::random::<f64>() * 0.5 + 0.75)
}

/// Runs a read with up to `max_retries` additional attempts on transient errors.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, DataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DataError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if attempt >= max_retries || !is_retriable(&err) {
            return Err(err);
        }
        attempt += 1;
        let delay = retry_delay(&err, attempt, backoff_base_ms);
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "data API read failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn server_error() -> DataError {
        DataError::UnexpectedStatus {
            status: 503,
            url: "https://example.supabase.co/rest/v1/deals".to_owned(),
        }
    }

    #[test]
    fn server_errors_and_throttling_are_retriable() {
        assert!(is_retriable(&server_error()));
        assert!(is_retriable(&DataError::Throttled {
            url: String::new(),
            retry_after: None,
        }));
    }

    #[test]
    fn throttled_delay_follows_retry_after() {
        let err = DataError::Throttled {
            url: String::new(),
            retry_after: Some(Duration::from_secs(4)),
        };
        assert_eq!(retry_delay(&err, 1, 100), Duration::from_secs(4));
        assert_eq!(retry_delay(&err, 5, 100), Duration::from_secs(4));
    }

    #[test]
    fn retry_after_is_capped() {
        let err = DataError::Throttled {
            url: String::new(),
            retry_after: Some(Duration::from_secs(3600)),
        };
        assert_eq!(retry_delay(&err, 1, 100), MAX_DELAY);
    }

    #[test]
    fn backoff_doubles_within_jitter() {
        for attempt in 1..=3 {
            let expected = 200.0 * f64::from(1u32 << (attempt - 1));
            let ms = retry_delay(&server_error(), attempt, 200).as_secs_f64() * 1000.0;
            assert!(
                ms >= expected * 0.75 - 1e-6 && ms <= expected * 1.25 + 1e-6,
                "attempt {attempt}: {ms} ms"
            );
        }
    }

    #[test]
    fn throttle_without_hint_uses_backoff() {
        let err = DataError::Throttled {
            url: String::new(),
            retry_after: None,
        };
        assert!(retry_delay(&err, 1, 0).is_zero());
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&DataError::UnexpectedStatus {
            status: 404,
            url: String::new(),
        }));
        assert!(!is_retriable(&DataError::Rejected {
            table: "deals".to_owned(),
            status: 500,
            message: "boom".to_owned(),
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_retry_after_before_next_attempt() {
        let started = tokio::time::Instant::now();
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(DataError::Throttled {
                        url: String::new(),
                        retry_after: Some(Duration::from_secs(2)),
                    })
                } else {
                    Ok::<u32, DataError>(1)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(server_error())
                } else {
                    Ok::<u32, DataError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(server_error())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(DataError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_deserialize_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                let source = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
                Err::<u32, _>(DataError::Deserialize {
                    context: "test".to_owned(),
                    source,
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(DataError::Deserialize { .. })));
    }
}
