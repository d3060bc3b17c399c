//! Retry with exponential back-off and jitter for the Gemini client.
//!
//! Transient failures (network errors, overload, 5xx) are retried; anything
//! else is returned after the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::NarrativeError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** timeouts, connection failures, [`NarrativeError::Overloaded`],
/// and 5xx upstream statuses.
///
/// **Not retriable:** other 4xx statuses, missing text, malformed bodies,
/// prompt encoding failures, invalid URLs.
pub(crate) fn is_retriable(err: &NarrativeError) -> bool {
    match err {
        NarrativeError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        NarrativeError::Overloaded { .. } => true,
        NarrativeError::UpstreamStatus { status, .. } => *status >= 500,
        NarrativeError::MissingText
        | NarrativeError::Deserialize { .. }
        | NarrativeError::Prompt(_)
        | NarrativeError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt        |
/// |---------|----------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter     |
/// | 3       | 1 000 ms × 2² ± 25 % jitter     |
///
/// Delay is capped at 30 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, NarrativeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NarrativeError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "Gemini transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn overload_and_server_errors_are_retriable() {
        assert!(is_retriable(&NarrativeError::Overloaded { status: 429 }));
        assert!(is_retriable(&NarrativeError::UpstreamStatus {
            status: 500,
            body: String::new()
        }));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&NarrativeError::UpstreamStatus {
            status: 400,
            body: "bad key".to_owned()
        }));
        assert!(!is_retriable(&NarrativeError::MissingText));
    }

    #[tokio::test]
    async fn retries_overload_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(NarrativeError::Overloaded { status: 503 })
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
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
                Err::<(), _>(NarrativeError::Overloaded { status: 429 })
            }
        })
        .await;
        assert!(matches!(result, Err(NarrativeError::Overloaded { status: 429 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3, "1 attempt + 2 retries");
    }

    #[tokio::test]
    async fn does_not_retry_missing_text() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(NarrativeError::MissingText)
            }
        })
        .await;
        assert!(matches!(result, Err(NarrativeError::MissingText)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
