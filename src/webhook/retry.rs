use std::time::Duration;

use rand::{Rng, thread_rng};

use super::WebhookError;

/// Total number of attempts for one delivery before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Delay before the retry that follows failed attempt `attempt` (0-based).
///
/// Uniform jitter scaled by how many attempts have already failed, so the
/// first retry fires immediately.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs_f64(thread_rng().gen_range(0.2..0.4) * f64::from(attempt))
}

/// Run `attempt` up to [`MAX_ATTEMPTS`] times.
///
/// Only transient errors are retried; anything else returns on first
/// occurrence. When every attempt fails the last transient error is
/// returned.
pub async fn run_with_retries<T, F>(mut attempt: F) -> Result<T, WebhookError>
where
    F: FnMut() -> Result<T, WebhookError>,
{
    let mut failed = 0;
    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                failed += 1;
                tracing::warn!("Error on processing webhook: {}", e);
                if failed == MAX_ATTEMPTS {
                    tracing::error!("Failed to process webhook in {} tries", MAX_ATTEMPTS);
                    return Err(e);
                }
                tokio::time::sleep(backoff_delay(failed - 1)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> WebhookError {
        WebhookError::Transient("database is locked".into())
    }

    #[tokio::test]
    async fn returns_first_success() {
        let mut calls = 0;
        let result = run_with_retries(|| {
            calls += 1;
            Ok::<_, WebhookError>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let mut calls = 0;
        let result = run_with_retries(|| {
            calls += 1;
            if calls < 3 { Err(transient()) } else { Ok(calls) }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn gives_up_after_three_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = run_with_retries(|| {
            calls += 1;
            Err(transient())
        })
        .await;

        assert!(matches!(result, Err(WebhookError::Transient(_))));
        assert_eq!(calls, MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn terminal_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = run_with_retries(|| {
            calls += 1;
            Err(WebhookError::MalformedEvent)
        })
        .await;

        assert!(matches!(result, Err(WebhookError::MalformedEvent)));
        assert_eq!(calls, 1);

        let mut calls = 0;
        let result: Result<(), _> = run_with_retries(|| {
            calls += 1;
            Err(WebhookError::UnknownUser(7))
        })
        .await;

        assert!(matches!(result, Err(WebhookError::UnknownUser(7))));
        assert_eq!(calls, 1);
    }
}
