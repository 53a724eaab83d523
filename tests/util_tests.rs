//! Tests for the fixed-delay retry policy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use toolloop::error::AgentError;
use toolloop::util::retry::RetryPolicy;

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(100))
}

#[tokio::test(start_paused = true)]
async fn retry_policy_retries_transient_errors_until_success() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let started = tokio::time::Instant::now();

    let result = policy(4)
        .execute(|| {
            let attempts = attempts.clone();
            async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Err(AgentError::api(500, "server error"))
                } else {
                    Ok::<_, AgentError>("ok")
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn retry_policy_stops_immediately_for_non_retryable_errors() {
    let attempts = Arc::new(AtomicUsize::new(0));

    let result = policy(5)
        .execute(|| {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AgentError::api(503, "unavailable"))
            }
        })
        .await;

    match result {
        Err(AgentError::Api { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected api error, got {other:?}"),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_policy_returns_last_error_when_attempts_are_exhausted() {
    let attempts = Arc::new(AtomicUsize::new(0));

    let result = policy(3)
        .execute(|| {
            let attempts = attempts.clone();
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AgentError::RateLimited {
                    message: format!("attempt {n}"),
                })
            }
        })
        .await;

    match result {
        Err(AgentError::RateLimited { message }) => assert_eq!(message, "attempt 2"),
        other => panic!("expected rate limit error, got {other:?}"),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retry_policy_with_zero_attempts_runs_once() {
    let attempts = Arc::new(AtomicUsize::new(0));

    let result = policy(0)
        .execute(|| {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AgentError::api(429, "rate limited"))
            }
        })
        .await;

    assert!(result.unwrap_err().is_retryable());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_policy_cancellation_interrupts_the_delay() {
    let cancel = CancellationToken::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let policy = RetryPolicy::new(10, Duration::from_secs(60));

    let task = {
        let cancel = cancel.clone();
        let attempts = attempts.clone();
        tokio::spawn(async move {
            policy
                .execute_cancellable(&cancel, || {
                    let attempts = attempts.clone();
                    async move {
                        attempts.fetch_add(1, Ordering::SeqCst);
                        Err::<(), _>(AgentError::api(500, "server error"))
                    }
                })
                .await
        })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();
    let result = task.await.unwrap();

    assert!(matches!(result, Err(AgentError::Canceled)));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
