//! Retry policy behavior against scripted collaborator failures

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use helpers::init_test_logging;
use tokio::time::Instant;
use tracing::Level;
use vocab_ingest::error::RemoteError;
use vocab_ingest::utils::RetryPolicy;

fn policy() -> RetryPolicy {
    RetryPolicy::new(
        3,
        Duration::from_millis(100),
        Duration::from_secs(5),
        2.0,
    )
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_back_off_then_succeed() {
    let attempts = AtomicUsize::new(0);
    let start = Instant::now();

    let result = policy()
        .run("store write", || {
            let outcome = match attempts.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err(RemoteError::status(503, "service unavailable")),
                _ => Ok("stored"),
            };
            async move { outcome }
        })
        .await;

    assert_eq!(result, Ok("stored"));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    // 100ms after the first failure, 200ms after the second
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_client_errors_are_not_retried() {
    let attempts = AtomicUsize::new(0);
    let start = Instant::now();

    let result: Result<(), RemoteError> = policy()
        .run("store write", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(RemoteError::status(400, "bad request")) }
        })
        .await;

    assert_eq!(result, Err(RemoteError::status(400, "bad request")));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_is_retried() {
    let attempts = AtomicUsize::new(0);

    let result = policy()
        .run("tag lookup", || {
            let outcome = if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RemoteError::status(429, "too many requests"))
            } else {
                Ok(7)
            };
            async move { outcome }
        })
        .await;

    assert_eq!(result, Ok(7));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_return_last_error_and_log() {
    let (logs, _guard) = init_test_logging();
    let attempts = AtomicUsize::new(0);

    let result: Result<(), RemoteError> = policy()
        .run("batch card upsert", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move { Err(RemoteError::Unavailable(format!("locked #{}", n))) }
        })
        .await;

    assert_eq!(result, Err(RemoteError::Unavailable("locked #3".to_string())));
    assert_eq!(attempts.load(Ordering::SeqCst), 4);

    assert_eq!(logs.matching_at(Level::WARN, "will retry").len(), 3);
    let exhausted = logs.matching_at(Level::ERROR, "retries exhausted");
    assert_eq!(exhausted.len(), 1);
    assert_eq!(
        exhausted[0].fields.get("operation").map(String::as_str),
        Some("batch card upsert")
    );
}

#[tokio::test(start_paused = true)]
async fn test_backoff_is_capped() {
    let policy = RetryPolicy::new(
        5,
        Duration::from_secs(1),
        Duration::from_secs(3),
        10.0,
    );
    let attempts = AtomicUsize::new(0);
    let start = Instant::now();

    let _: Result<(), RemoteError> = policy
        .run("capped", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(RemoteError::Timeout("slow".to_string())) }
        })
        .await;

    // 1s + 3s * 4 with the cap applied
    assert_eq!(attempts.load(Ordering::SeqCst), 6);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(13));
    assert!(elapsed < Duration::from_secs(14));
}
