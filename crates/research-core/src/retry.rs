use std::future::Future;
use std::time::Duration;

use crate::ProviderError;

/// Bounded retry with a fixed wait schedule, indexed by attempt number.
///
/// Only errors classified as retryable (`ProviderError::is_retryable`) are
/// retried; everything else fails fast without waiting. Waits suspend the
/// current task only — other requests keep running.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub wait_schedule: Vec<Duration>,
}

impl Default for RetryPolicy {
    /// 3 retries at 10s, 30s, 60s — tuned for upstream rate-limit windows.
    fn default() -> Self {
        Self {
            max_retries: 3,
            wait_schedule: vec![
                Duration::from_secs(10),
                Duration::from_secs(30),
                Duration::from_secs(60),
            ],
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, wait_schedule: Vec<Duration>) -> Self {
        Self {
            max_retries,
            wait_schedule,
        }
    }

    /// Run `operation`, retrying on transient failures. Returns the last
    /// error once retries are exhausted or on the first terminal error.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0usize;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let wait = self
                        .wait_schedule
                        .get(attempt)
                        .or_else(|| self.wait_schedule.last())
                        .copied()
                        .unwrap_or(Duration::from_secs(60));
                    tracing::warn!(
                        "Transient provider error (attempt {}/{}), retrying in {}s: {}",
                        attempt + 1,
                        self.max_retries,
                        wait.as_secs(),
                        err
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn policy(waits_secs: &[u64]) -> RetryPolicy {
        RetryPolicy::new(
            waits_secs.len(),
            waits_secs.iter().map(|s| Duration::from_secs(*s)).collect(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_twice_then_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let start = Instant::now();

        let result = policy(&[10, 30, 60])
            .execute(move || {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ProviderError::RateLimited("429".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // waited 10s + 30s before the successful third attempt
        assert_eq!(start.elapsed(), Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_fast() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let start = Instant::now();

        let result: Result<(), _> = policy(&[10, 30, 60])
            .execute(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(ProviderError::Api("401 unauthorized".into()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_returns_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();

        let result: Result<(), _> = policy(&[1, 2])
            .execute(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(ProviderError::Unavailable("503".into()))
                }
            })
            .await;

        match result {
            Err(ProviderError::Unavailable(msg)) => assert_eq!(msg, "503"),
            other => panic!("expected Unavailable, got {:?}", other.err()),
        }
        // initial attempt + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
