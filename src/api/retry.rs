use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::sleep;

/// Errors that know whether another attempt could succeed.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Why a retried operation ultimately failed
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// The operation failed in a way another attempt would not fix.
    #[error("{0}")]
    Permanent(E),
}

/// Bounded exponential backoff with jitter.
///
/// Between attempt `k` and `k + 1` the caller is suspended for
/// `unit * (base_factor^k + U(0, 1))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_factor: f64,
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_factor: 2.0,
            unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_factor: f64, unit: Duration) -> Self {
        Self {
            max_retries,
            base_factor,
            unit,
        }
    }

    /// Delay before attempt `attempt + 1` for a given jitter in `[0, 1)`.
    pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let units = self.base_factor.powi(exponent) + jitter;
        Duration::try_from_secs_f64(self.unit.as_secs_f64() * units).unwrap_or(Duration::MAX)
    }

    /// Jittered delay before attempt `attempt + 1`.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.0..1.0);
        self.delay_for(attempt, jitter)
    }

    /// Run `op` until it succeeds, fails permanently, or `max_retries`
    /// attempts have been made. No sleep follows the final attempt.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let max_retries = self.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Succeeded after {} attempts", attempt);
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if !err.is_transient() {
                return Err(RetryError::Permanent(err));
            }

            if attempt >= max_retries {
                tracing::error!("Failed after {} attempts: {}", attempt, err);
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.next_delay(attempt);
            tracing::info!(
                attempt,
                max_retries,
                "Retrying in {:.2} seconds (attempt {}/{})",
                delay.as_secs_f64(),
                attempt,
                max_retries
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (transient: {})", self.transient)
        }
    }

    impl Transient for TestError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, 2.0, Duration::from_millis(1))
    }

    #[test]
    fn test_delay_bounds() {
        let policy = RetryPolicy::default();

        for k in 1..5 {
            let floor = Duration::from_secs_f64(2f64.powi(k as i32));
            let ceiling = floor + Duration::from_secs(1);

            for _ in 0..50 {
                let delay = policy.next_delay(k);
                assert!(delay >= floor, "delay {:?} below {:?}", delay, floor);
                assert!(delay < ceiling, "delay {:?} not below {:?}", delay, ceiling);
            }
        }
    }

    #[test]
    fn test_delay_for_exact() {
        let policy = RetryPolicy::new(5, 3.0, Duration::from_secs(1));

        assert_eq!(policy.delay_for(1, 0.0), Duration::from_secs(3));
        assert_eq!(policy.delay_for(2, 0.5), Duration::from_millis(9500));
    }

    #[tokio::test]
    async fn test_permanent_transient_failure_invokes_exactly_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = fast_policy(4);

        let result: Result<(), _> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError { transient: true })
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match assert_err!(result) {
            RetryError::Exhausted { attempts, .. } => assert_eq!(attempts, 4),
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = fast_policy(5);

        let result = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(TestError { transient: true })
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(assert_ok!(result), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_transient_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = fast_policy(5);

        let result: Result<(), _> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TestError { transient: false })
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(RetryError::Permanent(_))));
    }

    #[tokio::test]
    async fn test_single_attempt_policy_does_not_sleep() {
        let policy = RetryPolicy::new(1, 2.0, Duration::from_secs(60));
        let started = std::time::Instant::now();

        let result: Result<(), _> = policy
            .run(|| async { Err(TestError { transient: true }) })
            .await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
