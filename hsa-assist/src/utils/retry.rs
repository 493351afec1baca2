//! Bounded retry with a fixed delay
//!
//! Every failure is retried the same way, whatever its class: a rejected
//! request is retried just like a transport failure. Only the last error is
//! returned once the attempt budget is spent.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempt budget and inter-attempt delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts_allowed: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `attempts_allowed` counts the initial attempt; 0 is treated as 1
    pub fn new(attempts_allowed: u32, delay: Duration) -> Self {
        Self {
            attempts_allowed: attempts_allowed.max(1),
            delay,
        }
    }

    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn attempts_allowed(&self) -> u32 {
        self.attempts_allowed
    }

    /// Additional attempts after the first failure
    pub fn retry_budget(&self) -> u32 {
        self.attempts_allowed - 1
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    /// 2 retries (3 attempts) one second apart
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Run `operation` until it succeeds or the policy's attempts are exhausted.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "classification", "approval")
/// * `policy` - Attempt budget and delay
/// * `operation` - Async closure performing one attempt
///
/// # Returns
/// The first success, or the error of the final attempt
pub async fn retry_with_delay<F, Fut, T, E>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.attempts_allowed();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        "Request succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if attempt >= max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Request failed, retry budget exhausted"
                    );
                    return Err(err);
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    delay_ms = policy.delay().as_millis() as u64,
                    error = %err,
                    "Request failed, will retry"
                );

                tokio::time::sleep(policy.delay()).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(5))
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts_allowed(), 3);
        assert_eq!(policy.retry_budget(), 2);
        assert_eq!(policy.delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts_allowed(), 1);
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = retry_with_delay("test_op", &fast_policy(3), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<i32, String>(42)
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let result = retry_with_delay("test_op", &fast_policy(3), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(format!("failure {}", n))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_returns_last_error_after_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_delay("test_op", &fast_policy(3), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Err(format!("failure {}", n))
        })
        .await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_policy_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry_with_delay("test_op", &RetryPolicy::no_retry(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("nope")
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_waits_between_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(40));
        let start = Instant::now();

        let _: Result<(), &str> = retry_with_delay("test_op", &policy, || async { Err("down") }).await;

        // Two waits between three attempts, none after the last
        assert!(start.elapsed() >= Duration::from_millis(80));
    }
}
