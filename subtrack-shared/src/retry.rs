//! Bounded exponential-backoff retry for transient store failures.
//!
//! Every orchestrated store operation runs through [`retry_with_backoff`].
//! Errors carry their own retry classification via the [`Retryable`] trait:
//! transient faults (lost connections, pool timeouts) are retried with an
//! exponentially growing delay, while logical failures (not-found, invalid
//! input) return immediately — retrying a logically false precondition
//! cannot succeed.
//!
//! The backoff sleeps on the calling task only; other requests are never
//! delayed. Dropping the future (e.g. the client disconnects) aborts before
//! the next attempt.

use std::future::Future;
use std::time::Duration;

/// Classifies errors as transient (worth retrying) or terminal.
pub trait Retryable {
    /// Returns true when a retry of the failed operation could succeed.
    fn is_retryable(&self) -> bool;
}

/// Configuration for retry behavior.
///
/// Defines the parameters for exponential backoff retry logic. The delay
/// before retry `k` (1-based) is `initial_delay * multiplier^(k-1)`, capped
/// at `max_delay`. A policy value is constructed per call site and carries
/// no shared state between calls.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use subtrack_shared::retry::RetryPolicy;
///
/// // Default policy: 4 attempts (1 + 3 retries) with 2s/4s/8s delays
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 4);
///
/// // Custom policy for latency-sensitive paths
/// let fast = RetryPolicy {
///     max_attempts: 2,
///     initial_delay: Duration::from_millis(50),
///     max_delay: Duration::from_secs(1),
///     backoff_multiplier: 2.0,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first (default: 4)
    pub max_attempts: u32,
    /// Delay before the first retry (default: 2s)
    pub initial_delay: Duration,
    /// Ceiling on the delay between retries (default: 8s)
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (default: 2.0)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy with custom maximum attempts.
    ///
    /// # Examples
    ///
    /// ```
    /// use subtrack_shared::retry::RetryPolicy;
    ///
    /// let policy = RetryPolicy::with_max_attempts(6);
    /// assert_eq!(policy.max_attempts, 6);
    /// ```
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Calculates the delay after a failed attempt (0-based).
    ///
    /// delay = `initial_delay` * (multiplier ^ attempt), capped at
    /// `max_delay`.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }
}

/// Executes an operation with exponential backoff retry.
///
/// Runs the operation up to `policy.max_attempts` times. A failure is
/// retried only when [`Retryable::is_retryable`] says so; terminal errors
/// are returned to the caller immediately, without sleeping.
///
/// On exhaustion the last error is returned. This function never panics
/// across the boundary; callers inspect the returned `Result`. A policy
/// with `max_attempts` of 0 is treated as 1: the operation always runs at
/// least once.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use subtrack_shared::retry::{retry_with_backoff, Retryable, RetryPolicy};
///
/// #[derive(Debug)]
/// struct Transient;
///
/// impl Retryable for Transient {
///     fn is_retryable(&self) -> bool {
///         true
///     }
/// }
///
/// # impl std::fmt::Display for Transient {
/// #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
/// #         f.write_str("transient")
/// #     }
/// # }
///
/// # async fn example() -> Result<u32, Transient> {
/// let policy = RetryPolicy {
///     initial_delay: std::time::Duration::from_millis(1),
///     ..RetryPolicy::default()
/// };
/// let calls = AtomicU32::new(0);
///
/// let value = retry_with_backoff(&policy, || async {
///     if calls.fetch_add(1, Ordering::Relaxed) < 2 {
///         Err(Transient)
///     } else {
///         Ok(42)
///     }
/// })
/// .await?;
///
/// assert_eq!(value, 42);
/// # Ok(value)
/// # }
/// ```
///
/// # Errors
///
/// Returns the last error encountered if all retry attempts fail, or
/// immediately returns the first non-retryable error.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    // Fields are public, so the attempt floor is enforced here rather than
    // trusted from configuration
    let max_attempts = policy.max_attempts.max(1);

    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(attempt = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                if !error.is_retryable() {
                    tracing::debug!(error = %error, "Terminal failure, not retrying");
                    return Err(error);
                }

                if attempt + 1 >= max_attempts {
                    tracing::warn!(
                        attempts = max_attempts,
                        error = %error,
                        "Retry budget exhausted"
                    );
                    return Err(error);
                }

                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    error = %error,
                    "Transient failure, will retry"
                );

                let delay = policy.delay_for_attempt(attempt);
                tracing::debug!(delay_ms = delay.as_millis(), "Sleeping before retry");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
