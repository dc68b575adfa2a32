//! Retry policy and the classifier-driven backoff loop.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::time::Sleeper;

/// Configuration for exponential backoff.
///
/// The delay before retry `k` (0-indexed) is `initial_delay * 2^k`. There is
/// no jitter and no cap. The delay is only applied when another attempt
/// follows, never after the last attempt.
///
/// # Defaults
///
/// - `max_attempts`: 10
/// - `initial_delay`: 1 second
///
/// # Example
///
/// ```
/// use meteo_cooloff::fetch::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(4)
///     .with_initial_delay(Duration::from_millis(500));
///
/// assert_eq!(policy.delay_for_retry(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    ///
    /// A value of 1 means no retries.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,
}

impl RetryPolicy {
    /// Default maximum attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

    /// Default initial delay (1 second).
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

    /// Minimum value for `max_attempts`.
    pub const MIN_MAX_ATTEMPTS: u32 = 1;

    /// Growth factor applied to the delay after each retry.
    pub const MULTIPLIER: u32 = 2;

    /// Creates a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
        }
    }

    /// Sets the maximum number of attempts.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is less than 1.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        assert!(
            max_attempts >= Self::MIN_MAX_ATTEMPTS,
            "max_attempts must be at least 1"
        );
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay before the first retry.
    ///
    /// Zero is accepted, which turns backoff into a tight loop.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Computes the delay before a given retry (0 = before the second attempt).
    ///
    /// Saturates at [`Duration::MAX`].
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        Self::MULTIPLIER
            .checked_pow(retry)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Returns true if another attempt may follow attempt number `attempt` (1-indexed).
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifier decision for a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Wait for the cooloff, then try again if the budget allows.
    Retry,
    /// Stop immediately and surface the error.
    Fatal,
}

/// Why [`retry_with_backoff`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The classifier marked an error as fatal.
    Fatal {
        /// Attempts made, including the fatal one
        attempts: u32,
        /// The fatal error
        error: E,
    },
    /// Every attempt failed with a retryable error.
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last_error: E,
    },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up.
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Fatal { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// Returns the underlying error.
    pub fn into_inner(self) -> E {
        match self {
            Self::Fatal { error, .. } => error,
            Self::Exhausted { last_error, .. } => last_error,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal { attempts, error } => {
                write!(f, "fatal error on attempt {attempts}: {error}")
            }
            Self::Exhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {attempts} attempts: {last_error}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fatal { error, .. } => Some(error),
            Self::Exhausted { last_error, .. } => Some(last_error),
        }
    }
}

/// Runs `operation` until it succeeds, the classifier returns
/// [`Verdict::Fatal`], or the attempt budget is spent.
///
/// `operation` receives the 1-indexed attempt number. Between attempts the
/// sleeper waits [`RetryPolicy::delay_for_retry`]; nothing is awaited after
/// the final attempt.
///
/// # Errors
///
/// Returns [`RetryError::Fatal`] for an error classified as fatal and
/// [`RetryError::Exhausted`] when `policy.max_attempts` attempts all failed.
pub async fn retry_with_backoff<T, E, S, C, Op, Fut>(
    policy: &RetryPolicy,
    sleeper: &S,
    mut classify: C,
    mut operation: Op,
) -> Result<T, RetryError<E>>
where
    E: fmt::Display,
    S: Sleeper,
    C: FnMut(&E) -> Verdict,
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;

    loop {
        let error = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if classify(&error) == Verdict::Fatal {
            tracing::warn!(attempt, %error, "Request failed with a non-retryable error");
            return Err(RetryError::Fatal {
                attempts: attempt,
                error,
            });
        }

        if !policy.should_retry(attempt) {
            tracing::warn!(attempt, %error, "Attempt budget exhausted");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last_error: error,
            });
        }

        let cooloff = policy.delay_for_retry(attempt - 1);
        tracing::warn!(attempt, %error, "Request attempt failed");
        tracing::info!(
            attempt,
            cooloff_secs = cooloff.as_secs_f64(),
            "Cooling off before retry"
        );
        sleeper.sleep(cooloff).await;
        attempt += 1;
    }
}
