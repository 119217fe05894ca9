//! Re-run a fallible task until it succeeds, bails, or runs out of attempts.
//!
//! The task decides how each attempt ends by returning an [`Attempt`]:
//! `Attempt::Retry` (also produced by `?` on a plain error) asks for another try,
//! while `Attempt::Bail`, built with [`Bail::with`], ends the sequence at once.
//!
//! Between failed attempts the controller sleeps for the configured fixed
//! `delay` and then for `backoff(attempt)`. When both are configured the two
//! sleeps are additive.

use std::{fmt, sync::Arc, time::Duration};

use crate::{
    error::{Attempt, Failure, RetryError},
    timing::sleep,
    tryit::TryIt,
};

/// Computes the extra wait after the given failed attempt (1-based).
pub type Backoff = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// Configuration for [`retry`].
///
/// Defaults to 3 attempts with no delay and no backoff.
#[derive(Clone)]
pub struct RetryOptions {
    /// Maximum number of attempts, including the first. Zero is treated as one.
    pub times: u32,
    /// Fixed wait between attempts.
    pub delay: Option<Duration>,
    /// Additional wait computed from the attempt number.
    pub backoff: Option<Backoff>,
}

impl RetryOptions {
    pub const DEFAULT_TIMES: u32 = 3;

    #[must_use]
    pub fn new() -> Self {
        Self {
            times: Self::DEFAULT_TIMES,
            delay: None,
            backoff: None,
        }
    }

    #[must_use]
    pub fn with_times(mut self, times: u32) -> Self {
        self.times = times;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    /// The wait applied after failed attempt `attempt`: `delay` plus
    /// `backoff(attempt)`.
    pub fn wait_after(&self, attempt: u32) -> Duration {
        let fixed = self.delay.unwrap_or_default();
        let computed = self.backoff.as_ref().map(|b| b(attempt)).unwrap_or_default();
        fixed.saturating_add(computed)
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("times", &self.times)
            .field("delay", &self.delay)
            .field("backoff", &self.backoff.as_ref().map(|_| "Fn(u32) -> Duration"))
            .finish()
    }
}

/// Exponential backoff: `initial * 2^(attempt - 1)`, saturating.
pub fn exponential(initial: Duration) -> impl Fn(u32) -> Duration + Send + Sync + 'static {
    move |attempt| {
        let exponent = attempt.saturating_sub(1);
        initial.saturating_mul(2u32.saturating_pow(exponent))
    }
}

/// Handed to the task on every attempt; used to end the retry sequence early.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bail {
    attempt: u32,
}

impl Bail {
    /// Wraps `error` so that returning it stops retrying immediately.
    pub fn with<E>(&self, error: E) -> Attempt<E> {
        Attempt::Bail(error)
    }

    /// The current attempt number, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Runs `task` until it succeeds, bails, or `options.times` attempts have
/// failed.
///
/// # Errors
///
/// - [`RetryError::Bailed`] with the bailed value, as soon as the task bails.
///   No further attempt and no delay follow.
/// - [`RetryError::Exhausted`] with the last failure once every attempt failed.
///   A panicking attempt counts as an ordinary failure.
///
/// # Example
/// ```
/// use asyncflow::{Attempt, RetryOptions, retry};
///
/// # futures::executor::block_on(async {
/// let result = retry(RetryOptions::new().with_times(5), |bail| async move {
///     if bail.attempt() < 3 {
///         return Err(Attempt::Retry("not yet"));
///     }
///     Ok(bail.attempt())
/// })
/// .await;
/// assert_eq!(result, Ok(3));
/// # });
/// ```
pub async fn retry<T, E, F, Fut>(options: RetryOptions, mut task: F) -> Result<T, RetryError<E>>
where
    F: FnMut(Bail) -> Fut,
    Fut: Future<Output = Result<T, Attempt<E>>>,
{
    let times = if options.times == 0 {
        tracing::warn!("retry called with times 0, making a single attempt");
        1
    } else {
        options.times
    };

    let mut attempt = 1;
    loop {
        let bail = Bail { attempt };
        let failure = match TryIt::start(|| task(bail)).await {
            Ok(value) => {
                tracing::trace!(attempt, "retry: attempt succeeded");
                return Ok(value);
            }
            Err(Failure::Error(Attempt::Bail(error))) => {
                tracing::debug!(attempt, "retry: task bailed");
                return Err(RetryError::Bailed(error));
            }
            Err(Failure::Error(Attempt::Retry(error))) => Failure::Error(error),
            Err(Failure::Panicked(message)) => Failure::Panicked(message),
        };

        if attempt >= times {
            tracing::debug!(attempts = attempt, "retry: attempts exhausted");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                error: failure,
            });
        }

        tracing::trace!(attempt, times, "retry: attempt failed");
        if let Some(delay) = options.delay {
            sleep(delay).await;
        }
        if let Some(backoff) = &options.backoff {
            sleep(backoff(attempt)).await;
        }
        attempt += 1;
    }
}
