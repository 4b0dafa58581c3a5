//! Bounded, interruptible waiting.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Returned when every attempt of a [`BoundedWait`] elapsed without a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("gave up after {attempts} attempts")]
pub struct WaitExhausted {
    pub attempts: u32,
}

/// Wait for something in slices of `interval`, at most `max_attempts` times.
///
/// Each attempt races a freshly created future against `interval`; the first
/// future to finish wins. The overall wait is therefore bounded by
/// `interval * max_attempts`, and the caller gets control back between
/// slices instead of parking forever on a single blocking call.
///
/// The attempt future is dropped when its slice elapses, so it must be
/// cancel-safe (`TcpListener::accept` is).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ion_publish::util::poll::BoundedWait;
///
/// # async fn example() {
/// let wait = BoundedWait::new(Duration::from_millis(10), 3);
/// let value = wait.run(|| async { 7 }).await;
/// assert_eq!(value, Ok(7));
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedWait {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl BoundedWait {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Total time budget across all attempts.
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }

    pub async fn run<F, Fut, T>(&self, mut attempt: F) -> Result<T, WaitExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = T>,
    {
        for n in 1..=self.max_attempts {
            match tokio::time::timeout(self.interval, attempt()).await {
                Ok(value) => return Ok(value),
                Err(_) => {
                    tracing::trace!(
                        attempt = n,
                        max_attempts = self.max_attempts,
                        "bounded wait slice elapsed"
                    );
                }
            }
        }
        Err(WaitExhausted {
            attempts: self.max_attempts,
        })
    }
}
