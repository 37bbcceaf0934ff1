//! Bounded polling with exponential backoff.
//!
//! Used where an upstream system is only eventually consistent, e.g. a
//! freshly created provider session that is not yet visible to reads.
//!
//! Strategy:
//! - Initial delay: [`BackoffPolicy::initial_delay`]
//! - Multiplier: 2x per attempt
//! - Each sleep is capped at the remaining budget, so the total wait never
//!   exceeds [`BackoffPolicy::timeout`]

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Default first retry delay.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Timing parameters for [`poll_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the second attempt.
    pub initial_delay: Duration,

    /// Total time budget across all attempts.
    pub timeout: Duration,
}

impl BackoffPolicy {
    /// Policy with the default initial delay and the given budget.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            timeout,
        }
    }
}

/// The budget ran out before the check produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    /// Number of check invocations made.
    pub attempts: u32,

    /// Wall time spent polling.
    pub waited: Duration,
}

/// Repeatedly run `check` until it yields `Some`, sleeping with exponential
/// backoff between attempts.
///
/// The check always runs at least once, even with a zero budget.
///
/// # Errors
///
/// Returns [`Elapsed`] when the budget is exhausted without a value.
pub async fn poll_until<T, F, Fut>(policy: BackoffPolicy, mut check: F) -> Result<T, Elapsed>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let start = Instant::now();
    let mut delay = policy.initial_delay;
    let mut attempts: u32 = 0;

    loop {
        attempts = attempts.saturating_add(1);
        if let Some(value) = check().await {
            return Ok(value);
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.timeout {
            tracing::debug!(
                target: "common.backoff",
                attempts,
                waited_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "Polling budget exhausted"
            );
            return Err(Elapsed {
                attempts,
                waited: elapsed,
            });
        }

        let remaining = policy.timeout.saturating_sub(elapsed);
        sleep(delay.min(remaining)).await;

        delay = delay.saturating_mul(2);
    }
}
