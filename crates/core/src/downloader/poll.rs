//! Bounded "wait until a condition holds" primitive.
//!
//! The acquisition tool gives no completion signal besides the file it
//! leaves behind, so callers poll for it with a fixed attempt budget.

use std::future::Future;

use tokio::time::{sleep, Duration};

/// Attempt budget and spacing for `poll_until`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval_ms: u64) -> Self {
        Self {
            max_attempts,
            interval: Duration::from_millis(interval_ms),
        }
    }

    /// Upper bound on time spent sleeping between attempts.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Run `check` until it yields `Some`, at most `policy.max_attempts` times.
///
/// Sleeps `policy.interval` between attempts, never after the last one.
pub async fn poll_until<T, F, Fut>(policy: PollPolicy, mut check: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=policy.max_attempts {
        if let Some(value) = check().await {
            return Some(value);
        }
        if attempt < policy.max_attempts {
            sleep(policy.interval).await;
        }
    }
    None
}
