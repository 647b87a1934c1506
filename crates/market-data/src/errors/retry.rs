use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use super::MarketDataError;

/// Classification for retry policy.
///
/// | Class | Retried? |
/// |-------|----------|
/// | `Never` | No, the failure is returned as-is |
/// | `WithBackoff` | Yes, up to [`RetryPolicy::max_attempts`] with exponential delay |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Bad request, quota exhaustion, malformed payload. Retrying won't help.
    Never,

    /// Timeouts, 5xx responses and dropped connections.
    WithBackoff,
}

/// Fixed retry policy shared by every live provider.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt. Doubles on each further attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `attempt` (1-based) has failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// policy's attempt cap is reached.
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    provider: &str,
    mut op: F,
) -> Result<T, MarketDataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MarketDataError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if err.retry_class() == RetryClass::Never || attempt >= max_attempts {
                    debug!(
                        "{} giving up after attempt {}/{}: {}",
                        provider, attempt, max_attempts, err
                    );
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} attempt {}/{} failed ({}), retrying in {:?}",
                    provider, attempt, max_attempts, err, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
