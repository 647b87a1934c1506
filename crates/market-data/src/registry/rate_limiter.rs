//! Fixed-window token bucket rate limiter for market data providers.
//!
//! Each provider gets a bucket holding its per-minute quota. The bucket is
//! refilled to full capacity once a full window has elapsed since the last
//! refill, which mirrors how free-tier provider quotas are counted.
//! Acquisition never blocks: callers treat a denied permit as the provider
//! being temporarily unavailable.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::models::ProviderId;

/// Default quota for providers without explicit configuration.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Length of a quota window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Token bucket for a single provider.
#[derive(Debug)]
struct TokenBucket {
    /// Tokens left in the current window.
    tokens: u32,
    /// Full-window capacity.
    capacity: u32,
    /// Start of the current window.
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32) -> Self {
        Self {
            tokens: capacity,
            capacity,
            last_refill: Instant::now(),
        }
    }

    /// Refill to capacity if the window has rolled over.
    fn refill(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_refill) >= WINDOW {
            self.tokens = self.capacity;
            self.last_refill = now;
        }
    }

    /// Take `n` tokens, or none at all.
    fn try_acquire_n(&mut self, n: u32) -> bool {
        self.refill();

        if self.tokens >= n {
            self.tokens -= n;
            true
        } else {
            false
        }
    }
}

/// Per-provider rate limiter.
///
/// Thread-safe; buckets are created on first use from the configured quota
/// (or [`DEFAULT_REQUESTS_PER_MINUTE`]). State lives in memory only.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    quotas: Mutex<HashMap<String, u32>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            quotas: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the buckets mutex, recovering from poison if necessary.
    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<String, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_quotas(&self) -> MutexGuard<'_, HashMap<String, u32>> {
        self.quotas.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter quotas mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Set the per-minute quota for a provider. Resets its current window.
    pub fn configure(&self, provider: &ProviderId, requests_per_minute: u32) {
        self.lock_quotas()
            .insert(provider.to_string(), requests_per_minute);
        self.lock_buckets().remove(provider.as_ref());
    }

    /// Take one permit for `provider`. Returns false when the quota is spent.
    pub fn try_acquire(&self, provider: &ProviderId) -> bool {
        self.try_acquire_n(provider, 1)
    }

    /// Take `n` permits at once, or none.
    ///
    /// Used by providers whose single logical fetch costs several requests.
    pub fn try_acquire_n(&self, provider: &ProviderId, n: u32) -> bool {
        let capacity = self.quota(provider);
        let mut buckets = self.lock_buckets();
        let bucket = buckets
            .entry(provider.to_string())
            .or_insert_with(|| TokenBucket::new(capacity));

        let acquired = bucket.try_acquire_n(n);
        if acquired {
            debug!(
                "Rate limiter: acquired {} token(s) for '{}', {} left",
                n, provider, bucket.tokens
            );
        } else {
            debug!(
                "Rate limiter: '{}' denied, {} token(s) left, {} needed",
                provider, bucket.tokens, n
            );
        }
        acquired
    }

    /// Tokens left in the provider's current window.
    pub fn remaining(&self, provider: &ProviderId) -> u32 {
        let capacity = self.quota(provider);
        let mut buckets = self.lock_buckets();
        match buckets.get_mut(provider.as_ref()) {
            Some(bucket) => {
                bucket.refill();
                bucket.tokens
            }
            None => capacity,
        }
    }

    /// Configured quota, or the default.
    pub fn quota(&self, provider: &ProviderId) -> u32 {
        self.lock_quotas()
            .get(provider.as_ref())
            .copied()
            .unwrap_or(DEFAULT_REQUESTS_PER_MINUTE)
    }

    /// Forget a provider's window so it starts full again.
    pub fn reset(&self, provider: &ProviderId) {
        self.lock_buckets().remove(provider.as_ref());
    }

    #[cfg(test)]
    fn rewind(&self, provider: &ProviderId, by: Duration) {
        if let Some(bucket) = self.lock_buckets().get_mut(provider.as_ref()) {
            bucket.last_refill -= by;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
