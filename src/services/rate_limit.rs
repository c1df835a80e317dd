//! Process-wide request budget for the metadata provider.
//!
//! Every outbound attempt waits for a governor permit, which spaces requests
//! evenly across all concurrent recommendation requests. A 429 from the
//! provider halves the rate (down to 1/8th); the configured rate comes back
//! after a quiet minute.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const MAX_SLOWDOWN: u32 = 8;
const RECOVERY_WINDOW: Duration = Duration::from_secs(60);

pub struct RateBudget {
    limiter: ArcSwap<DirectLimiter>,
    base_period: Duration,
    slowdown: AtomicU32,
    last_rate_limited: Mutex<Option<Instant>>,
    recovery_window: Duration,
}

impl RateBudget {
    /// Budget allowing one request every `period`
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_nanos(1));
        Self {
            limiter: ArcSwap::from(Arc::new(limiter_for(period))),
            base_period: period,
            slowdown: AtomicU32::new(1),
            last_rate_limited: Mutex::new(None),
            recovery_window: RECOVERY_WINDOW,
        }
    }

    /// How long the provider must stay quiet before the full rate returns
    pub fn with_recovery_window(mut self, window: Duration) -> Self {
        self.recovery_window = window;
        self
    }

    /// Budget allowing `n` requests per second
    pub fn per_second(n: u32) -> Self {
        Self::new(Duration::from_secs(1) / n.max(1))
    }

    /// Waits until the budget allows one more request
    pub async fn acquire(&self) {
        self.maybe_recover();
        let limiter = self.limiter.load_full();
        limiter.until_ready().await;
    }

    /// Current slowdown factor, 1 when running at the configured rate
    pub fn slowdown(&self) -> u32 {
        self.slowdown.load(Ordering::SeqCst)
    }

    /// Called when the provider answered 429
    pub fn on_rate_limited(&self) {
        if let Ok(mut last) = self.last_rate_limited.lock() {
            *last = Some(Instant::now());
        }

        let previous = self
            .slowdown
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |f| {
                Some((f * 2).min(MAX_SLOWDOWN))
            })
            .unwrap_or(MAX_SLOWDOWN);
        let factor = (previous * 2).min(MAX_SLOWDOWN);

        if factor != previous {
            if let Some(period) = self.base_period.checked_mul(factor) {
                self.limiter.store(Arc::new(limiter_for(period)));
                tracing::warn!(slowdown = factor, "Provider rate limited us, slowing down");
            }
        }
    }

    fn maybe_recover(&self) {
        let quiet = self
            .last_rate_limited
            .lock()
            .ok()
            .and_then(|last| last.map(|t| t.elapsed() >= self.recovery_window))
            .unwrap_or(false);

        if quiet && self.slowdown.swap(1, Ordering::SeqCst) > 1 {
            self.limiter.store(Arc::new(limiter_for(self.base_period)));
            tracing::info!("Provider request rate restored");
        }
    }
}

fn limiter_for(period: Duration) -> DirectLimiter {
    // `with_period` only rejects a zero period, which `new` rules out.
    let quota = Quota::with_period(period).unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));
    RateLimiter::direct(quota)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_spaces_requests() {
        let budget = RateBudget::new(Duration::from_millis(20));
        let start = std::time::Instant::now();

        for _ in 0..3 {
            budget.acquire().await;
        }

        // First permit is immediate, the next two wait one period each.
        assert!(start.elapsed() >= Duration::from_millis(35));
    }

    #[test]
    fn test_rate_limited_doubles_slowdown_up_to_cap() {
        let budget = RateBudget::per_second(100);
        assert_eq!(budget.slowdown(), 1);

        budget.on_rate_limited();
        assert_eq!(budget.slowdown(), 2);

        for _ in 0..5 {
            budget.on_rate_limited();
        }
        assert_eq!(budget.slowdown(), MAX_SLOWDOWN);
    }

    #[tokio::test]
    async fn test_recovers_after_quiet_window() {
        let budget = RateBudget::per_second(1000).with_recovery_window(Duration::ZERO);
        budget.on_rate_limited();
        assert_eq!(budget.slowdown(), 2);

        budget.acquire().await;

        assert_eq!(budget.slowdown(), 1);
    }
}
