//! Per-client sliding-window rate limiting.
//!
//! Each key keeps the instants of its admitted requests inside the trailing
//! window. Expired instants are dropped on every check for that key, and a
//! background sweep removes keys that have gone quiet.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

/// Admission rule: at most `max_requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub max_requests: usize,
    pub window: Duration,
}

impl RatePolicy {
    pub const fn new(max_requests: usize, window: Duration) -> Self {
        Self { max_requests, window }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: usize },
    /// `retry_after` is when the oldest counted request leaves the window.
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

#[derive(Debug)]
pub struct SlidingWindowLimiter {
    policy: RatePolicy,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(policy: RatePolicy) -> Self {
        Self {
            policy,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> RatePolicy {
        self.policy
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Record an attempt at `now`. Rejected attempts are not counted.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let Ok(mut hits) = self.hits.lock() else {
            // A poisoned map only loses counters; fail open.
            return RateDecision::Allowed { remaining: 0 };
        };
        let window = self.policy.window;
        let ring = hits.entry(key.to_string()).or_default();

        while ring.front().is_some_and(|t| now.saturating_duration_since(*t) >= window) {
            ring.pop_front();
        }

        if ring.len() >= self.policy.max_requests {
            let retry_after = ring
                .front()
                .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(window);
            return RateDecision::Limited { retry_after };
        }

        ring.push_back(now);
        RateDecision::Allowed {
            remaining: self.policy.max_requests - ring.len(),
        }
    }

    /// Drop expired instants and empty keys. Returns how many keys remain.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let Ok(mut hits) = self.hits.lock() else {
            return 0;
        };
        let window = self.policy.window;
        hits.retain(|_, ring| {
            while ring.front().is_some_and(|t| now.saturating_duration_since(*t) >= window) {
                ring.pop_front();
            }
            !ring.is_empty()
        });
        hits.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.hits.lock().map(|h| h.len()).unwrap_or(0)
    }

    /// Sweep every `every` until the limiter is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(limiter) = weak.upgrade() else { break };
                let remaining = limiter.sweep_at(Instant::now());
                tracing::trace!(remaining, "rate limiter swept");
            }
        })
    }
}
