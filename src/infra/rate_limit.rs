use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

/// Outcome of one admission check. `retry_after_secs` is only meaningful
/// when the request was rejected.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Epoch milliseconds at which the key's current window ends.
    pub reset_ms: i64,
    pub retry_after_secs: u64,
}

/// Trait for rate limiting implementations.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, key: &str) -> RateLimitDecision;
}

struct WindowCounter {
    count: u64,
    reset_at_ms: i64,
}

/// Fixed-window counter per API key, held in process memory. A single
/// lock serializes the read-modify-write so concurrent requests on the
/// same key never lose increments.
///
/// Windows start at the first counted request and run for `window_ms`;
/// a request arriving strictly after the reset instant opens a new one.
pub struct FixedWindowRateLimiter {
    window_ms: i64,
    max_requests: u64,
    windows: Mutex<HashMap<String, WindowCounter>>,
}

impl FixedWindowRateLimiter {
    pub fn new(window_ms: u64, max_requests: u64) -> Self {
        Self {
            window_ms: window_ms as i64,
            max_requests,
            windows: Mutex::new(HashMap::new()),
        }
    }

    async fn check_at(&self, key: &str, now_ms: i64) -> RateLimitDecision {
        let mut windows = self.windows.lock().await;
        let counter = windows.entry(key.to_owned()).or_insert(WindowCounter {
            count: 0,
            reset_at_ms: now_ms + self.window_ms,
        });

        if now_ms > counter.reset_at_ms {
            counter.count = 0;
            counter.reset_at_ms = now_ms + self.window_ms;
        }

        if counter.count >= self.max_requests {
            let millis_left = counter.reset_at_ms - now_ms;
            return RateLimitDecision {
                allowed: false,
                limit: self.max_requests,
                remaining: 0,
                reset_ms: counter.reset_at_ms,
                retry_after_secs: (millis_left.max(0) as u64).div_ceil(1000).max(1),
            };
        }

        counter.count += 1;
        RateLimitDecision {
            allowed: true,
            limit: self.max_requests,
            remaining: self.max_requests - counter.count,
            reset_ms: counter.reset_at_ms,
            retry_after_secs: 0,
        }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowRateLimiter {
    async fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Utc::now().timestamp_millis()).await
    }
}
