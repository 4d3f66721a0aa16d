//! Fixed window rate limiter keyed by connection.

use std::collections::HashMap;

use super::value_object::{ConnectionId, Timestamp};

/// `max` events per `window_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max: u32,
    pub window_ms: i64,
}

impl RateLimit {
    pub const fn new(max: u32, window_ms: i64) -> Self {
        Self { max, window_ms }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Timestamp,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: RateLimit,
    windows: HashMap<ConnectionId, Window>,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            windows: HashMap::new(),
        }
    }

    /// Count one attempt for `key`.
    ///
    /// Returns the milliseconds until the current window closes when the quota
    /// is already used up. A rejected attempt is not counted.
    pub fn try_acquire(&mut self, key: &ConnectionId, now: Timestamp) -> Result<(), i64> {
        let limit = self.limit;
        let window = self.windows.entry(key.clone()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        let elapsed = now.millis_since(window.started_at);
        if elapsed >= limit.window_ms || elapsed < 0 {
            *window = Window {
                started_at: now,
                count: 0,
            };
        }

        if window.count >= limit.max {
            let retry_after = limit.window_ms - now.millis_since(window.started_at);
            return Err(retry_after.max(1));
        }

        window.count += 1;
        Ok(())
    }

    pub fn forget(&mut self, key: &ConnectionId) {
        self.windows.remove(key);
    }

    /// Number of keys currently tracked
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}
