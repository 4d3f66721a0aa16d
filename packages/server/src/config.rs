//! Server configuration.

use std::time::Duration;

use crate::domain::{CodePolicy, HubPolicy, RateLimit};

/// Everything the binary can tune
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Lifetime of an issued pairing code
    pub code_ttl: Duration,
    /// Approved pairings a single code allows
    pub code_max_uses: u32,
    /// `generateCode` requests per admin per `rate_window`
    pub issue_limit: u32,
    /// `redeemCode` requests per connection per `rate_window`
    pub redeem_limit: u32,
    pub rate_window: Duration,
    pub code_sweep_interval: Duration,
    pub liveness_sweep_interval: Duration,
    /// Connections silent for longer than this are disconnected
    pub liveness_timeout: Duration,
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            code_ttl: Duration::from_secs(5 * 60),
            code_max_uses: 1,
            issue_limit: 3,
            redeem_limit: 5,
            rate_window: Duration::from_secs(60),
            code_sweep_interval: Duration::from_secs(60),
            liveness_sweep_interval: Duration::from_secs(25),
            liveness_timeout: Duration::from_secs(75),
            max_connections: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn hub_policy(&self) -> HubPolicy {
        let window_ms = duration_millis(self.rate_window);
        HubPolicy {
            codes: CodePolicy {
                ttl_ms: duration_millis(self.code_ttl),
                max_uses: self.code_max_uses.max(1),
                issue_limit: RateLimit::new(self.issue_limit, window_ms),
                redeem_limit: RateLimit::new(self.redeem_limit, window_ms),
                ..CodePolicy::default()
            },
            max_connections: self.max_connections,
        }
    }

    pub fn liveness_timeout_ms(&self) -> i64 {
        duration_millis(self.liveness_timeout)
    }
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
