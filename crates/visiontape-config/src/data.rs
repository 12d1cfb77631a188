//! Remote data source and connector configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Binance Vision spot daily trades
pub const DEFAULT_BASE_URL: &str = "https://data.binance.vision/data/spot/daily/trades";

/// 500 MiB ceiling on a single archive download
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 500 * 1024 * 1024;

/// Data source and connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Base URL up to (not including) the symbol directory
    pub base_url: String,

    /// Deadline for a whole download, in seconds
    pub request_timeout_secs: u64,

    /// Idle connections kept in the pool
    pub max_idle_connections: usize,

    /// Concurrent connections allowed to the data host
    pub max_connections_per_host: usize,

    /// Seconds an idle pooled connection is kept alive
    pub idle_timeout_secs: u64,

    /// Hard ceiling on response body size in bytes
    pub max_response_bytes: u64,

    /// Stop reading a CSV member after this many trades (unlimited when absent)
    pub max_trades_per_member: Option<usize>,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            max_idle_connections: 100,
            max_connections_per_host: 10,
            idle_timeout_secs: 90,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            max_trades_per_member: None,
            user_agent: concat!("visiontape/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl DataConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = DataConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.idle_timeout(), Duration::from_secs(90));
        assert_eq!(config.max_response_bytes, 524_288_000);
        assert!(config.max_trades_per_member.is_none());
    }

    #[test]
    fn test_user_agent_carries_version() {
        let config = DataConfig::default();
        assert!(config.user_agent.starts_with("visiontape/"));
    }
}
