//! Application-wide configuration settings

use serde::{Deserialize, Serialize};

/// Application-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name for logging and identification
    pub name: String,

    /// Global log level (overridden by `RUST_LOG` when set)
    pub log_level: LogLevel,

    /// Maximum number of symbols fetched at the same time
    pub max_concurrent_fetches: usize,
}

/// Log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "visiontape".to_string(),
            log_level: LogLevel::Info,
            max_concurrent_fetches: 4,
        }
    }
}
