//! Configuration management for visiontape
//!
//! Centralized configuration handling with support for:
//! - Default values
//! - Configuration files (TOML)
//! - Environment variables
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables (`VISIONTAPE_DATA__REQUEST_TIMEOUT_SECS=60`)
//! 3. Configuration file (`visiontape.toml`)
//! 4. Default values

mod app;
mod data;

pub use app::{AppConfig, LogLevel};
pub use data::DataConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure containing all configuration categories
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Application-wide settings
    pub app: AppConfig,

    /// Remote data source and connector settings
    pub data: DataConfig,
}

impl Settings {
    /// Load configuration from multiple sources with proper precedence
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(
                config::File::with_name("visiontape")
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(Self::environment());

        builder.build()?.try_deserialize()
    }

    /// Load configuration from a specific file path (environment still applies)
    pub fn load_from_file(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(Self::environment());

        builder.build()?.try_deserialize()
    }

    /// Merge command-line arguments into the loaded configuration
    pub fn merge_cli_args(mut self, cli_args: &dyn CliConfigMerge) -> Self {
        cli_args.merge_into_config(&mut self);
        self
    }

    // Field names contain underscores, so nesting uses a double underscore.
    fn environment() -> config::Environment {
        config::Environment::with_prefix("VISIONTAPE")
            .prefix_separator("_")
            .separator("__")
    }
}

/// Trait for merging CLI arguments into configuration
pub trait CliConfigMerge {
    fn merge_into_config(&self, config: &mut Settings);
}
