//! # Extension Configuration
//!
//! Runtime settings for the notification pipeline: the host application's
//! bundle identifier, scheduler pool size, the default delivery deadline and
//! telemetry options.
//!
//! ## Sources
//!
//! Settings are layered, later sources winning:
//!
//! 1. Serde defaults on every field
//! 2. An optional configuration file (any format the `config` crate detects
//!    from the extension, e.g. `extension.toml`)
//! 3. Environment variables prefixed with `PUSH_EXTENSION__`, nested with
//!    `__` (e.g. `PUSH_EXTENSION__SCHEDULER__MAX_CONCURRENCY=8`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use push_extension_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load_from("config/extension.toml")?;
//! let deadline = manager.config().deadline();
//! let pool = manager.config().scheduler.max_concurrency;
//! # Ok(())
//! # }
//! ```

pub mod loader;

use crate::constants::defaults;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use loader::ConfigManager;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Bundle identifier of the host application, used for deep link lookup
    /// and delivery telemetry
    #[serde(default)]
    pub app_bundle_id: String,
    #[serde(default = "ConfigManager::detect_environment")]
    pub environment: String,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Default deadline applied when the host supplies none
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            app_bundle_id: String::new(),
            environment: ConfigManager::detect_environment(),
            scheduler: SchedulerConfig::default(),
            deadline_ms: default_deadline_ms(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl ExtensionConfig {
    pub fn for_bundle(app_bundle_id: impl Into<String>) -> Self {
        Self {
            app_bundle_id: app_bundle_id.into(),
            ..Self::default()
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.app_bundle_id.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "app_bundle_id",
                "bundle identifier is required",
            ));
        }

        if self.deadline_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "deadline_ms",
                "deadline must be greater than 0",
            ));
        }

        self.scheduler.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Upper bound on operations executing at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.max_concurrency",
                "pool size must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Publish scheduler lifecycle events on the in-process event bus
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel_capacity: default_channel_capacity(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "telemetry.channel_capacity",
                "channel capacity must be greater than 0",
            ));
        }
        Ok(())
    }
}

fn default_deadline_ms() -> u64 {
    defaults::DEADLINE_MS
}

fn default_max_concurrency() -> usize {
    defaults::MAX_CONCURRENCY
}

fn default_channel_capacity() -> usize {
    defaults::TELEMETRY_CHANNEL_CAPACITY
}

fn default_true() -> bool {
    true
}
