//! Configuration Loader
//!
//! Environment-aware loading built on the `config` crate: serde defaults,
//! then an optional file, then prefixed environment variables.

use super::ExtensionConfig;
use crate::constants::defaults;
use crate::error::ConfigurationError;
use ::config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: ExtensionConfig,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// Load from environment variables only
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::build(None, defaults::ENV_PREFIX)
    }

    /// Load from an optional file plus `PUSH_EXTENSION__*` overrides. A missing
    /// file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Arc<ConfigManager>> {
        Self::build(Some(path.as_ref()), defaults::ENV_PREFIX)
    }

    /// Same as [`ConfigManager::load_from`] with a custom environment prefix.
    /// Tests use this to avoid clobbering each other's variables.
    pub fn load_with_env_prefix(
        path: impl AsRef<Path>,
        prefix: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::build(Some(path.as_ref()), prefix)
    }

    /// Wrap an already-built configuration, validating it first
    pub fn from_config(config: ExtensionConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            source: None,
        }))
    }

    fn build(path: Option<&Path>, prefix: &str) -> ConfigResult<Arc<ConfigManager>> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Reading configuration file");
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config: ExtensionConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %config.environment,
            app_bundle_id = %config.app_bundle_id,
            max_concurrency = config.scheduler.max_concurrency,
            deadline_ms = config.deadline_ms,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            source: path.filter(|p| p.exists()).map(Path::to_path_buf),
        }))
    }

    pub fn config(&self) -> &ExtensionConfig {
        &self.config
    }

    /// File the configuration was read from, if one existed
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn environment(&self) -> &str {
        &self.config.environment
    }

    /// Environment name from `PUSH_EXTENSION_ENV` or `APP_ENV`, defaulting to
    /// development.
    pub fn detect_environment() -> String {
        env::var("PUSH_EXTENSION_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| defaults::ENVIRONMENT.to_string())
            .to_lowercase()
    }
}
