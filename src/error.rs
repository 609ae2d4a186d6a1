//! Error types for the push extension core.
//!

use crate::models::ConfigScope;
use thiserror::Error;

/// Top-level error for the extension surface.
///
/// Node-level failures never reach this type: operations swallow their own
/// fetch failures and the completion callback always receives content.
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Broadcast error: {0}")]
    Broadcast(#[from] BroadcastError),
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

pub type ExtensionResult<T> = std::result::Result<T, ExtensionError>;

/// Malformed dependency graph. The only fatal condition in the engine, raised
/// while the graph is being built and never at run time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Operation '{id}' is registered more than once")]
    DuplicateOperation { id: String },
    #[error("Operation '{dependent}' depends on unknown operation '{dependency}'")]
    DanglingDependency { dependent: String, dependency: String },
    #[error("Operation '{id}' depends on itself")]
    SelfDependency { id: String },
    #[error("Dependency cycle detected through operations {involved:?}")]
    CycleDetected { involved: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Invalid state transition for operation '{id}': {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },
    #[error("Scheduler driver stopped before every operation settled")]
    DriverStopped,
}

/// A remote fetch (configuration or media) that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Fetching {scope} configuration failed: {reason}")]
    Configuration { scope: ConfigScope, reason: String },
    #[error("Fetching media from {url} failed: {reason}")]
    Media { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Failed to write '{key}': {reason}")]
    WriteFailed { key: String, reason: String },
    #[error("Stored value for '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Failure surfaced by a fail-fast broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    #[error("Component '{component}' failed during '{call}': {reason}")]
    ComponentFailed {
        component: String,
        call: String,
        reason: String,
    },
}

/// Error a single component returns from a fallible capability call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ComponentError {
    pub reason: String,
}

impl ComponentError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Notification payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Notification payload is missing required field '{0}'")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    #[error("Telemetry channel is closed")]
    ChannelClosed,
    #[error("Telemetry sink rejected record: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigurationError {
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
