//! # Logging
//!
//! `tracing` subscriber setup for hosts embedding the extension, plus the two
//! structured records the pipeline emits for lifecycle changes and contained
//! failures.
//!
//! Console output is human readable, with ANSI colors only on a terminal.
//! JSON output emits one object per event for log shipping.

use crate::config::{ConfigManager, TelemetryConfig};
use chrono::Utc;
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static SUBSCRIBER_INSTALLED: OnceLock<()> = OnceLock::new();

/// Install the console subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows the detected
/// environment. Later calls, and calls made after the host installed its own
/// global subscriber, do nothing.
pub fn init_structured_logging() {
    install(false);
}

/// Install a subscriber that writes one JSON object per event.
pub fn init_json_logging() {
    install(true);
}

/// Install whichever subscriber the telemetry settings ask for.
pub fn init_logging(telemetry: &TelemetryConfig) {
    install(telemetry.json_logs);
}

fn install(json: bool) {
    SUBSCRIBER_INSTALLED.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level(&environment)));

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(std::io::stdout().is_terminal())
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Host already owns the global subscriber, leaving it in place");
            return;
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json,
            "Logging initialized"
        );
    });
}

/// Production runs at info, everything else at debug
fn default_level(environment: &str) -> &'static str {
    if environment == "production" {
        "info"
    } else {
        "debug"
    }
}

/// Record an operation lifecycle change.
pub fn log_operation(action: &str, operation_id: &str, status: &str, details: Option<&str>) {
    tracing::info!(
        action = %action,
        operation = %operation_id,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "OPERATION"
    );
}

/// Record a failure the pipeline contained instead of propagating.
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
