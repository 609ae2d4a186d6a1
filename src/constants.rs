//! # System Constants
//!
//! Operation identifiers, telemetry event names, repository keys and runtime
//! defaults shared across the notification pipeline.

/// Identifiers of the operations in the notification graph
pub mod operations {
    pub const DOWNLOAD_GLOBAL_CONFIGURATION: &str = "download_global_configuration";
    pub const DOWNLOAD_TENANT_CONFIGURATION: &str = "download_tenant_configuration";
    pub const MERGE_CONFIGURATION: &str = "merge_configuration";
    pub const REPORT_DELIVERY: &str = "report_delivery";
    pub const EXTRACT_DEEPLINK: &str = "extract_deeplink";
    pub const DOWNLOAD_MEDIA_ATTACHMENT: &str = "download_media_attachment";
}

/// Telemetry and lifecycle event names
pub mod events {
    pub const NOTIFICATION_DELIVERED: &str = "notification_delivered";

    pub const OPERATION_STARTED: &str = "operation.started";
    pub const OPERATION_SETTLED: &str = "operation.settled";
    pub const GRAPH_SETTLED: &str = "graph.settled";
}

/// Repository key names
pub mod keys {
    pub const GLOBAL_FRAGMENT: &str = "configuration.global";
    pub const TENANT_FRAGMENT: &str = "configuration.tenant";
    pub const MERGED: &str = "configuration.merged";
}

/// Paths into the merged configuration document read by the delivery reporter
pub mod settings {
    pub const EVENT_ENDPOINT: &str = "events.endpoint";
    pub const SITE_ID: &str = "events.site_id";
}

/// User info keys written into the delivered content
pub mod user_info {
    pub const DYNAMIC_LINK: &str = "dynamic_link";
}

/// Runtime defaults
pub mod defaults {
    pub const MAX_CONCURRENCY: usize = 4;
    /// Push service extensions get roughly thirty seconds; keep a margin.
    pub const DEADLINE_MS: u64 = 25_000;
    pub const TELEMETRY_CHANNEL_CAPACITY: usize = 256;
    pub const ENVIRONMENT: &str = "development";
    pub const ENV_PREFIX: &str = "PUSH_EXTENSION";
}
