#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Push Extension Core
//!
//! Deadline-bounded processing of inbound push notifications.
//!
//! ## Overview
//!
//! Every notification gets a small dependency graph of async operations:
//! two remote configuration downloads, a merge once both have settled, a
//! delivery report once the merge has settled, and two independent content
//! operations (deep link extraction, media download). The graph runs on a
//! bounded tokio pool. A one-shot completion gate hands the best-effort
//! content to the host exactly once, either when every operation has settled
//! or when the host's deadline arrives first.
//!
//! Operation failures are contained: a failed or panicking operation still
//! settles and its dependents still run. The only fatal condition is a
//! malformed graph, rejected when it is built.
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Graph builder, scheduler, completion gate, entry point
//! - [`operations`] - Configuration download/merge, reporting, content operations
//! - [`models`] - Payload, draft content, configuration and telemetry values
//! - [`state_machine`] - Per-operation lifecycle tracking
//! - [`registry`] - Capability-tagged component fan-out
//! - [`client`] - Collaborator traits the host implements
//! - [`storage`] - Configuration repository
//! - [`events`] - In-process event bus
//! - [`config`] - Configuration loading
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use push_extension_core::{
//!     Collaborators, ExtensionConfig, NotificationRequest, NotificationServiceExtension,
//! };
//! # use push_extension_core::client::{MediaFetcher, RemoteConfigurationNetworking};
//! # use std::sync::Arc;
//!
//! # async fn example(
//! #     networking: Arc<dyn RemoteConfigurationNetworking>,
//! #     media: Arc<dyn MediaFetcher>,
//! # ) {
//! let extension = NotificationServiceExtension::new(
//!     ExtensionConfig::for_bundle("com.example.app"),
//!     Collaborators::new(networking, media),
//! );
//!
//! let request = NotificationRequest::new(
//!     "notification-1",
//!     "Original title",
//!     "Original body",
//!     serde_json::json!({ "title": "Sale", "content": "Now on", "tenant_id": "1001" }),
//! );
//! let content = extension.handle(&request, None).await;
//! println!("Delivering '{}'", content.title);
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod operations;
pub mod orchestration;
pub mod registry;
pub mod state_machine;
pub mod storage;

pub use crate::config::{ConfigManager, ExtensionConfig, SchedulerConfig, TelemetryConfig};
pub use error::{
    BroadcastError, ExtensionError, ExtensionResult, FetchError, GraphError, SchedulerError,
};
pub use events::{EventPublisher, PublishedEvent};
pub use models::{
    ConfigFragment, ConfigScope, DraftResult, MergedConfiguration, NotificationPayload,
    NotificationRequest,
};
pub use orchestration::{
    operation_fn, Collaborators, CompletionGate, DependencyGraph, FiredBy, GraphBuilder,
    NotificationServiceExtension, NotificationSession, Operation, ReceiveOutcome, ScheduleReport,
    TaskScheduler,
};
pub use registry::{Capability, ComponentsPool, Eventable, Pushable};
pub use storage::{ConfigurationRepository, InMemoryConfigurationRepository};
