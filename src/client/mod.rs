//! # Host Collaborators
//!
//! Traits the host application implements to plug transport, media download
//! and telemetry into the pipeline, plus the default deep link resolver.

pub mod traits;

pub use traits::{
    DeeplinkResolver, MediaAsset, MediaFetcher, PayloadDeeplinkResolver,
    RemoteConfigurationNetworking, TelemetrySink,
};
