//! # Collaborator Traits
//!
//! Contracts the notification pipeline consumes from the host. Transport,
//! storage and media download live behind these traits so the engine stays
//! independent of any particular platform.

use crate::error::{FetchError, TelemetryError};
use crate::models::{
    ConfigFragment, ConfigScope, DeliveryRecord, MediaDescriptor, NotificationPayload,
};
use async_trait::async_trait;
use url::Url;

/// Remote configuration transport
///
/// Each scope is fetched independently; implementations must tolerate the two
/// fetches running concurrently.
#[async_trait]
pub trait RemoteConfigurationNetworking: Send + Sync {
    /// Fetch the fragment for one scope
    async fn fetch(&self, scope: ConfigScope) -> Result<ConfigFragment, FetchError>;

    async fn fetch_global(&self) -> Result<ConfigFragment, FetchError> {
        self.fetch(ConfigScope::Global).await
    }

    async fn fetch_tenant(&self) -> Result<ConfigFragment, FetchError> {
        self.fetch(ConfigScope::Tenant).await
    }
}

/// Downloaded media, materialized somewhere the host can attach it from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub location: String,
    pub byte_len: u64,
}

/// Media download transport
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, media: &MediaDescriptor) -> Result<MediaAsset, FetchError>;
}

/// Chooses the deep link to surface for this application
pub trait DeeplinkResolver: Send + Sync {
    fn resolve(&self, payload: &NotificationPayload, bundle_identifier: &str) -> Option<Url>;
}

/// Delivery telemetry sink.
///
/// Callers treat emission as fire-and-forget: errors are logged, never
/// propagated past the reporting operation.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn emit(&self, record: DeliveryRecord) -> Result<(), TelemetryError>;
}

/// Default resolver: a bundle-specific dynamic link wins over the generic deep
/// link, and only absolute URLs are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadDeeplinkResolver;

impl DeeplinkResolver for PayloadDeeplinkResolver {
    fn resolve(&self, payload: &NotificationPayload, bundle_identifier: &str) -> Option<Url> {
        payload
            .dynamic_links
            .get(bundle_identifier)
            .or(payload.deep_link.as_ref())
            .and_then(|candidate| Url::parse(candidate).ok())
    }
}
