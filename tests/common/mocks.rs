//! Collaborator mocks with configurable latency and failure.

use async_trait::async_trait;
use parking_lot::Mutex;
use push_extension_core::client::{
    MediaAsset, MediaFetcher, RemoteConfigurationNetworking, TelemetrySink,
};
use push_extension_core::error::{FetchError, TelemetryError};
use push_extension_core::models::{
    ConfigFragment, ConfigScope, DeliveryRecord, DraftResult, MediaDescriptor, NotificationRequest,
};
use push_extension_core::orchestration::{Collaborators, ContentHandler};
use push_extension_core::storage::InMemoryConfigurationRepository;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How a mocked fetch behaves
#[derive(Debug, Clone)]
pub struct FetchBehavior {
    pub latency: Duration,
    pub document: Option<Value>,
}

impl FetchBehavior {
    pub fn succeed(document: Value) -> Self {
        Self {
            latency: Duration::ZERO,
            document: Some(document),
        }
    }

    pub fn fail() -> Self {
        Self {
            latency: Duration::ZERO,
            document: None,
        }
    }

    pub fn after(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[derive(Debug)]
pub struct MockNetworking {
    behaviors: HashMap<ConfigScope, FetchBehavior>,
    pub calls: AtomicUsize,
}

impl MockNetworking {
    pub fn new(global: FetchBehavior, tenant: FetchBehavior) -> Arc<Self> {
        Arc::new(Self {
            behaviors: HashMap::from([(ConfigScope::Global, global), (ConfigScope::Tenant, tenant)]),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn healthy() -> Arc<Self> {
        Self::new(
            FetchBehavior::succeed(json!({
                "events": { "endpoint": "https://global.example.com/events", "batch_size": 20 }
            })),
            FetchBehavior::succeed(json!({
                "events": { "endpoint": "https://tenant.example.com/events", "site_id": "site-1001" }
            })),
        )
    }

    pub fn unreachable() -> Arc<Self> {
        Self::new(FetchBehavior::fail(), FetchBehavior::fail())
    }
}

#[async_trait]
impl RemoteConfigurationNetworking for MockNetworking {
    async fn fetch(&self, scope: ConfigScope) -> Result<ConfigFragment, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behaviors.get(&scope).cloned().unwrap_or_else(FetchBehavior::fail);
        tokio::time::sleep(behavior.latency).await;

        match behavior.document {
            Some(document) => Ok(ConfigFragment::new(scope, document)),
            None => Err(FetchError::Configuration {
                scope,
                reason: "host unreachable".to_string(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct MockMediaFetcher {
    latency: Duration,
    fail: bool,
}

impl MockMediaFetcher {
    pub fn instant() -> Arc<Self> {
        Arc::new(Self {
            latency: Duration::ZERO,
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            latency: Duration::ZERO,
            fail: true,
        })
    }
}

#[async_trait]
impl MediaFetcher for MockMediaFetcher {
    async fn fetch(&self, media: &MediaDescriptor) -> Result<MediaAsset, FetchError> {
        tokio::time::sleep(self.latency).await;
        if self.fail {
            return Err(FetchError::Media {
                url: media.url.clone(),
                reason: "403 forbidden".to_string(),
            });
        }
        Ok(MediaAsset {
            location: format!("/tmp/attachment.{}", media.media_type.file_extension()),
            byte_len: 4096,
        })
    }
}

#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    records: Mutex<Vec<DeliveryRecord>>,
}

impl RecordingTelemetry {
    pub fn records(&self) -> Vec<DeliveryRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl TelemetrySink for RecordingTelemetry {
    async fn emit(&self, record: DeliveryRecord) -> Result<(), TelemetryError> {
        self.records.lock().push(record);
        Ok(())
    }
}

/// Everything a scenario needs to inspect after running
pub struct Harness {
    pub collaborators: Collaborators,
    pub repository: Arc<InMemoryConfigurationRepository>,
    pub telemetry: Arc<RecordingTelemetry>,
}

impl Harness {
    pub fn new(networking: Arc<MockNetworking>, media: Arc<MockMediaFetcher>) -> Self {
        let repository = Arc::new(InMemoryConfigurationRepository::new());
        let telemetry = Arc::new(RecordingTelemetry::default());
        let collaborators = Collaborators::new(networking, media)
            .with_repository(repository.clone())
            .with_telemetry(telemetry.clone());

        Self {
            collaborators,
            repository,
            telemetry,
        }
    }
}

/// Content handler that counts invocations and keeps every delivered result
#[derive(Clone, Default)]
pub struct CapturingHandler {
    pub invocations: Arc<AtomicUsize>,
    pub results: Arc<Mutex<Vec<DraftResult>>>,
}

impl CapturingHandler {
    pub fn handler(&self) -> ContentHandler {
        let invocations = self.invocations.clone();
        let results = self.results.clone();
        Box::new(move |result| {
            invocations.fetch_add(1, Ordering::SeqCst);
            results.lock().push(result);
        })
    }

    pub fn count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Option<DraftResult> {
        self.results.lock().last().cloned()
    }
}

pub const BUNDLE_ID: &str = "com.example.shop";

/// A request carrying a deep link for [`BUNDLE_ID`] and an image
pub fn rich_request() -> NotificationRequest {
    NotificationRequest::new(
        "notification-1",
        "placeholder title",
        "placeholder body",
        json!({
            "title": "Flash sale",
            "content": "Everything 20% off today",
            "tenant_id": "1001",
            "device_id": "device-42",
            "deep_link": "https://shop.example.com/sale",
            "dynamic_links": { "com.example.shop": "shop://sale" },
            "media": { "url": "https://cdn.example.com/sale.jpg", "media_type": "image" },
            "campaign": { "campaign_id": "c-7", "action_serial": "3", "template_id": "t-1" }
        }),
    )
}
