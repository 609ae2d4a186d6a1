//! # Event Publisher
//!
//! Broadcast bus shared by delivery telemetry and scheduler lifecycle events.
//! Publishing never blocks and never fails; subscribers that fall behind the
//! channel capacity observe `RecvError::Lagged`.
//!
//! ## Usage
//! ```rust
//! use push_extension_core::events::EventPublisher;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let publisher = EventPublisher::new(16);
//! let mut receiver = publisher.subscribe();
//!
//! publisher.publish("operation.started", json!({ "operation": "merge_configuration" }));
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.name, "operation.started");
//! # });
//! ```

use crate::client::TelemetrySink;
use crate::constants::events;
use crate::error::TelemetryError;
use crate::models::DeliveryRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

/// In-process event bus for delivery telemetry and operation lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// One event on the bus
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: DateTime<Utc>,
}

impl EventPublisher {
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity.max(1)).0,
        }
    }

    /// Fire-and-forget; an event nobody listens to is dropped.
    pub fn publish(&self, name: impl Into<String>, context: Value) {
        let delivered_to = self
            .sender
            .send(PublishedEvent {
                name: name.into(),
                context,
                published_at: Utc::now(),
            })
            .unwrap_or(0);
        trace!(subscribers = delivered_to, "Event published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::constants::defaults::TELEMETRY_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl TelemetrySink for EventPublisher {
    async fn emit(&self, record: DeliveryRecord) -> Result<(), TelemetryError> {
        let context =
            serde_json::to_value(&record).map_err(|e| TelemetryError::Rejected(e.to_string()))?;
        self.publish(events::NOTIFICATION_DELIVERED, context);
        Ok(())
    }
}
