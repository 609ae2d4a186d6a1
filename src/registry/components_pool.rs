//! # Components Pool
//!
//! Capability-tagged registry of pluggable components with fan-out calls.
//!
//! ## Overview
//!
//! Components opt into one or both capabilities:
//!
//! - **Event reporting** ([`Eventable`]): user identity, tracked events,
//!   screen visits, flushing
//! - **Push registration** ([`Pushable`]): device token, registration,
//!   topic subscriptions
//!
//! Registration happens during setup through `&mut self`; afterwards the pool
//! is shared behind an `Arc` and only broadcast from. Every broadcast visits
//! components in registration order.
//!
//! Fallible broadcasts ([`ComponentsPool::broadcast_report`] and
//! [`ComponentsPool::broadcast_screen_event`]) are fail-fast: the first
//! component error stops the fan-out and is returned to the caller. An empty
//! capability is not an error; it is logged as a degraded service and the
//! call does nothing.
//!
//! ## Usage
//!
//! ```rust
//! use push_extension_core::registry::{ComponentsPool, TrackedEvent};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = Arc::new(ComponentsPool::new());
//! // Nothing registered: logged, not failed
//! let invoked = pool.broadcast_report(&TrackedEvent::new("purchase")).await?;
//! assert_eq!(invoked, 0);
//! # Ok(())
//! # }
//! ```

use crate::error::{BroadcastError, ComponentError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Identity shared by every pluggable component
pub trait Component: Send + Sync {
    fn component_name(&self) -> &str;
}

/// Event reporting capability
#[async_trait]
pub trait Eventable: Component {
    async fn set_user_id(&self, user_id: Option<&str>);

    async fn report(&self, event: &TrackedEvent) -> Result<(), ComponentError>;

    async fn report_screen_event(&self, visit: &ScreenVisit) -> Result<(), ComponentError>;

    /// Flush anything buffered
    async fn dispatch_now(&self);
}

/// Push registration capability
#[async_trait]
pub trait Pushable: Component {
    async fn did_register_device_token(&self, token: &[u8]);

    async fn perform_registration(&self);

    async fn subscribe_to_topic(&self, topic: &str);

    async fn unsubscribe_from_topic(&self, topic: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    EventReporting,
    PushRegistration,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventReporting => write!(f, "event_reporting"),
            Self::PushRegistration => write!(f, "push_registration"),
        }
    }
}

/// A named analytics event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEvent {
    pub name: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    pub occurred_at: DateTime<Utc>,
}

impl TrackedEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Map::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenVisit {
    pub screen_name: String,
    #[serde(default)]
    pub previous_screen: Option<String>,
    pub visited_at: DateTime<Utc>,
}

impl ScreenVisit {
    pub fn new(screen_name: impl Into<String>) -> Self {
        Self {
            screen_name: screen_name.into(),
            previous_screen: None,
            visited_at: Utc::now(),
        }
    }
}

#[derive(Default)]
pub struct ComponentsPool {
    eventable: Vec<Arc<dyn Eventable>>,
    pushable: Vec<Arc<dyn Pushable>>,
}

impl fmt::Debug for ComponentsPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentsPool")
            .field("eventable", &self.component_names(Capability::EventReporting))
            .field("pushable", &self.component_names(Capability::PushRegistration))
            .finish()
    }
}

impl ComponentsPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_eventable(&mut self, component: Arc<dyn Eventable>) -> &mut Self {
        info!(component = component.component_name(), capability = %Capability::EventReporting, "Registered component");
        self.eventable.push(component);
        self
    }

    pub fn register_pushable(&mut self, component: Arc<dyn Pushable>) -> &mut Self {
        info!(component = component.component_name(), capability = %Capability::PushRegistration, "Registered component");
        self.pushable.push(component);
        self
    }

    /// Register a component under each listed capability.
    ///
    /// Only components implementing both [`Eventable`] and [`Pushable`] are
    /// accepted here, so one instance can be listed under either capability
    /// or both. A component with a single capability goes through
    /// [`register_eventable`](Self::register_eventable) or
    /// [`register_pushable`](Self::register_pushable).
    pub fn register<C>(&mut self, component: Arc<C>, capabilities: &[Capability]) -> &mut Self
    where
        C: Eventable + Pushable + 'static,
    {
        for capability in capabilities {
            match capability {
                Capability::EventReporting => {
                    self.register_eventable(component.clone());
                }
                Capability::PushRegistration => {
                    self.register_pushable(component.clone());
                }
            }
        }
        self
    }

    pub fn component_count(&self, capability: Capability) -> usize {
        match capability {
            Capability::EventReporting => self.eventable.len(),
            Capability::PushRegistration => self.pushable.len(),
        }
    }

    /// True when at least one component provides the capability
    pub fn is_running(&self, capability: Capability) -> bool {
        self.component_count(capability) > 0
    }

    pub fn component_names(&self, capability: Capability) -> Vec<&str> {
        match capability {
            Capability::EventReporting => {
                self.eventable.iter().map(|c| c.component_name()).collect()
            }
            Capability::PushRegistration => {
                self.pushable.iter().map(|c| c.component_name()).collect()
            }
        }
    }

    fn ensure_running(&self, capability: Capability, call: &str) -> bool {
        if self.is_running(capability) {
            return true;
        }
        error!(
            capability = %capability,
            call = call,
            "Capability requested but no component is running"
        );
        false
    }

    /// Report an event to every event component, stopping at the first failure.
    /// Returns how many components were invoked.
    pub async fn broadcast_report(&self, event: &TrackedEvent) -> Result<usize, BroadcastError> {
        if !self.ensure_running(Capability::EventReporting, "report") {
            return Ok(0);
        }
        for component in &self.eventable {
            component
                .report(event)
                .await
                .map_err(|e| component_failed(component.component_name(), "report", e))?;
        }
        debug!(event = %event.name, components = self.eventable.len(), "Event reported");
        Ok(self.eventable.len())
    }

    /// Report a screen visit to every event component, stopping at the first
    /// failure.
    pub async fn broadcast_screen_event(&self, visit: &ScreenVisit) -> Result<usize, BroadcastError> {
        if !self.ensure_running(Capability::EventReporting, "report_screen_event") {
            return Ok(0);
        }
        for component in &self.eventable {
            component
                .report_screen_event(visit)
                .await
                .map_err(|e| {
                    component_failed(component.component_name(), "report_screen_event", e)
                })?;
        }
        Ok(self.eventable.len())
    }
}

fn component_failed(component: &str, call: &str, error: ComponentError) -> BroadcastError {
    error!(component = component, call = call, error = %error, "Component failed, aborting broadcast");
    BroadcastError::ComponentFailed {
        component: component.to_string(),
        call: call.to_string(),
        reason: error.reason,
    }
}

impl Component for ComponentsPool {
    fn component_name(&self) -> &str {
        "components_pool"
    }
}

#[async_trait]
impl Eventable for ComponentsPool {
    async fn set_user_id(&self, user_id: Option<&str>) {
        if !self.ensure_running(Capability::EventReporting, "set_user_id") {
            return;
        }
        for component in &self.eventable {
            component.set_user_id(user_id).await;
        }
    }

    async fn report(&self, event: &TrackedEvent) -> Result<(), ComponentError> {
        self.broadcast_report(event)
            .await
            .map(|_| ())
            .map_err(|e| ComponentError::new(e.to_string()))
    }

    async fn report_screen_event(&self, visit: &ScreenVisit) -> Result<(), ComponentError> {
        self.broadcast_screen_event(visit)
            .await
            .map(|_| ())
            .map_err(|e| ComponentError::new(e.to_string()))
    }

    async fn dispatch_now(&self) {
        if !self.ensure_running(Capability::EventReporting, "dispatch_now") {
            return;
        }
        for component in &self.eventable {
            component.dispatch_now().await;
        }
    }
}

#[async_trait]
impl Pushable for ComponentsPool {
    async fn did_register_device_token(&self, token: &[u8]) {
        if !self.ensure_running(Capability::PushRegistration, "did_register_device_token") {
            return;
        }
        for component in &self.pushable {
            component.did_register_device_token(token).await;
        }
    }

    async fn perform_registration(&self) {
        if !self.ensure_running(Capability::PushRegistration, "perform_registration") {
            return;
        }
        for component in &self.pushable {
            component.perform_registration().await;
        }
    }

    async fn subscribe_to_topic(&self, topic: &str) {
        if !self.ensure_running(Capability::PushRegistration, "subscribe_to_topic") {
            return;
        }
        for component in &self.pushable {
            component.subscribe_to_topic(topic).await;
        }
    }

    async fn unsubscribe_from_topic(&self, topic: &str) {
        if !self.ensure_running(Capability::PushRegistration, "unsubscribe_from_topic") {
            return;
        }
        for component in &self.pushable {
            component.unsubscribe_from_topic(topic).await;
        }
    }
}
