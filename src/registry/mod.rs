//! # Registry Infrastructure
//!
//! Registry of pluggable downstream components grouped by capability.
//!
//! ## Architecture
//!
//! ```text
//! ComponentsPool
//! ├── EventReporting    (Eventable: user id, events, screens, flush)
//! └── PushRegistration  (Pushable: token, registration, topics)
//! ```

pub mod components_pool;

pub use components_pool::{
    Capability, Component, ComponentsPool, Eventable, Pushable, ScreenVisit, TrackedEvent,
};
