//! # Data Model
//!
//! Values flowing through a notification session: the decoded payload, the
//! draft content accumulated by operations, configuration fragments and the
//! telemetry record emitted on delivery.

pub mod configuration;
pub mod draft;
pub mod payload;
pub mod telemetry;

pub use configuration::{deep_merge_json, ConfigFragment, ConfigScope, MergedConfiguration};
pub use draft::{DeeplinkMetadata, DraftContent, DraftResult, MediaAttachment};
pub use payload::{
    CampaignDetails, MediaDescriptor, MediaType, NotificationPayload, NotificationRequest,
};
pub use telemetry::DeliveryRecord;
