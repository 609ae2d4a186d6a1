use crate::error::PayloadError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// The raw notification as handed over by the platform, before decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub identifier: String,
    pub title: String,
    pub body: String,
    /// Arbitrary push data; the notification payload is decoded from here
    #[serde(default)]
    pub user_info: Value,
}

impl NotificationRequest {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        user_info: Value,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            body: body.into(),
            user_info,
        }
    }
}

/// Decoded push payload. Immutable for the lifetime of a session and shared
/// read-only with every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub content: String,
    pub tenant_id: String,
    #[serde(default)]
    pub device_id: Option<String>,
    /// Generic deep link target
    #[serde(default)]
    pub deep_link: Option<String>,
    /// Per-application deep link overrides keyed by bundle identifier
    #[serde(default)]
    pub dynamic_links: HashMap<String, String>,
    #[serde(default)]
    pub media: Option<MediaDescriptor>,
    #[serde(default)]
    pub campaign: Option<CampaignDetails>,
}

impl NotificationPayload {
    /// Decode the payload from a request's `user_info`.
    pub fn from_user_info(user_info: &Value) -> Result<Self, PayloadError> {
        let payload: NotificationPayload = serde_json::from_value(user_info.clone())?;
        if payload.tenant_id.trim().is_empty() {
            return Err(PayloadError::MissingField("tenant_id"));
        }
        Ok(payload)
    }

    pub fn from_request(request: &NotificationRequest) -> Result<Self, PayloadError> {
        Self::from_user_info(&request.user_info)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub url: String,
    pub media_type: MediaType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    Gif,
}

impl MediaType {
    /// File extension used when the attachment is materialized
    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Image => "jpeg",
            Self::Video => "mp4",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Gif => write!(f, "gif"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignDetails {
    pub campaign_id: String,
    #[serde(default)]
    pub action_serial: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
}
