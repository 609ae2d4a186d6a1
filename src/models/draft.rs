//! # Draft Content
//!
//! `DraftContent` is the accumulator operations write into while a session
//! runs; `DraftResult` is the value handed to the content handler.
//!
//! Each operation owns a distinct field, so every writer-owned field sits
//! behind its own lock and writers never contend with each other. The
//! completion gate reads the whole draft once through [`DraftContent::snapshot`].
//! When the deadline wins, a writer that is still in flight is simply missing
//! from the snapshot.

use crate::constants::user_info;
use crate::models::payload::{MediaType, NotificationPayload, NotificationRequest};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Content delivered to the consumer callback
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftResult {
    pub title: String,
    pub body: String,
    pub attachments: Vec<MediaAttachment>,
    pub deep_link: Option<DeeplinkMetadata>,
    pub user_info: Map<String, Value>,
}

impl DraftResult {
    /// The request's original content, untouched.
    pub fn from_request(request: &NotificationRequest) -> Self {
        Self {
            title: request.title.clone(),
            body: request.body.clone(),
            attachments: Vec::new(),
            deep_link: None,
            user_info: user_info_map(&request.user_info),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeeplinkMetadata {
    pub url: String,
    pub bundle_identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub identifier: String,
    pub source_url: String,
    pub media_type: MediaType,
    pub location: String,
    pub byte_len: u64,
}

/// Shared accumulator for a single session
#[derive(Debug)]
pub struct DraftContent {
    title: String,
    body: String,
    user_info: Map<String, Value>,
    deep_link: Mutex<Option<DeeplinkMetadata>>,
    attachments: Mutex<Vec<MediaAttachment>>,
}

impl DraftContent {
    /// Seed the draft from the request, replacing title and body with the
    /// payload's values.
    pub fn new(request: &NotificationRequest, payload: &NotificationPayload) -> Self {
        Self {
            title: payload.title.clone(),
            body: payload.content.clone(),
            user_info: user_info_map(&request.user_info),
            deep_link: Mutex::new(None),
            attachments: Mutex::new(Vec::new()),
        }
    }

    /// Written by the deeplink extractor only.
    pub fn set_deep_link(&self, metadata: DeeplinkMetadata) {
        *self.deep_link.lock() = Some(metadata);
    }

    /// Written by the media attachment downloader only.
    pub fn push_attachment(&self, attachment: MediaAttachment) {
        self.attachments.lock().push(attachment);
    }

    pub fn snapshot(&self) -> DraftResult {
        let deep_link = self.deep_link.lock().clone();
        let attachments = self.attachments.lock().clone();

        let mut user_info = self.user_info.clone();
        if let Some(link) = &deep_link {
            user_info.insert(
                user_info::DYNAMIC_LINK.to_string(),
                Value::String(link.url.clone()),
            );
        }

        DraftResult {
            title: self.title.clone(),
            body: self.body.clone(),
            attachments,
            deep_link,
            user_info,
        }
    }
}

fn user_info_map(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    }
}
