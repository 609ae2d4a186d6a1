use crate::client::DeeplinkResolver;
use crate::models::{DeeplinkMetadata, DraftContent, NotificationPayload};
use crate::orchestration::Operation;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Resolves the deep link for this application and writes it into the draft.
/// Owns the draft's deep link field.
pub struct DeeplinkExtractor {
    payload: Arc<NotificationPayload>,
    draft: Arc<DraftContent>,
    resolver: Arc<dyn DeeplinkResolver>,
    bundle_identifier: String,
}

impl DeeplinkExtractor {
    pub fn new(
        payload: Arc<NotificationPayload>,
        draft: Arc<DraftContent>,
        resolver: Arc<dyn DeeplinkResolver>,
        bundle_identifier: impl Into<String>,
    ) -> Self {
        Self {
            payload,
            draft,
            resolver,
            bundle_identifier: bundle_identifier.into(),
        }
    }
}

#[async_trait]
impl Operation for DeeplinkExtractor {
    async fn execute(&self) -> anyhow::Result<()> {
        let Some(url) = self.resolver.resolve(&self.payload, &self.bundle_identifier) else {
            debug!(bundle = %self.bundle_identifier, "No deep link for this application");
            return Ok(());
        };

        debug!(bundle = %self.bundle_identifier, url = %url, "Deep link extracted");
        self.draft.set_deep_link(DeeplinkMetadata {
            url: url.to_string(),
            bundle_identifier: self.bundle_identifier.clone(),
        });
        Ok(())
    }
}
