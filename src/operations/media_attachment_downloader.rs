use crate::client::MediaFetcher;
use crate::models::{DraftContent, MediaAttachment, NotificationPayload};
use crate::orchestration::Operation;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Downloads the payload's media, if any, and attaches it to the draft.
/// Owns the draft's attachment list. A failed download is logged and the
/// notification is delivered without the attachment.
pub struct MediaAttachmentDownloader {
    payload: Arc<NotificationPayload>,
    draft: Arc<DraftContent>,
    fetcher: Arc<dyn MediaFetcher>,
}

impl MediaAttachmentDownloader {
    pub fn new(
        payload: Arc<NotificationPayload>,
        draft: Arc<DraftContent>,
        fetcher: Arc<dyn MediaFetcher>,
    ) -> Self {
        Self {
            payload,
            draft,
            fetcher,
        }
    }
}

#[async_trait]
impl Operation for MediaAttachmentDownloader {
    async fn execute(&self) -> anyhow::Result<()> {
        let Some(media) = &self.payload.media else {
            debug!("Payload carries no media");
            return Ok(());
        };

        let asset = match self.fetcher.fetch(media).await {
            Ok(asset) => asset,
            Err(e) => {
                warn!(url = %media.url, media_type = %media.media_type, error = %e, "Media download failed, delivering without attachment");
                return Ok(());
            }
        };

        info!(
            url = %media.url,
            media_type = %media.media_type,
            bytes = asset.byte_len,
            "Media attachment downloaded"
        );
        self.draft.push_attachment(MediaAttachment {
            identifier: format!("attachment.{}", media.media_type.file_extension()),
            source_url: media.url.clone(),
            media_type: media.media_type,
            location: asset.location,
            byte_len: asset.byte_len,
        });
        Ok(())
    }
}
