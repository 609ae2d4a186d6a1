use crate::client::TelemetrySink;
use crate::constants::settings;
use crate::logging::log_error;
use crate::models::{DeliveryRecord, MergedConfiguration, NotificationPayload};
use crate::orchestration::Operation;
use crate::storage::ConfigurationRepository;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Emits exactly one delivery record per run, informed by the merged
/// configuration when one exists. Telemetry failures are logged only.
pub struct DeliveryReporter {
    repository: Arc<dyn ConfigurationRepository>,
    telemetry: Arc<dyn TelemetrySink>,
    payload: Arc<NotificationPayload>,
    bundle_identifier: String,
}

impl DeliveryReporter {
    pub fn new(
        repository: Arc<dyn ConfigurationRepository>,
        telemetry: Arc<dyn TelemetrySink>,
        payload: Arc<NotificationPayload>,
        bundle_identifier: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            telemetry,
            payload,
            bundle_identifier: bundle_identifier.into(),
        }
    }

    async fn merged_configuration(&self) -> MergedConfiguration {
        match self.repository.read_merged().await {
            Ok(Some(merged)) => merged,
            Ok(None) => {
                warn!("No merged configuration stored, reporting with defaults");
                MergedConfiguration::default()
            }
            Err(e) => {
                log_error("delivery_reporter", "read_merged", &e.to_string(), None);
                MergedConfiguration::default()
            }
        }
    }

    fn build_record(&self, merged: &MergedConfiguration) -> DeliveryRecord {
        let mut record =
            DeliveryRecord::delivered(self.payload.tenant_id.clone(), self.bundle_identifier.clone());
        record.device_id = self.payload.device_id.clone();
        record.campaign = self.payload.campaign.clone();
        record.endpoint = merged.get_str(settings::EVENT_ENDPOINT).map(str::to_string);
        record.site_id = merged.get_str(settings::SITE_ID).map(str::to_string);
        record.degraded = merged.is_degraded();
        record.configuration_sources = merged.sources.clone();
        record
    }
}

#[async_trait]
impl Operation for DeliveryReporter {
    async fn execute(&self) -> anyhow::Result<()> {
        let merged = self.merged_configuration().await;
        let record = self.build_record(&merged);
        let record_id = record.record_id;

        match self.telemetry.emit(record).await {
            Ok(()) => info!(
                record_id = %record_id,
                tenant_id = %self.payload.tenant_id,
                degraded = merged.is_degraded(),
                "Delivery reported"
            ),
            Err(e) => log_error(
                "delivery_reporter",
                "emit",
                &e.to_string(),
                Some(&record_id.to_string()),
            ),
        }
        Ok(())
    }
}
