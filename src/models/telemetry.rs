use crate::constants::events;
use crate::models::configuration::ConfigScope;
use crate::models::payload::CampaignDetails;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery telemetry emitted once per handled notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub record_id: Uuid,
    pub event: String,
    pub tenant_id: String,
    pub device_id: Option<String>,
    pub campaign: Option<CampaignDetails>,
    pub bundle_identifier: String,
    /// Event collection endpoint from the merged configuration, if known
    pub endpoint: Option<String>,
    #[serde(default)]
    pub site_id: Option<String>,
    /// True when the merged configuration lacked one or more fragments
    pub degraded: bool,
    pub configuration_sources: Vec<ConfigScope>,
    pub delivered_at: DateTime<Utc>,
}

impl DeliveryRecord {
    pub fn delivered(tenant_id: impl Into<String>, bundle_identifier: impl Into<String>) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            event: events::NOTIFICATION_DELIVERED.to_string(),
            tenant_id: tenant_id.into(),
            device_id: None,
            campaign: None,
            bundle_identifier: bundle_identifier.into(),
            endpoint: None,
            site_id: None,
            degraded: true,
            configuration_sources: Vec::new(),
            delivered_at: Utc::now(),
        }
    }
}
