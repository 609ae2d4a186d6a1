use crate::logging::log_error;
use crate::models::MergedConfiguration;
use crate::orchestration::Operation;
use crate::storage::ConfigurationRepository;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Combines whatever fragments the downloaders managed to store into the
/// merged configuration. Zero fragments is a valid, fully degraded input.
pub struct ConfigMerger {
    repository: Arc<dyn ConfigurationRepository>,
}

impl ConfigMerger {
    pub fn new(repository: Arc<dyn ConfigurationRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl Operation for ConfigMerger {
    async fn execute(&self) -> anyhow::Result<()> {
        let fragments = match self.repository.read_fragments().await {
            Ok(fragments) => fragments,
            Err(e) => {
                // An unreadable fragment is treated like a missing one
                log_error("config_merger", "read_fragments", &e.to_string(), None);
                Default::default()
            }
        };

        let merged = MergedConfiguration::merge(&fragments);
        if merged.is_degraded() {
            warn!(
                sources = ?merged.sources,
                "Merging configuration without every fragment"
            );
        }

        self.repository.save_merged(&merged).await?;
        info!(
            sources = ?merged.sources,
            degraded = merged.is_degraded(),
            "Merged configuration saved"
        );
        Ok(())
    }
}
