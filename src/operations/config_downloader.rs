use crate::client::RemoteConfigurationNetworking;
use crate::models::ConfigScope;
use crate::orchestration::Operation;
use crate::storage::ConfigurationRepository;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fetches one configuration fragment and persists it under its scope's key.
///
/// A failed fetch is logged and swallowed: no fragment is written and the
/// node still succeeds, leaving the merger to work with whatever arrived.
/// A repository write failure is reported as the node's failure.
pub struct ConfigDownloader {
    scope: ConfigScope,
    networking: Arc<dyn RemoteConfigurationNetworking>,
    repository: Arc<dyn ConfigurationRepository>,
}

impl ConfigDownloader {
    pub fn new(
        scope: ConfigScope,
        networking: Arc<dyn RemoteConfigurationNetworking>,
        repository: Arc<dyn ConfigurationRepository>,
    ) -> Self {
        Self {
            scope,
            networking,
            repository,
        }
    }

    pub fn global(
        networking: Arc<dyn RemoteConfigurationNetworking>,
        repository: Arc<dyn ConfigurationRepository>,
    ) -> Self {
        Self::new(ConfigScope::Global, networking, repository)
    }

    pub fn tenant(
        networking: Arc<dyn RemoteConfigurationNetworking>,
        repository: Arc<dyn ConfigurationRepository>,
    ) -> Self {
        Self::new(ConfigScope::Tenant, networking, repository)
    }

    pub fn scope(&self) -> ConfigScope {
        self.scope
    }
}

#[async_trait]
impl Operation for ConfigDownloader {
    async fn execute(&self) -> anyhow::Result<()> {
        debug!(scope = %self.scope, "Fetching configuration fragment");

        let fragment = match self.scope {
            ConfigScope::Global => self.networking.fetch_global().await,
            ConfigScope::Tenant => self.networking.fetch_tenant().await,
        };

        let fragment = match fragment {
            Ok(fragment) => fragment,
            Err(e) => {
                warn!(scope = %self.scope, error = %e, "Configuration fetch failed, continuing without fragment");
                return Ok(());
            }
        };

        self.repository.save_fragment(&fragment).await?;
        info!(
            scope = %self.scope,
            provider = self.repository.provider_name(),
            "Configuration fragment saved"
        );
        Ok(())
    }
}
