//! In-memory configuration repository
//!
//! Entries are kept as serialized JSON in a sharded `DashMap`, so writers on
//! different keys never share a lock. Values are decoded on read, which keeps
//! the same corruption semantics a persistent store would have.

use super::{ConfigurationRepository, RepositoryKey, RepositoryResult};
use crate::error::RepositoryError;
use crate::models::{ConfigFragment, ConfigScope, MergedConfiguration};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigurationRepository {
    entries: Arc<DashMap<RepositoryKey, Value>>,
}

impl InMemoryConfigurationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value under a key, bypassing serialization. Lets tests
    /// simulate a corrupted entry.
    pub fn insert_raw(&self, key: RepositoryKey, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write<T: Serialize>(&self, key: RepositoryKey, value: &T) -> RepositoryResult<()> {
        let encoded = serde_json::to_value(value).map_err(|e| RepositoryError::WriteFailed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.entries.insert(key, encoded);
        debug!(key = %key, "Repository entry written");
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, key: RepositoryKey) -> RepositoryResult<Option<T>> {
        let Some(entry) = self.entries.get(&key) else {
            return Ok(None);
        };
        let raw = entry.value().clone();
        drop(entry);

        serde_json::from_value(raw)
            .map(Some)
            .map_err(|e| RepositoryError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ConfigurationRepository for InMemoryConfigurationRepository {
    async fn save_fragment(&self, fragment: &ConfigFragment) -> RepositoryResult<()> {
        self.write(RepositoryKey::Fragment(fragment.scope), fragment)
    }

    async fn read_fragments(&self) -> RepositoryResult<HashMap<ConfigScope, ConfigFragment>> {
        let mut fragments = HashMap::new();
        for scope in ConfigScope::ALL {
            if let Some(fragment) = self.read::<ConfigFragment>(RepositoryKey::Fragment(scope))? {
                fragments.insert(scope, fragment);
            }
        }
        Ok(fragments)
    }

    async fn save_merged(&self, merged: &MergedConfiguration) -> RepositoryResult<()> {
        self.write(RepositoryKey::Merged, merged)
    }

    async fn read_merged(&self) -> RepositoryResult<Option<MergedConfiguration>> {
        self.read(RepositoryKey::Merged)
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}
