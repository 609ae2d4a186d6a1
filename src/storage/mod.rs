//! # Configuration Repository
//!
//! Key-value storage for configuration fragments and the merged result.
//! Every scope owns its own key, so the two downloaders never contend; the
//! merged key is written only by the merger after both downloaders settle.

pub mod in_memory;

use crate::error::RepositoryError;
use crate::models::{ConfigFragment, ConfigScope, MergedConfiguration};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

pub use in_memory::InMemoryConfigurationRepository;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage key for a repository entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryKey {
    Fragment(ConfigScope),
    Merged,
}

impl RepositoryKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fragment(scope) => scope.storage_key(),
            Self::Merged => crate::constants::keys::MERGED,
        }
    }
}

impl fmt::Display for RepositoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage contract consumed by the configuration operations.
///
/// Implementations must be safe under concurrent calls with distinct keys.
#[async_trait]
pub trait ConfigurationRepository: Send + Sync {
    /// Write one fragment under its scope key, replacing any previous value
    async fn save_fragment(&self, fragment: &ConfigFragment) -> RepositoryResult<()>;

    /// Every fragment currently stored, keyed by scope
    async fn read_fragments(&self) -> RepositoryResult<HashMap<ConfigScope, ConfigFragment>>;

    async fn save_merged(&self, merged: &MergedConfiguration) -> RepositoryResult<()>;

    /// `Ok(None)` when nothing has been merged yet
    async fn read_merged(&self) -> RepositoryResult<Option<MergedConfiguration>>;

    /// Name of the backing store for diagnostics
    fn provider_name(&self) -> &'static str;
}
