//! # Remote Configuration
//!
//! Configuration arrives as two scoped fragments (global and tenant) which are
//! deep merged into a single document.
//!
//! ## Deep Merge Semantics
//!
//! - **Objects**: Recursively merged, keys from both sides preserved
//! - **Scalars and arrays**: Overlay value replaces base value
//! - **Order**: Global first, tenant overlays it

use crate::constants::keys;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigScope {
    Global,
    Tenant,
}

impl ConfigScope {
    /// Every scope in merge order
    pub const ALL: [ConfigScope; 2] = [ConfigScope::Global, ConfigScope::Tenant];

    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Global => keys::GLOBAL_FRAGMENT,
            Self::Tenant => keys::TENANT_FRAGMENT,
        }
    }
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Tenant => write!(f, "tenant"),
        }
    }
}

/// One scope-specific piece of remote configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFragment {
    pub scope: ConfigScope,
    pub document: Value,
    pub fetched_at: DateTime<Utc>,
}

impl ConfigFragment {
    pub fn new(scope: ConfigScope, document: Value) -> Self {
        Self {
            scope,
            document,
            fetched_at: Utc::now(),
        }
    }
}

/// Configuration derived from whichever fragments were available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedConfiguration {
    pub settings: Value,
    pub sources: Vec<ConfigScope>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl Default for MergedConfiguration {
    fn default() -> Self {
        Self {
            settings: Value::Object(Map::new()),
            sources: Vec::new(),
            merged_at: None,
        }
    }
}

impl MergedConfiguration {
    /// Merge the available fragments. Missing scopes are skipped; with no
    /// fragments at all the result is the empty default stamped with the
    /// merge time.
    pub fn merge(fragments: &HashMap<ConfigScope, ConfigFragment>) -> Self {
        let mut settings = Value::Object(Map::new());
        let mut sources = Vec::new();

        for scope in ConfigScope::ALL {
            if let Some(fragment) = fragments.get(&scope) {
                deep_merge_json(&mut settings, fragment.document.clone());
                sources.push(scope);
            }
        }

        Self {
            settings,
            sources,
            merged_at: Some(Utc::now()),
        }
    }

    /// True when fewer than all expected fragments contributed.
    pub fn is_degraded(&self) -> bool {
        self.sources.len() < ConfigScope::ALL.len()
    }

    /// Look up a dotted path such as `events.endpoint`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.settings, |value, segment| value.get(segment))
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }
}

/// Deep merge two JSON values.
///
/// If both values are objects they are merged recursively, otherwise the
/// overlay replaces the base.
pub fn deep_merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => deep_merge_json(base_value, overlay_value),
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}
