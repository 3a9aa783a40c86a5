//! Engine configuration: global flags plus the ordered rule set.
//!
//! The configuration is persisted as one JSON document under [`CONFIG_KEY`].
//! Loading and importing both merge the document's top-level keys over
//! [`EngineConfig::default`], so a document missing a key keeps the default
//! for it.

mod rules;

use crate::error::ConfigError;
use crate::store::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use rules::{MockRule, ResponseType, RuleMethod};

/// Store key holding the serialized [`EngineConfig`].
pub const CONFIG_KEY: &str = "mock_config";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Master switch. When false no rule ever matches and every request
    /// passes through.
    pub enabled: bool,
    /// Rules in precedence order; the first match wins.
    pub rules: Vec<MockRule>,
    /// Announce served mocks on the diagnostic channel. No effect on matching.
    pub show_notification: bool,
    /// Gates appends to the request log.
    pub log_requests: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: Vec::new(),
            show_notification: true,
            log_requests: true,
        }
    }
}

/// Top-level keys of a stored document. Absent or `null` keys keep defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigOverlay {
    enabled: Option<bool>,
    rules: Option<Vec<MockRule>>,
    show_notification: Option<bool>,
    log_requests: Option<bool>,
}

impl EngineConfig {
    /// Parse a JSON document and merge its top-level keys over the defaults.
    pub fn from_json_merged(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(ConfigError::NotAnObject(json_kind(&value)));
        }
        let overlay: ConfigOverlay = serde_json::from_value(value)?;

        let defaults = EngineConfig::default();
        Ok(EngineConfig {
            enabled: overlay.enabled.unwrap_or(defaults.enabled),
            rules: overlay.rules.unwrap_or(defaults.rules),
            show_notification: overlay
                .show_notification
                .unwrap_or(defaults.show_notification),
            log_requests: overlay.log_requests.unwrap_or(defaults.log_requests),
        })
    }

    /// Load the configuration persisted in `store`.
    ///
    /// A corrupt document is reported and replaced by the defaults; loading
    /// never fails.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let raw = store.get(CONFIG_KEY, "{}");
        match Self::from_json_merged(&raw) {
            Ok(config) => {
                debug!(rules = config.rules.len(), "Loaded mock configuration");
                config
            }
            Err(e) => {
                warn!("Stored mock configuration is unreadable, using defaults: {}", e);
                EngineConfig::default()
            }
        }
    }

    /// Compact JSON, as written to the store.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Pretty-printed JSON (two-space indent), as written to export files.
    pub fn to_pretty_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn rule(&self, id: &str) -> Option<&MockRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn rule_mut(&mut self, id: &str) -> Option<&mut MockRule> {
        self.rules.iter_mut().find(|r| r.id == id)
    }

    pub fn rule_position(&self, id: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.id == id)
    }
}

/// File name offered for an export taken at `at`.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("mock-config-{}.json", at.timestamp_millis())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
