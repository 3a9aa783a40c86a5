//! The process-scoped engine context.
//!
//! A [`MockEngine`] owns the configuration, the compiled matcher, the request
//! log and the store the configuration persists to. It is built once at
//! startup and shared (`Arc`) by both interceptors and whatever edits rules.
//! Every mutation recompiles the matcher and persists explicitly; there is no
//! autosave.

use crate::config::{EngineConfig, MockRule, CONFIG_KEY};
use crate::error::EngineError;
use crate::event::{EventInterceptor, EventTransport};
use crate::fetch::{FetchInterceptor, FetchTransport};
use crate::matcher::RuleMatcher;
use crate::request_log::{RequestLog, RequestLogEntry};
use crate::store::{InMemoryStore, KeyValueStore};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct EngineState {
    config: EngineConfig,
    matcher: RuleMatcher,
}

impl EngineState {
    fn new(config: EngineConfig) -> Self {
        let matcher = RuleMatcher::compile(&config);
        Self { config, matcher }
    }
}

pub struct MockEngine {
    state: RwLock<EngineState>,
    log: RequestLog,
    store: Arc<dyn KeyValueStore>,
    /// Feeds rule ids; never rewinds, so ids are not reused within a process.
    rule_seq: AtomicU64,
}

impl MockEngine {
    /// Load the persisted configuration from `store`, merged over defaults.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let config = EngineConfig::load(store.as_ref());
        info!(
            rules = config.rules.len(),
            enabled = config.enabled,
            "Mock engine loaded"
        );
        Self::with_config(config, store)
    }

    /// Start from `config` without reading `store`; later mutations still
    /// persist to it.
    pub fn with_config(config: EngineConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            state: RwLock::new(EngineState::new(config)),
            log: RequestLog::new(),
            store,
            rule_seq: AtomicU64::new(0),
        }
    }

    /// Engine backed by an [`InMemoryStore`].
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::with_config(config, Arc::new(InMemoryStore::new()))
    }

    // ===== Interception boundary =====

    /// Wrap the original promise-style transport.
    pub fn wrap_fetch(self: &Arc<Self>, original: Arc<dyn FetchTransport>) -> FetchInterceptor {
        FetchInterceptor::new(Arc::clone(self), original)
    }

    /// Wrap the original event-driven transport.
    pub fn wrap_events(self: &Arc<Self>, original: Arc<dyn EventTransport>) -> EventInterceptor {
        EventInterceptor::new(Arc::clone(self), original)
    }

    // ===== Matching and logging =====

    /// Rule that would answer `method url`, if any. No log entry is written.
    pub fn match_request(&self, url: &str, method: &str) -> Option<MockRule> {
        self.state.read().matcher.find(url, method).cloned()
    }

    /// Match and record in one step, as the interceptors do for every call.
    pub(crate) fn resolve(&self, url: &str, method: &str) -> Option<MockRule> {
        let rule = self.match_request(url, method);
        match &rule {
            Some(rule) => {
                debug!(url, method, rule_id = %rule.id, "Request matched mock rule");
            }
            None => debug!(url, method, "No mock rule matched, passing through"),
        }
        self.record(url, method, rule.as_ref());
        rule
    }

    /// Append a log entry for a request. No-op while `logRequests` is off.
    pub fn record(&self, url: &str, method: &str, rule: Option<&MockRule>) {
        if !self.state.read().config.log_requests {
            return;
        }
        let entry = match rule {
            Some(rule) => RequestLogEntry::matched(url, method, rule.id.clone()),
            None => RequestLogEntry::unmatched(url, method),
        };
        self.log.push(entry);
    }

    /// Diagnostic announcement of a served mock, louder when
    /// `showNotification` is on.
    pub(crate) fn announce(&self, rule: &MockRule, url: &str) {
        if self.state.read().config.show_notification {
            info!(
                rule_id = %rule.id,
                status = rule.status_code,
                "Mocked {} with rule '{}'",
                url,
                rule.label()
            );
        } else {
            debug!(
                rule_id = %rule.id,
                status = rule.status_code,
                "Mocked {} with rule '{}'",
                url,
                rule.label()
            );
        }
    }

    /// Log entries, most recent first.
    pub fn request_log(&self) -> Vec<RequestLogEntry> {
        self.log.snapshot()
    }

    pub fn clear_log(&self) {
        self.log.clear();
        debug!("Request log cleared");
    }

    // ===== Configuration =====

    /// Snapshot of the current configuration.
    pub fn config(&self) -> EngineConfig {
        self.state.read().config.clone()
    }

    /// Apply `f` to a copy of the configuration; on success the copy is
    /// persisted, then replaces the live configuration and the matcher is
    /// recompiled. On error nothing changes.
    pub fn update_config<R>(
        &self,
        f: impl FnOnce(&mut EngineConfig) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let mut state = self.state.write();
        let mut next = state.config.clone();
        let result = f(&mut next)?;
        let json = next.to_json()?;
        // Still under the write lock: the store sees writes in mutation order.
        self.store.set(CONFIG_KEY, &json)?;
        *state = EngineState::new(next);
        Ok(result)
    }

    /// Replace the whole configuration.
    pub fn replace_config(&self, config: EngineConfig) -> Result<(), EngineError> {
        self.update_config(|current| {
            *current = config;
            Ok(())
        })
    }

    /// Persist the current configuration.
    pub fn save(&self) -> Result<(), EngineError> {
        let state = self.state.read();
        let json = state.config.to_json()?;
        self.store.set(CONFIG_KEY, &json)?;
        info!(rules = state.config.rules.len(), "Mock configuration saved");
        Ok(())
    }

    /// Pretty-printed configuration for an export file.
    pub fn export_config(&self) -> Result<String, EngineError> {
        Ok(self.state.read().config.to_pretty_json()?)
    }

    /// Replace the configuration with an imported document merged over the
    /// defaults. An unreadable document installs the defaults; only a
    /// persistence failure is returned.
    pub fn import_config(&self, json: &str) -> Result<(), EngineError> {
        let imported = match EngineConfig::from_json_merged(json) {
            Ok(config) => config,
            Err(e) => {
                warn!("Imported configuration is unreadable, using defaults: {}", e);
                EngineConfig::default()
            }
        };
        let count = imported.rules.len();
        self.replace_config(imported)?;
        info!(rules = count, "Imported mock configuration");
        Ok(())
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), EngineError> {
        self.update_config(|c| {
            c.enabled = enabled;
            Ok(())
        })
    }

    pub fn set_show_notification(&self, show: bool) -> Result<(), EngineError> {
        self.update_config(|c| {
            c.show_notification = show;
            Ok(())
        })
    }

    pub fn set_log_requests(&self, log_requests: bool) -> Result<(), EngineError> {
        self.update_config(|c| {
            c.log_requests = log_requests;
            Ok(())
        })
    }

    // ===== Rule editing =====

    /// Append `rule` under a freshly assigned id, which is returned.
    /// Any id already on `rule` is replaced.
    pub fn add_rule(&self, mut rule: MockRule) -> Result<String, EngineError> {
        self.update_config(|c| {
            let id = self.next_rule_id(c);
            rule.id = id.clone();
            c.rules.push(rule);
            Ok(id)
        })
    }

    /// Replace the rule with the same id, keeping its position.
    pub fn update_rule(&self, rule: MockRule) -> Result<(), EngineError> {
        self.update_config(|c| {
            let slot = c
                .rule_mut(&rule.id)
                .ok_or_else(|| EngineError::RuleNotFound(rule.id.clone()))?;
            *slot = rule;
            Ok(())
        })
    }

    pub fn remove_rule(&self, id: &str) -> Result<MockRule, EngineError> {
        self.update_config(|c| {
            let index = c
                .rule_position(id)
                .ok_or_else(|| EngineError::RuleNotFound(id.to_string()))?;
            Ok(c.rules.remove(index))
        })
    }

    pub fn set_rule_enabled(&self, id: &str, enabled: bool) -> Result<(), EngineError> {
        self.update_config(|c| {
            let rule = c
                .rule_mut(id)
                .ok_or_else(|| EngineError::RuleNotFound(id.to_string()))?;
            rule.enabled = enabled;
            Ok(())
        })
    }

    /// Move a rule to `index` (clamped to the end). Position is precedence.
    pub fn move_rule(&self, id: &str, index: usize) -> Result<(), EngineError> {
        self.update_config(|c| {
            let from = c
                .rule_position(id)
                .ok_or_else(|| EngineError::RuleNotFound(id.to_string()))?;
            let rule = c.rules.remove(from);
            let to = index.min(c.rules.len());
            c.rules.insert(to, rule);
            Ok(())
        })
    }

    fn next_rule_id(&self, config: &EngineConfig) -> String {
        loop {
            let seq = self.rule_seq.fetch_add(1, Ordering::Relaxed);
            let id = format!("rule_{}_{}", chrono::Utc::now().timestamp_millis(), seq);
            if config.rule(&id).is_none() {
                return id;
            }
        }
    }
}
