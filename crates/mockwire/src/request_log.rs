//! Bounded audit log of every request the interceptors observed.

use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Most entries the log keeps; older ones are dropped.
pub const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogEntry {
    /// Timestamp plus a random suffix. Unlikely to collide, not guaranteed.
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub url: String,
    pub method: String,
    pub matched: bool,
    /// Present iff `matched`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

impl RequestLogEntry {
    pub fn matched(
        url: impl Into<String>,
        method: impl Into<String>,
        rule_id: impl Into<String>,
    ) -> Self {
        Self::new(url.into(), method.into(), Some(rule_id.into()))
    }

    pub fn unmatched(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self::new(url.into(), method.into(), None)
    }

    fn new(url: String, method: String, rule_id: Option<String>) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis();
        Self {
            id: entry_id(timestamp),
            timestamp,
            url,
            method,
            matched: rule_id.is_some(),
            rule_id,
        }
    }
}

fn entry_id(timestamp: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{timestamp}-{suffix}")
}

/// Most-recent-first ring of [`RequestLogEntry`]s.
#[derive(Debug)]
pub struct RequestLog {
    entries: Mutex<VecDeque<RequestLogEntry>>,
    capacity: usize,
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestLog {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Prepend `entry`, then drop whatever falls beyond the capacity.
    pub fn push(&self, entry: RequestLogEntry) {
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Current entries, most recent first.
    pub fn snapshot(&self) -> Vec<RequestLogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
