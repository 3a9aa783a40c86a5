//! Error types for the engine, its stores and both client contracts.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or write an `EngineConfig` document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Configuration must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Failure of a key/value store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access store file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Store file {path:?} is not a JSON object of strings: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize store contents: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors surfaced by [`MockEngine`](crate::MockEngine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Rule not found: {0}")]
    RuleNotFound(String),
}

/// A rule promised a JSON body but its `responseData` does not parse.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Rule '{rule_id}' declares a JSON response but its data is not valid JSON: {source}")]
    InvalidJson {
        rule_id: String,
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reading a response body as JSON failed.
///
/// The raw body is carried along so callers can still show what was received.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Response body is not valid JSON: {message}")]
pub struct BodyError {
    pub message: String,
    pub raw: String,
}

/// Error produced by an original (non-intercepted) transport.
///
/// The engine never inspects or rewrites it; unmatched calls get it back
/// exactly as the transport produced it.
#[derive(Debug)]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }

    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.0
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Misuse of an [`EventRequest`](crate::event::EventRequest) or a failure of
/// its transport.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("open() must be called before send()")]
    NotOpened,
    #[error("send() has already been called on this request")]
    AlreadySent,
    #[error(transparent)]
    Transport(#[from] TransportError),
}
