//! Mockwire: an interception-and-matching engine for outbound HTTP calls.
//!
//! Calls made through either client contract (the promise-style [`fetch`]
//! client or the event-driven [`event`] client) are checked against an ordered
//! rule set. A matching rule answers the call with a synthetic response; an
//! unmatched call is handed to the original transport untouched. Every call is
//! recorded in a bounded request log.
//!
//! # Example
//!
//! ```no_run
//! use mockwire::config::{EngineConfig, MockRule};
//! use mockwire::fetch::{FetchRequest, FetchTransport};
//! use mockwire::transport::ReqwestTransport;
//! use mockwire::MockEngine;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut config = EngineConfig::default();
//! config.rules.push(MockRule::new("/api/user").with_json(r#"{"id":1}"#));
//!
//! let engine = Arc::new(MockEngine::in_memory(config));
//! let fetch = engine.wrap_fetch(Arc::new(ReqwestTransport::new()?));
//!
//! let response = fetch.fetch(FetchRequest::new("/api/user/info")).await?;
//! assert_eq!(response.status(), 200);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod fetch;
pub mod matcher;
pub mod request_log;
pub mod response;
pub mod store;
pub mod transport;

pub use engine::MockEngine;
pub use error::{
    BodyError, ConfigError, EngineError, EventError, StoreError, SynthesisError, TransportError,
};
