//! Event-driven client contract.
//!
//! An [`EventRequest`] is opened, optionally given listeners, then sent. The
//! [`EventTransport`] behind it moves its [`Exchange`] through the
//! [`ReadyState`] lifecycle and fires [`RequestEvent`]s along the way.
//! [`EventInterceptor`] is a transport that replays that lifecycle from a mock
//! rule and defers to the original transport when no rule matches.

mod exchange;
mod interceptor;
mod request;

use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;

pub use exchange::{Exchange, Listener, ReadyState, RequestEvent};
pub use interceptor::EventInterceptor;
pub use request::EventRequest;

#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Prepare `exchange` for a request. Called once per `open()`.
    fn open(&self, exchange: &mut Exchange, method: &str, url: &str) -> Result<(), TransportError>;

    /// Drive `exchange` to `Done`, firing events as it goes.
    async fn send(
        &self,
        exchange: &mut Exchange,
        body: Option<Bytes>,
    ) -> Result<(), TransportError>;
}
