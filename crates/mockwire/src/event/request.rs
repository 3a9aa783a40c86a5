use super::{EventTransport, Exchange, RequestEvent};
use crate::error::EventError;
use bytes::Bytes;
use std::ops::Deref;
use std::sync::Arc;

/// Stateful request object driven by an [`EventTransport`].
///
/// Derefs to its [`Exchange`] for the read accessors (`status`,
/// `response_text`, `response_header` and so on).
pub struct EventRequest {
    transport: Arc<dyn EventTransport>,
    exchange: Exchange,
    opened: bool,
    sent: bool,
}

impl EventRequest {
    pub fn new(transport: Arc<dyn EventTransport>) -> Self {
        Self {
            transport,
            exchange: Exchange::new(),
            opened: false,
            sent: false,
        }
    }

    /// Register a listener. Listeners fire synchronously, in registration
    /// order, with the exchange as it stands after each transition.
    pub fn on_event<F>(&mut self, listener: F)
    where
        F: FnMut(RequestEvent, &Exchange) + Send + 'static,
    {
        self.exchange.add_listener(Box::new(listener));
    }

    /// Set the method and URL. Opening again starts a fresh request.
    pub fn open(&mut self, method: &str, url: &str) -> Result<(), EventError> {
        self.transport.open(&mut self.exchange, method, url)?;
        self.opened = true;
        self.sent = false;
        Ok(())
    }

    /// Send the request and wait until the transport has driven it to
    /// completion.
    pub async fn send(&mut self, body: Option<Bytes>) -> Result<(), EventError> {
        if !self.opened {
            return Err(EventError::NotOpened);
        }
        if self.sent {
            return Err(EventError::AlreadySent);
        }
        self.sent = true;
        self.transport.send(&mut self.exchange, body).await?;
        Ok(())
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }
}

impl Deref for EventRequest {
    type Target = Exchange;

    fn deref(&self) -> &Exchange {
        &self.exchange
    }
}
