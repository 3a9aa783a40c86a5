use crate::error::BodyError;
use crate::response::SynthesizedBody;
use hyper::header::CONTENT_TYPE;
use hyper::HeaderMap;
use serde_json::Value;
use std::fmt;

/// Lifecycle state of an event-driven request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum ReadyState {
    #[default]
    Unsent = 0,
    Opened = 1,
    HeadersReceived = 2,
    Loading = 3,
    Done = 4,
}

impl ReadyState {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Notification fired at a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEvent {
    ReadyStateChange(ReadyState),
    Load,
    /// The transport failed before a response arrived.
    Error,
    LoadEnd,
}

pub type Listener = Box<dyn FnMut(RequestEvent, &Exchange) + Send>;

/// Per-request state shared between the caller and whichever transport
/// drives it.
///
/// Transports advance the state with [`set_ready_state`](Self::set_ready_state)
/// and install the response with [`set_response_head`](Self::set_response_head)
/// and [`set_response_body`](Self::set_response_body). Listeners observe every
/// transition in order.
#[derive(Default)]
pub struct Exchange {
    method: Option<String>,
    url: Option<String>,
    ready_state: ReadyState,
    status: u16,
    status_text: String,
    headers: HeaderMap,
    body: Option<SynthesizedBody>,
    intercepted: bool,
    listeners: Vec<Listener>,
}

impl Exchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the request line and forget any previous response.
    pub fn capture(&mut self, method: &str, url: &str) {
        self.method = Some(method.to_string());
        self.url = Some(url.to_string());
        self.status = 0;
        self.status_text.clear();
        self.headers.clear();
        self.body = None;
        self.intercepted = false;
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Captured `(method, url)`, once opened.
    pub fn request_line(&self) -> Option<(&str, &str)> {
        Some((self.method.as_deref()?, self.url.as_deref()?))
    }

    pub fn add_listener(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Move to `state` and fire the matching state-change notification.
    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
        self.dispatch(RequestEvent::ReadyStateChange(state));
    }

    /// Call every listener with `event`, in registration order.
    pub fn dispatch(&mut self, event: RequestEvent) {
        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in listeners.iter_mut() {
            listener(event, self);
        }
        self.listeners = listeners;
    }

    pub fn set_response_head(
        &mut self,
        status: u16,
        status_text: impl Into<String>,
        headers: HeaderMap,
    ) {
        self.status = status;
        self.status_text = status_text.into();
        self.headers = headers;
    }

    pub fn set_response_body(&mut self, body: SynthesizedBody) {
        self.body = Some(body);
    }

    pub(crate) fn mark_intercepted(&mut self) {
        self.intercepted = true;
    }

    /// True once a mock rule answered this request instead of the transport.
    pub fn is_intercepted(&self) -> bool {
        self.intercepted
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Response status, `0` until headers arrive.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn response_text(&self) -> &str {
        self.body.as_ref().map(SynthesizedBody::text).unwrap_or("")
    }

    /// Parsed JSON value when the body is JSON, the raw text otherwise.
    /// `Null` until a body is installed.
    pub fn response(&self) -> Value {
        match &self.body {
            Some(SynthesizedBody::Json { value, .. }) => value.clone(),
            Some(body) => Value::String(body.text().to_string()),
            None => Value::Null,
        }
    }

    /// Body as JSON. A body that does not parse is an error carrying the raw
    /// text, never the raw text in disguise.
    pub fn response_json(&self) -> Result<Value, BodyError> {
        match &self.body {
            Some(SynthesizedBody::Json { value, .. }) => Ok(value.clone()),
            Some(SynthesizedBody::Malformed { text, error }) => Err(BodyError {
                message: error.clone(),
                raw: text.clone(),
            }),
            Some(SynthesizedBody::Text(text)) => {
                serde_json::from_str(text).map_err(|e| BodyError {
                    message: e.to_string(),
                    raw: text.clone(),
                })
            }
            None => Err(BodyError {
                message: "no response body".to_string(),
                raw: String::new(),
            }),
        }
    }

    /// Header lookup. Intercepted requests only answer `Content-Type`.
    pub fn response_header(&self, name: &str) -> Option<&str> {
        if self.intercepted && !name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
            return None;
        }
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All response headers as `name: value` lines joined by CRLF.
    pub fn all_response_headers(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.headers {
            if self.intercepted && *name != CONTENT_TYPE {
                continue;
            }
            if let Ok(value) = value.to_str() {
                out.push_str(name.as_str());
                out.push_str(": ");
                out.push_str(value);
                out.push_str("\r\n");
            }
        }
        out
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("ready_state", &self.ready_state)
            .field("status", &self.status)
            .field("intercepted", &self.intercepted)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
