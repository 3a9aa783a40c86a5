//! Network-backed originals for both client contracts.
//!
//! [`ReqwestTransport`] is what the interceptors wrap when requests that match
//! no rule should really go out.

use crate::error::TransportError;
use crate::event::{EventTransport, Exchange, ReadyState, RequestEvent};
use crate::fetch::{FetchRequest, FetchResponse, FetchTransport};
use crate::response::{status_text, SynthesizedBody};
use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::HeaderMap;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(TransportError::new)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn request(
        &self,
        method: &str,
        url: &str,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let method = parse_method(method)?;
        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        Ok(builder)
    }
}

#[async_trait]
impl FetchTransport for ReqwestTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, TransportError> {
        let method = request.method().to_string();
        let FetchRequest { url, headers, body, .. } = request;
        debug!(url = %url, method = %method, "Sending request");
        let response = self
            .request(&method, &url, headers, body)?
            .send()
            .await
            .map_err(TransportError::new)?;

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let body = response.bytes().await.map_err(TransportError::new)?;

        Ok(FetchResponse::new(status.as_u16(), headers, body)
            .with_status_text(status.canonical_reason().unwrap_or(""))
            .with_url(url))
    }
}

#[async_trait]
impl EventTransport for ReqwestTransport {
    fn open(&self, exchange: &mut Exchange, method: &str, url: &str) -> Result<(), TransportError> {
        parse_method(method)?;
        exchange.capture(method, url);
        exchange.set_ready_state(ReadyState::Opened);
        Ok(())
    }

    async fn send(
        &self,
        exchange: &mut Exchange,
        body: Option<Bytes>,
    ) -> Result<(), TransportError> {
        let (method, url) = match exchange.request_line() {
            Some((method, url)) => (method.to_string(), url.to_string()),
            None => return Err(TransportError::new("request was not opened")),
        };
        debug!(url = %url, method = %method, "Sending request");

        let sent = match self.request(&method, &url, HeaderMap::new(), body) {
            Ok(builder) => builder.send().await.map_err(TransportError::new),
            Err(e) => Err(e),
        };
        let response = match sent {
            Ok(response) => response,
            Err(e) => return Err(fail(exchange, e)),
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        exchange.set_response_head(status, status_text(status), headers);
        exchange.set_ready_state(ReadyState::HeadersReceived);

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Err(fail(exchange, TransportError::new(e))),
        };
        let body = classify_body(exchange.response_header(CONTENT_TYPE.as_str()), text);
        exchange.set_response_body(body);
        exchange.set_ready_state(ReadyState::Loading);
        exchange.set_ready_state(ReadyState::Done);
        exchange.dispatch(RequestEvent::Load);
        exchange.dispatch(RequestEvent::LoadEnd);
        Ok(())
    }
}

fn parse_method(method: &str) -> Result<Method, TransportError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(TransportError::new)
}

/// Finish a failed exchange the way a network error would.
fn fail(exchange: &mut Exchange, error: TransportError) -> TransportError {
    debug!(error = %error, "Request failed");
    exchange.set_ready_state(ReadyState::Done);
    exchange.dispatch(RequestEvent::Error);
    exchange.dispatch(RequestEvent::LoadEnd);
    error
}

fn classify_body(content_type: Option<&str>, text: String) -> SynthesizedBody {
    let is_json = content_type.is_some_and(|ct| ct.contains("json"));
    if !is_json {
        return SynthesizedBody::Text(text);
    }
    match serde_json::from_str(&text) {
        Ok(value) => SynthesizedBody::Json { text, value },
        Err(e) => SynthesizedBody::Malformed {
            text,
            error: e.to_string(),
        },
    }
}
