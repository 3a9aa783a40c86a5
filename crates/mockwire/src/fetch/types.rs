use crate::error::BodyError;
use crate::response::{status_text, SynthesizedResponse};
use bytes::Bytes;
use hyper::http::{HeaderName, HeaderValue};
use hyper::HeaderMap;
use serde::de::DeserializeOwned;

/// Arguments of a promise-style call.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Absolute or relative URL, exactly as the caller passed it.
    pub url: String,
    /// `None` means the caller did not specify one (treated as `GET`).
    pub method: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Add a header. Names or values that are not valid HTTP are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Effective method, defaulting to `GET`.
    pub fn method(&self) -> &str {
        self.method.as_deref().unwrap_or("GET")
    }
}

/// Response-like object a promise-style call resolves to.
///
/// Unlike a streaming body, this one can be read any number of times, as
/// text or as JSON.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    status: u16,
    status_text: String,
    headers: HeaderMap,
    body: Bytes,
    url: String,
    mocked: bool,
}

impl FetchResponse {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status_text(status).to_string(),
            headers,
            body: body.into(),
            url: String::new(),
            mocked: false,
        }
    }

    pub(crate) fn from_synthesized(response: SynthesizedResponse, url: String) -> Self {
        let body = Bytes::from(response.body.text().to_owned());
        Self {
            status_text: status_text(response.status).to_string(),
            status: response.status,
            headers: response.headers,
            body,
            url,
            mocked: true,
        }
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the response was synthesized from a mock rule.
    pub fn is_mocked(&self) -> bool {
        self.mocked
    }

    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        serde_json::from_slice(&self.body).map_err(|e| BodyError {
            message: e.to_string(),
            raw: self.text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_request_method_defaults_to_get() {
        assert_eq!(FetchRequest::new("/a").method(), "GET");
        assert_eq!(FetchRequest::new("/a").with_method("post").method(), "post");
    }

    #[test]
    fn test_request_ignores_invalid_header() {
        let request = FetchRequest::new("/a")
            .with_header("X-Ok", "yes")
            .with_header("bad header", "no");
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_response_body_is_rereadable() {
        let response = FetchResponse::new(200, HeaderMap::new(), r#"{"id":1}"#);
        assert_eq!(response.text(), r#"{"id":1}"#);
        assert_eq!(response.json::<Value>().unwrap(), json!({"id": 1}));
        assert_eq!(response.text(), r#"{"id":1}"#);
    }

    #[test]
    fn test_response_json_error_keeps_raw_body() {
        let response = FetchResponse::new(200, HeaderMap::new(), "{bad json");
        let err = response.json::<Value>().unwrap_err();
        assert_eq!(err.raw, "{bad json");
    }

    #[test]
    fn test_response_ok_range() {
        assert!(FetchResponse::new(204, HeaderMap::new(), "").ok());
        assert!(!FetchResponse::new(404, HeaderMap::new(), "").ok());
        assert_eq!(FetchResponse::new(404, HeaderMap::new(), "").status_text(), "Not Found");
    }
}
