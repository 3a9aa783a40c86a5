use crate::config::{MockRule, ResponseType};
use crate::error::SynthesisError;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, StatusCode};
use serde_json::Value;
use tracing::error;

/// Body of a synthesized response.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesizedBody {
    Json { text: String, value: Value },
    Text(String),
    /// Declared JSON but did not parse. Only produced by [`synthesize_lenient`].
    Malformed { text: String, error: String },
}

impl SynthesizedBody {
    pub fn text(&self) -> &str {
        match self {
            SynthesizedBody::Json { text, .. } => text,
            SynthesizedBody::Text(text) => text,
            SynthesizedBody::Malformed { text, .. } => text,
        }
    }

    /// Parsed value, for JSON bodies that parsed.
    pub fn json(&self) -> Option<&Value> {
        match self {
            SynthesizedBody::Json { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn json_error(&self) -> Option<&str> {
        match self {
            SynthesizedBody::Malformed { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedResponse {
    /// The rule's status code verbatim, conventional or not.
    pub status: u16,
    pub headers: HeaderMap,
    pub body: SynthesizedBody,
}

impl SynthesizedResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// Build the response a rule describes.
///
/// A JSON rule whose data does not parse is an error; nothing is substituted.
pub fn synthesize(rule: &MockRule) -> Result<SynthesizedResponse, SynthesisError> {
    let body = match rule.response_type {
        ResponseType::Json => {
            let value = serde_json::from_str(&rule.response_data).map_err(|source| {
                SynthesisError::InvalidJson {
                    rule_id: rule.id.clone(),
                    raw: rule.response_data.clone(),
                    source,
                }
            })?;
            SynthesizedBody::Json {
                text: rule.response_data.clone(),
                value,
            }
        }
        ResponseType::Text => SynthesizedBody::Text(rule.response_data.clone()),
    };

    Ok(SynthesizedResponse {
        status: rule.status_code,
        headers: content_type_headers(rule.response_type),
        body,
    })
}

/// Like [`synthesize`], but an unparsable JSON body is reported on the
/// diagnostic channel and served as raw text. An intercepted call always
/// gets a response.
pub fn synthesize_lenient(rule: &MockRule) -> SynthesizedResponse {
    match synthesize(rule) {
        Ok(response) => response,
        Err(SynthesisError::InvalidJson { rule_id, raw, source }) => {
            error!(
                rule_id = %rule_id,
                "Mock rule '{}' has invalid JSON response data, serving it as raw text: {}",
                rule.label(),
                source
            );
            SynthesizedResponse {
                status: rule.status_code,
                headers: content_type_headers(rule.response_type),
                body: SynthesizedBody::Malformed {
                    text: raw,
                    error: source.to_string(),
                },
            }
        }
    }
}

/// Canonical reason phrase for `status`, empty when there is none.
pub fn status_text(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

fn content_type_headers(response_type: ResponseType) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(response_type.content_type()),
    );
    headers
}
