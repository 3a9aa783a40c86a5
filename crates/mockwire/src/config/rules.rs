//! Mock rule definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP method a rule answers to. `ALL` accepts any method.
///
/// Stored documents may spell the method in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum RuleMethod {
    Get,
    Post,
    Put,
    Delete,
    #[default]
    All,
}

impl RuleMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleMethod::Get => "GET",
            RuleMethod::Post => "POST",
            RuleMethod::Put => "PUT",
            RuleMethod::Delete => "DELETE",
            RuleMethod::All => "ALL",
        }
    }

    /// Whether a request issued with `method` satisfies this rule.
    /// Comparison ignores ASCII case.
    pub fn accepts(&self, method: &str) -> bool {
        match self {
            RuleMethod::All => true,
            other => other.as_str().eq_ignore_ascii_case(method),
        }
    }
}

impl fmt::Display for RuleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<String> for RuleMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for RuleMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(RuleMethod::Get),
            "POST" => Ok(RuleMethod::Post),
            "PUT" => Ok(RuleMethod::Put),
            "DELETE" => Ok(RuleMethod::Delete),
            "ALL" => Ok(RuleMethod::All),
            other => Err(format!(
                "invalid method '{other}', expected one of GET, POST, PUT, DELETE, ALL"
            )),
        }
    }
}

/// How `responseData` is interpreted when the rule answers a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Json,
    Text,
}

impl ResponseType {
    /// `Content-Type` header value served for this response type.
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseType::Json => "application/json",
            ResponseType::Text => "text/plain",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ResponseType::Json => "json",
            ResponseType::Text => "text",
        })
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ResponseType::Json),
            "text" => Ok(ResponseType::Text),
            other => Err(format!(
                "invalid response type '{other}', expected json or text"
            )),
        }
    }
}

/// A (predicate, response template) pair.
///
/// Missing fields in a stored rule take the values of [`MockRule::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MockRule {
    pub id: String,
    pub enabled: bool,
    pub name: String,
    /// Regular expression tested against the full URL; matched as a plain
    /// substring when it does not compile.
    pub url_pattern: String,
    pub method: RuleMethod,
    pub response_type: ResponseType,
    /// Raw body. Parsed only when `response_type` is `json`, and only when
    /// the rule answers a request.
    pub response_data: String,
    pub status_code: u16,
    #[serde(rename = "delay", alias = "delayMs")]
    pub delay_ms: u64,
}

impl Default for MockRule {
    fn default() -> Self {
        Self {
            id: String::new(),
            enabled: true,
            name: String::new(),
            url_pattern: String::new(),
            method: RuleMethod::All,
            response_type: ResponseType::Json,
            response_data: "{}".to_string(),
            status_code: 200,
            delay_ms: 0,
        }
    }
}

impl MockRule {
    /// An enabled rule answering any method on URLs matching `url_pattern`
    /// with `200 {}`.
    pub fn new(url_pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_method(mut self, method: RuleMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_json(mut self, data: impl Into<String>) -> Self {
        self.response_type = ResponseType::Json;
        self.response_data = data.into();
        self
    }

    pub fn with_text(mut self, data: impl Into<String>) -> Self {
        self.response_type = ResponseType::Text;
        self.response_data = data.into();
        self
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Display label, falling back to the id for unnamed rules.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_method_accepts() {
        assert!(RuleMethod::Get.accepts("GET"));
        assert!(RuleMethod::Get.accepts("get"));
        assert!(!RuleMethod::Get.accepts("POST"));
        assert!(RuleMethod::All.accepts("PATCH"));
        assert!(RuleMethod::Delete.accepts("Delete"));
    }

    #[test]
    fn test_rule_method_from_str() {
        assert_eq!("post".parse::<RuleMethod>(), Ok(RuleMethod::Post));
        assert_eq!("ALL".parse::<RuleMethod>(), Ok(RuleMethod::All));
        assert!("PATCH".parse::<RuleMethod>().is_err());
    }

    #[test]
    fn test_response_type_content_type() {
        assert_eq!(ResponseType::Json.content_type(), "application/json");
        assert_eq!(ResponseType::Text.content_type(), "text/plain");
    }

    #[test]
    fn test_rule_serde_field_names() {
        let rule = MockRule::new("/api/user")
            .with_id("r1")
            .with_name("user")
            .with_method(RuleMethod::Get)
            .with_json(r#"{"id":1}"#)
            .with_delay(250);

        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["urlPattern"], "/api/user");
        assert_eq!(value["method"], "GET");
        assert_eq!(value["responseType"], "json");
        assert_eq!(value["responseData"], r#"{"id":1}"#);
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["delay"], 250);
    }

    #[test]
    fn test_rule_missing_fields_take_defaults() {
        let json = r#"{"id": "r1", "urlPattern": "/ping", "delayMs": 10}"#;
        let rule: MockRule = serde_json::from_str(json).unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.method, RuleMethod::All);
        assert_eq!(rule.response_type, ResponseType::Json);
        assert_eq!(rule.response_data, "{}");
        assert_eq!(rule.status_code, 200);
        assert_eq!(rule.delay_ms, 10);
    }

    #[test]
    fn test_rule_label_falls_back_to_id() {
        let rule = MockRule::new("/x").with_id("rule_1");
        assert_eq!(rule.label(), "rule_1");
        assert_eq!(rule.with_name("Users").label(), "Users");
    }
}
