//! Validation and repair of mock configuration documents.

use crate::types::{LintIssue, LintOptions, LintResult};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

const TOP_LEVEL_KEYS: [&str; 4] = ["enabled", "rules", "showNotification", "logRequests"];
const RULE_KEYS: [&str; 10] = [
    "id",
    "enabled",
    "name",
    "urlPattern",
    "method",
    "responseType",
    "responseData",
    "statusCode",
    "delay",
    "delayMs",
];
const METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "ALL"];
const RESPONSE_TYPES: [&str; 2] = ["json", "text"];

/// Validate a complete configuration document.
pub fn validate_config(
    file: &Path,
    config: &Value,
    result: &mut LintResult,
    options: &LintOptions,
) {
    let Some(obj) = config.as_object() else {
        result.add_issue(
            LintIssue::error(
                "E003",
                format!("Configuration must be a JSON object, found {}", type_name(config)),
                file,
            )
            .with_suggestion("Wrap the settings in { \"enabled\": true, \"rules\": [] }"),
        );
        return;
    };

    for flag in ["enabled", "showNotification", "logRequests"] {
        check_bool(file, obj, flag, flag, result);
    }

    for key in obj.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            result.add_issue(
                LintIssue::warning("W004", format!("Unknown top-level key: {key}"), file)
                    .with_location(key.as_str())
                    .with_suggestion(format!("Known keys: {}", TOP_LEVEL_KEYS.join(", "))),
            );
        }
    }

    match obj.get("rules") {
        None => {}
        Some(Value::Array(rules)) => {
            let mut seen_ids = HashSet::new();
            for (idx, rule) in rules.iter().enumerate() {
                validate_rule(file, rule, idx, &mut seen_ids, result, options);
            }
        }
        Some(other) => {
            result.add_issue(
                LintIssue::error(
                    "E005",
                    format!("'rules' must be an array, found {}", type_name(other)),
                    file,
                )
                .with_location("rules"),
            );
        }
    }
}

/// Validate one entry of `rules`. `seen_ids` carries ids from earlier rules.
pub fn validate_rule(
    file: &Path,
    rule: &Value,
    idx: usize,
    seen_ids: &mut HashSet<String>,
    result: &mut LintResult,
    options: &LintOptions,
) {
    let location = format!("rules[{idx}]");
    let Some(obj) = rule.as_object() else {
        result.add_issue(
            LintIssue::error(
                "E006",
                format!("Rule must be a JSON object, found {}", type_name(rule)),
                file,
            )
            .with_location(location),
        );
        return;
    };

    check_id(file, obj, &location, seen_ids, result);
    check_bool(file, obj, "enabled", &format!("{location}.enabled"), result);
    check_string(file, obj, "name", &location, result);
    check_method(file, obj, &location, result);
    check_status(file, obj, &location, result);
    check_delay(file, obj, &location, result);

    let response_type = check_response_type(file, obj, &location, result);
    if check_string(file, obj, "responseData", &location, result) && response_type == Some("json") {
        if let Some(data) = obj.get("responseData").and_then(Value::as_str) {
            validate_response_data(file, data, &format!("{location}.responseData"), result);
        }
    }
    if check_string(file, obj, "urlPattern", &location, result) {
        let pattern = obj.get("urlPattern").and_then(Value::as_str).unwrap_or("");
        validate_url_pattern(file, pattern, &format!("{location}.urlPattern"), result);
    }

    for key in obj.keys() {
        if !RULE_KEYS.contains(&key.as_str()) {
            result.add_issue(
                LintIssue::warning("W005", format!("Unknown rule field: {key}"), file)
                    .with_location(format!("{location}.{key}")),
            );
        }
    }

    if options.verbose && obj.get("enabled") == Some(&Value::Bool(false)) {
        result.add_issue(
            LintIssue::info("I002", "Rule is disabled and will never match", file)
                .with_location(location),
        );
    }
}

/// A JSON rule's body must parse, or every matching request is served a
/// degraded raw-text body.
pub fn validate_response_data(file: &Path, data: &str, location: &str, result: &mut LintResult) {
    if let Err(e) = serde_json::from_str::<Value>(data) {
        result.add_issue(
            LintIssue::warning("W002", format!("responseData is not valid JSON: {e}"), file)
                .with_location(location)
                .with_suggestion("Fix the JSON or set \"responseType\": \"text\""),
        );
    }
}

pub fn validate_url_pattern(file: &Path, pattern: &str, location: &str, result: &mut LintResult) {
    if pattern.is_empty() {
        result.add_issue(
            LintIssue::warning("W003", "Empty urlPattern matches every URL", file)
                .with_location(location),
        );
        return;
    }
    if let Err(e) = Regex::new(pattern) {
        let reason = e.to_string();
        let summary = reason.lines().last().unwrap_or("invalid pattern").trim();
        result.add_issue(
            LintIssue::info(
                "I001",
                format!("urlPattern is not a valid regular expression ({summary}); it will match as a plain substring"),
                file,
            )
            .with_location(location)
            .with_suggestion("Escape special characters such as [ ( ? if a literal match is intended"),
        );
    }
}

fn check_id(
    file: &Path,
    obj: &Map<String, Value>,
    location: &str,
    seen_ids: &mut HashSet<String>,
    result: &mut LintResult,
) {
    match obj.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => {
            if !seen_ids.insert(id.to_string()) {
                result.add_issue(
                    LintIssue::error("E007", format!("Duplicate rule id: {id}"), file)
                        .with_location(format!("{location}.id"))
                        .with_suggestion("Rule ids must be unique"),
                );
            }
        }
        _ => {
            result.add_issue(
                LintIssue::error("E008", "Rule is missing a non-empty string id", file)
                    .with_location(format!("{location}.id")),
            );
        }
    }
}

fn check_bool(
    file: &Path,
    obj: &Map<String, Value>,
    key: &str,
    location: &str,
    result: &mut LintResult,
) {
    if let Some(value) = obj.get(key) {
        if !value.is_boolean() {
            result.add_issue(
                LintIssue::error(
                    "E004",
                    format!("'{key}' must be a boolean, found {}", type_name(value)),
                    file,
                )
                .with_location(location),
            );
        }
    }
}

/// Returns true when the field is absent or a string.
fn check_string(
    file: &Path,
    obj: &Map<String, Value>,
    key: &str,
    location: &str,
    result: &mut LintResult,
) -> bool {
    match obj.get(key) {
        Some(value) if !value.is_string() => {
            result.add_issue(
                LintIssue::error(
                    "E013",
                    format!("'{key}' must be a string, found {}", type_name(value)),
                    file,
                )
                .with_location(format!("{location}.{key}")),
            );
            false
        }
        _ => true,
    }
}

fn check_method(file: &Path, obj: &Map<String, Value>, location: &str, result: &mut LintResult) {
    let Some(value) = obj.get("method") else {
        return;
    };
    let method = value.as_str().unwrap_or_default();
    if METHODS.contains(&method) {
        return;
    }
    let upper = method.to_ascii_uppercase();
    if METHODS.contains(&upper.as_str()) {
        result.add_issue(
            LintIssue::warning("W006", format!("Method {value} is not upper case"), file)
                .with_location(format!("{location}.method"))
                .with_suggestion(format!("Write \"{upper}\", or run with --fix")),
        );
        return;
    }
    result.add_issue(
        LintIssue::error("E009", format!("Invalid method: {value}"), file)
            .with_location(format!("{location}.method"))
            .with_suggestion(format!("Use one of: {}", METHODS.join(", "))),
    );
}

fn check_response_type<'a>(
    file: &Path,
    obj: &'a Map<String, Value>,
    location: &str,
    result: &mut LintResult,
) -> Option<&'a str> {
    let Some(value) = obj.get("responseType") else {
        return Some("json");
    };
    match value.as_str() {
        Some(t) if RESPONSE_TYPES.contains(&t) => Some(t),
        _ => {
            result.add_issue(
                LintIssue::error("E010", format!("Invalid responseType: {value}"), file)
                    .with_location(format!("{location}.responseType"))
                    .with_suggestion("Use \"json\" or \"text\""),
            );
            None
        }
    }
}

fn check_status(file: &Path, obj: &Map<String, Value>, location: &str, result: &mut LintResult) {
    let Some(value) = obj.get("statusCode") else {
        return;
    };
    let location = format!("{location}.statusCode");
    match value.as_u64().filter(|s| *s <= u64::from(u16::MAX)) {
        Some(status) if !(100..=599).contains(&status) => {
            result.add_issue(
                LintIssue::warning(
                    "W001",
                    format!("statusCode {status} is outside the HTTP range 100-599"),
                    file,
                )
                .with_location(location),
            );
        }
        Some(_) => {}
        None => {
            let mut issue = LintIssue::error(
                "E012",
                format!("statusCode must be an integer, found {value}"),
                file,
            )
            .with_location(location);
            if value.as_str().is_some_and(|s| s.trim().parse::<u16>().is_ok()) {
                issue = issue.with_suggestion("Remove the quotes (fixable with --fix)");
            }
            result.add_issue(issue);
        }
    }
}

fn check_delay(file: &Path, obj: &Map<String, Value>, location: &str, result: &mut LintResult) {
    for key in ["delay", "delayMs"] {
        if let Some(value) = obj.get(key) {
            if value.as_u64().is_none() {
                result.add_issue(
                    LintIssue::error(
                        "E011",
                        format!("'{key}' must be a non-negative integer of milliseconds, found {value}"),
                        file,
                    )
                    .with_location(format!("{location}.{key}")),
                );
            }
        }
    }
}

/// Apply the mechanical repairs `--fix` offers. Returns one line per change.
///
/// - quoted `statusCode` and `delay` numbers become numbers
/// - lower-case methods and upper-case response types are normalized
pub fn fix_config(config: &mut Value) -> Vec<String> {
    let mut fixes = Vec::new();
    let Some(rules) = config.get_mut("rules").and_then(Value::as_array_mut) else {
        return fixes;
    };

    for (idx, rule) in rules.iter_mut().enumerate() {
        let Some(obj) = rule.as_object_mut() else {
            continue;
        };

        if let Some(value) = obj.get_mut("statusCode") {
            if let Some(status) = value.as_str().and_then(|s| s.trim().parse::<u16>().ok()) {
                *value = Value::from(status);
                fixes.push(format!("rules[{idx}].statusCode: string -> number"));
            }
        }

        for key in ["delay", "delayMs"] {
            if let Some(value) = obj.get_mut(key) {
                if let Some(delay) = value.as_str().and_then(|s| s.trim().parse::<u64>().ok()) {
                    *value = Value::from(delay);
                    fixes.push(format!("rules[{idx}].{key}: string -> number"));
                }
            }
        }

        if let Some(value) = obj.get_mut("method") {
            if let Some(upper) = value
                .as_str()
                .map(str::to_ascii_uppercase)
                .filter(|m| METHODS.contains(&m.as_str()))
            {
                if value.as_str() != Some(upper.as_str()) {
                    fixes.push(format!("rules[{idx}].method: {value} -> \"{upper}\""));
                    *value = Value::String(upper);
                }
            }
        }

        if let Some(value) = obj.get_mut("responseType") {
            if let Some(lower) = value
                .as_str()
                .map(str::to_ascii_lowercase)
                .filter(|t| RESPONSE_TYPES.contains(&t.as_str()))
            {
                if value.as_str() != Some(lower.as_str()) {
                    fixes.push(format!("rules[{idx}].responseType: {value} -> \"{lower}\""));
                    *value = Value::String(lower);
                }
            }
        }
    }

    fixes
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lint(config: Value) -> LintResult {
        lint_with(config, &LintOptions::default())
    }

    fn lint_with(config: Value, options: &LintOptions) -> LintResult {
        let mut result = LintResult::new();
        validate_config(Path::new("test.json"), &config, &mut result, options);
        result
    }

    fn codes(result: &LintResult) -> Vec<&'static str> {
        result.issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_valid_config_has_no_issues() {
        let result = lint(json!({
            "enabled": true,
            "showNotification": false,
            "logRequests": true,
            "rules": [{
                "id": "rule_1",
                "enabled": true,
                "name": "user",
                "urlPattern": "/api/user",
                "method": "GET",
                "responseType": "json",
                "responseData": "{\"id\":1}",
                "statusCode": 200,
                "delay": 0
            }]
        }));
        assert!(result.issues.is_empty(), "{:?}", result.issues);
    }

    #[test]
    fn test_top_level_must_be_object() {
        assert_eq!(codes(&lint(json!([1, 2]))), vec!["E003"]);
    }

    #[test]
    fn test_flags_and_unknown_keys() {
        let result = lint(json!({"enabled": "yes", "theme": "dark", "rules": {}}));
        assert_eq!(codes(&result), vec!["E004", "W004", "E005"]);
    }

    #[test]
    fn test_rule_shape_errors() {
        let result = lint(json!({"rules": [
            "not a rule",
            {"id": "a", "urlPattern": "/x"},
            {"id": "a", "urlPattern": "/y"},
            {"urlPattern": "/z"}
        ]}));
        assert_eq!(codes(&result), vec!["E006", "E007", "E008"]);
        assert_eq!(result.issues[1].location.as_deref(), Some("rules[2].id"));
    }

    #[test]
    fn test_field_value_errors() {
        let result = lint(json!({"rules": [{
            "id": "a",
            "urlPattern": "/x",
            "method": "FETCH",
            "responseType": "xml",
            "statusCode": "200",
            "delay": -5
        }]}));
        let found = codes(&result);
        for code in ["E009", "E010", "E011", "E012"] {
            assert!(found.contains(&code), "missing {code} in {found:?}");
        }
    }

    #[test]
    fn test_lower_case_method_is_warning() {
        let result = lint(json!({"rules": [{"id": "a", "urlPattern": "/x", "method": "get"}]}));
        assert_eq!(codes(&result), vec!["W006"]);
        assert!(!result.has_errors());
        let method = result.with_code("W006").next().unwrap();
        assert_eq!(method.location.as_deref(), Some("rules[0].method"));
        assert_eq!(
            method.suggestion.as_deref(),
            Some("Write \"GET\", or run with --fix")
        );
    }

    #[test]
    fn test_warnings() {
        let result = lint(json!({"rules": [
            {"id": "a", "urlPattern": "/x", "statusCode": 42},
            {"id": "b", "urlPattern": "/y", "responseData": "{bad json"},
            {"id": "c", "urlPattern": "", "responseType": "text", "responseData": "{bad json"},
            {"id": "d", "urlPattern": "/z", "colour": "red"}
        ]}));
        assert_eq!(codes(&result), vec!["W001", "W002", "W003", "W005"]);
    }

    #[test]
    fn test_invalid_regex_is_info() {
        let result = lint(json!({"rules": [{"id": "a", "urlPattern": "/items["}]}));
        assert_eq!(codes(&result), vec!["I001"]);
        assert!(result.is_valid());
    }

    #[test]
    fn test_verbose_reports_disabled_rules() {
        let config = json!({"rules": [{"id": "a", "urlPattern": "/x", "enabled": false}]});
        assert!(lint(config.clone()).issues.is_empty());
        let verbose = lint_with(config, &LintOptions { verbose: true });
        assert_eq!(codes(&verbose), vec!["I002"]);
    }

    #[test]
    fn test_fix_config() {
        let mut config = json!({"rules": [{
            "id": "a",
            "urlPattern": "/a",
            "method": "post",
            "responseType": "TEXT",
            "statusCode": "404",
            "delayMs": "250"
        }]});
        let fixes = fix_config(&mut config);
        assert_eq!(fixes.len(), 4);
        assert_eq!(
            config["rules"][0],
            json!({
                "id": "a",
                "urlPattern": "/a",
                "method": "POST",
                "responseType": "text",
                "statusCode": 404,
                "delayMs": 250
            })
        );
        assert!(lint(config).issues.is_empty());
    }

    #[test]
    fn test_fix_leaves_valid_config_alone() {
        let mut config = json!({"rules": [{"id": "a", "method": "GET", "statusCode": 200}]});
        assert!(fix_config(&mut config).is_empty());
    }
}
