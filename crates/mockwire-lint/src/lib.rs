//! Linter for Mockwire configuration documents.
//!
//! Checks exported or hand-written `EngineConfig` JSON (the document the
//! engine persists and `mockwire import` reads) before it is loaded. Can be
//! used as a library or through the `mockwire-lint` binary.
//!
//! # Example
//!
//! ```no_run
//! use mockwire_lint::{lint_file, LintOptions};
//! use std::path::Path;
//!
//! let result = lint_file(Path::new("mock-config-1700000000000.json"), &LintOptions::default());
//! if result.has_errors() {
//!     eprintln!("Found {} errors", result.errors);
//! }
//! ```

mod types;
mod validator;

use std::path::Path;

pub use types::{LintIssue, LintOptions, LintResult, Severity};
pub use validator::{
    fix_config, validate_config, validate_response_data, validate_rule, validate_url_pattern,
};

/// Lint a single configuration file.
pub fn lint_file(path: &Path, options: &LintOptions) -> LintResult {
    match std::fs::read_to_string(path) {
        Ok(content) => lint_json(&content, path, options),
        Err(e) => {
            let mut result = LintResult::new();
            result.files_checked = 1;
            result.add_issue(LintIssue::error(
                "E001",
                format!("Failed to read file: {e}"),
                path,
            ));
            result
        }
    }
}

/// Lint every `.json` file directly inside `path`.
pub fn lint_directory(path: &Path, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();

    let entries = match std::fs::read_dir(path) {
        Ok(e) => e,
        Err(e) => {
            result.add_issue(LintIssue::error(
                "E001",
                format!("Failed to read directory: {e}"),
                path,
            ));
            return result;
        }
    };

    let mut files: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    for file in files {
        result.merge(lint_file(&file, options));
    }
    result
}

/// Lint a JSON document held in memory. `source` names it in issues.
pub fn lint_json(json: &str, source: &Path, options: &LintOptions) -> LintResult {
    match serde_json::from_str(json) {
        Ok(value) => lint_value(&value, source, options),
        Err(e) => {
            let mut result = LintResult::new();
            result.files_checked = 1;
            result.add_issue(
                LintIssue::error("E002", format!("Invalid JSON: {e}"), source)
                    .with_suggestion("Check for trailing commas and unquoted keys"),
            );
            result
        }
    }
}

/// Lint an already-parsed document.
pub fn lint_value(value: &serde_json::Value, source: &Path, options: &LintOptions) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;
    validate_config(source, value, &mut result, options);
    result
}
