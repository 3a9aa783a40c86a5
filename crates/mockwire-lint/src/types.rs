//! Issue and result types shared by the library and the CLI.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The engine will reject or misread the document.
    Error,
    /// Loads, but probably not what the author meant.
    Warning,
    Info,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One finding in a configuration document.
#[derive(Debug, Clone, Serialize)]
pub struct LintIssue {
    pub severity: Severity,
    /// Stable code such as `E007` or `W002`.
    pub code: &'static str,
    pub message: String,
    #[serde(serialize_with = "serialize_path")]
    pub file: PathBuf,
    /// JSON path inside the document, e.g. `rules[2].statusCode`.
    pub location: Option<String>,
    pub suggestion: Option<String>,
}

fn serialize_path<S>(path: &Path, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&path.to_string_lossy())
}

impl LintIssue {
    pub fn new(
        severity: Severity,
        code: &'static str,
        message: impl Into<String>,
        file: &Path,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            file: file.to_path_buf(),
            location: None,
            suggestion: None,
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>, file: &Path) -> Self {
        Self::new(Severity::Error, code, message, file)
    }

    pub fn warning(code: &'static str, message: impl Into<String>, file: &Path) -> Self {
        Self::new(Severity::Warning, code, message, file)
    }

    pub fn info(code: &'static str, message: impl Into<String>, file: &Path) -> Self {
        Self::new(Severity::Info, code, message, file)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Issues found across one or more documents, with running counts.
#[derive(Debug, Default, Serialize)]
pub struct LintResult {
    pub issues: Vec<LintIssue>,
    pub files_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl LintResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, issue: LintIssue) {
        match issue.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => self.infos += 1,
        }
        self.issues.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }

    /// No errors. Warnings do not make a document invalid.
    pub fn is_valid(&self) -> bool {
        self.errors == 0
    }

    /// Whether the CLI should fail; `strict` also fails on warnings.
    pub fn fails(&self, strict: bool) -> bool {
        self.has_errors() || (strict && self.has_warnings())
    }

    /// Issues carrying `code`, in the order they were found.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a LintIssue> + 'a {
        self.issues.iter().filter(move |i| i.code == code)
    }

    pub fn merge(&mut self, other: LintResult) {
        self.issues.extend(other.issues);
        self.files_checked += other.files_checked;
        self.errors += other.errors;
        self.warnings += other.warnings;
        self.infos += other.infos;
    }
}

#[derive(Debug, Clone, Default)]
pub struct LintOptions {
    /// Also report disabled rules (I002).
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_follow_severity() {
        let file = Path::new("a.json");
        let mut result = LintResult::new();
        result.add_issue(LintIssue::error("E002", "bad", file));
        result.add_issue(LintIssue::warning("W001", "odd", file));
        result.add_issue(LintIssue::info("I001", "fyi", file));

        assert_eq!((result.errors, result.warnings, result.infos), (1, 1, 1));
        assert!(!result.is_valid());
        assert_eq!(result.with_code("W001").count(), 1);
    }

    #[test]
    fn test_strict_fails_on_warnings() {
        let mut result = LintResult::new();
        result.add_issue(LintIssue::warning("W003", "empty", Path::new("a.json")));
        assert!(!result.fails(false));
        assert!(result.fails(true));
    }

    #[test]
    fn test_merge_adds_counts() {
        let mut a = LintResult::new();
        a.files_checked = 1;
        a.add_issue(LintIssue::error("E003", "x", Path::new("a.json")));
        let mut b = LintResult::new();
        b.files_checked = 2;
        b.add_issue(LintIssue::error("E003", "y", Path::new("b.json")));

        a.merge(b);
        assert_eq!(a.files_checked, 3);
        assert_eq!(a.errors, 2);
        assert_eq!(a.issues.len(), 2);
    }

    #[test]
    fn test_issue_serializes_path_as_string() {
        let issue =
            LintIssue::error("E001", "gone", Path::new("dir/a.json")).with_location("rules[0]");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["file"], "dir/a.json");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["location"], "rules[0]");
    }
}
