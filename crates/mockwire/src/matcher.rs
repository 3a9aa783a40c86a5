//! Rule matching: (url, method) -> first matching enabled rule.

use crate::config::{EngineConfig, MockRule};
use regex::Regex;
use tracing::debug;

/// URL test compiled from a rule's `urlPattern`.
#[derive(Debug, Clone)]
pub enum UrlMatcher {
    /// The pattern compiled; tested anywhere in the URL.
    Regex(Regex),
    /// The pattern did not compile; matched as a literal substring.
    Substring(String),
}

impl UrlMatcher {
    /// Compile `pattern` as a regular expression, falling back to substring
    /// containment when it is not one. The fallback is normal operation, not
    /// a fault.
    pub fn compile(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => UrlMatcher::Regex(regex),
            Err(e) => {
                debug!(
                    "Pattern '{}' is not a regular expression ({}), matching as substring",
                    pattern, e
                );
                UrlMatcher::Substring(pattern.to_string())
            }
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlMatcher::Regex(regex) => regex.is_match(url),
            UrlMatcher::Substring(needle) => url.contains(needle.as_str()),
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, UrlMatcher::Regex(_))
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: MockRule,
    pub url: UrlMatcher,
}

impl CompiledRule {
    pub fn compile(rule: MockRule) -> Self {
        let url = UrlMatcher::compile(&rule.url_pattern);
        Self { rule, url }
    }

    pub fn matches(&self, url: &str, method: &str) -> bool {
        self.rule.method.accepts(method) && self.url.matches(url)
    }
}

/// Compiled snapshot of an [`EngineConfig`]'s rule set.
///
/// Only enabled rules are kept, in stored order, so evaluation is a single
/// first-match scan.
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    enabled: bool,
    rules: Vec<CompiledRule>,
}

impl RuleMatcher {
    pub fn compile(config: &EngineConfig) -> Self {
        let rules = config
            .rules
            .iter()
            .filter(|r| r.enabled)
            .cloned()
            .map(CompiledRule::compile)
            .collect();

        Self {
            enabled: config.enabled,
            rules,
        }
    }

    /// First enabled rule accepting `method` whose pattern matches `url`.
    /// Always `None` while the engine is disabled.
    pub fn find(&self, url: &str, method: &str) -> Option<&MockRule> {
        if !self.enabled {
            return None;
        }
        self.rules
            .iter()
            .find(|r| r.matches(url, method))
            .map(|r| &r.rule)
    }

    /// Number of rules taking part in matching.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Evaluate `config` directly, compiling patterns on the fly.
///
/// Same result as `RuleMatcher::compile(config).find(url, method)`; handy for
/// one-off previews.
pub fn match_rule<'a>(config: &'a EngineConfig, url: &str, method: &str) -> Option<&'a MockRule> {
    if !config.enabled {
        return None;
    }
    config.rules.iter().find(|rule| {
        rule.enabled
            && rule.method.accepts(method)
            && UrlMatcher::compile(&rule.url_pattern).matches(url)
    })
}
