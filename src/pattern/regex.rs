//! Runtime regex matcher.
//!
//! The original offers a compile-time CTRE path for patterns known at
//! build time; there is no equivalent macro-based compile-time regex
//! engine in the Rust ecosystem, so that path is not ported — every
//! regex pattern here goes through the `regex` crate's runtime engine.

use super::matcher::{PatternMatchResult, PatternMatcher};
use regex::Regex;

pub struct RegexMatcher {
    pattern: String,
    compiled: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let compiled = Regex::new(&pattern)?;
        Ok(RegexMatcher { pattern, compiled })
    }

    pub fn is_valid_regex(pattern: &str) -> bool {
        Regex::new(pattern).is_ok()
    }
}

impl PatternMatcher for RegexMatcher {
    fn matches(&self, input: &str) -> bool {
        self.compiled.is_match(input)
    }

    fn match_with_groups(&self, input: &str) -> PatternMatchResult {
        match self.compiled.captures(input) {
            Some(caps) => {
                let groups = caps
                    .iter()
                    .skip(1)
                    .map(|g| g.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                PatternMatchResult::matched(groups)
            }
            None => PatternMatchResult::no_match(),
        }
    }

    fn pattern(&self) -> &str {
        &self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modbus_address_pattern_captures_unit_and_address() {
        let m = RegexMatcher::new(r"^MB:(\d+):(\d+)$").unwrap();
        let result = m.match_with_groups("MB:1:4001");
        assert!(result.matched);
        assert_eq!(result.captured_groups, vec!["1".to_string(), "4001".to_string()]);
    }

    #[test]
    fn invalid_pattern_is_rejected_at_construction() {
        assert!(RegexMatcher::new("(unclosed").is_err());
        assert!(!RegexMatcher::is_valid_regex("(unclosed"));
    }
}
