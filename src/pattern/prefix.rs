//! Prefix matcher: O(m) where m is the prefix length.

use super::matcher::{PatternMatchResult, PatternMatcher};

pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        PrefixMatcher {
            prefix: prefix.into(),
        }
    }
}

impl PatternMatcher for PrefixMatcher {
    fn matches(&self, input: &str) -> bool {
        input.starts_with(self.prefix.as_str())
    }

    fn match_with_groups(&self, input: &str) -> PatternMatchResult {
        if self.matches(input) {
            PatternMatchResult::matched(vec![input[self.prefix.len()..].to_string()])
        } else {
            PatternMatchResult::no_match()
        }
    }

    fn pattern(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_any_string_starting_with_prefix() {
        let m = PrefixMatcher::new("sensors/");
        assert!(m.matches("sensors/temp/1"));
        assert!(!m.matches("alarms/temp/1"));
    }

    #[test]
    fn captures_the_remainder_after_prefix() {
        let m = PrefixMatcher::new("sensors/");
        let result = m.match_with_groups("sensors/temp/1");
        assert_eq!(result.captured_groups, vec!["temp/1".to_string()]);
    }
}
