//! Exact string matcher: O(n) comparison, the fastest of the
//! concrete matchers.

use super::matcher::{PatternMatchResult, PatternMatcher};

pub struct ExactMatcher {
    pattern: String,
}

impl ExactMatcher {
    pub fn new(pattern: impl Into<String>) -> Self {
        ExactMatcher {
            pattern: pattern.into(),
        }
    }
}

impl PatternMatcher for ExactMatcher {
    fn matches(&self, input: &str) -> bool {
        input == self.pattern
    }

    fn match_with_groups(&self, input: &str) -> PatternMatchResult {
        if self.matches(input) {
            PatternMatchResult::matched(vec![])
        } else {
            PatternMatchResult::no_match()
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
    fn matches_only_identical_string() {
        let m = ExactMatcher::new("sensors/temp/1");
        assert!(m.matches("sensors/temp/1"));
        assert!(!m.matches("sensors/temp/2"));
    }
}
