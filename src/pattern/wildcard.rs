//! Wildcard matcher: `*` matches any sequence, `?` matches a
//! single character. More deterministic than full regex, which is why
//! this one is tried before falling back to [`super::regex::RegexMatcher`].

use super::matcher::{PatternMatchResult, PatternMatcher};

pub struct WildcardMatcher {
    pattern: String,
}

impl WildcardMatcher {
    pub fn new(pattern: impl Into<String>) -> Self {
        WildcardMatcher {
            pattern: pattern.into(),
        }
    }

    fn match_impl(pattern: &[u8], input: &[u8]) -> bool {
        match (pattern.first(), input.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                Self::match_impl(&pattern[1..], input)
                    || (!input.is_empty() && Self::match_impl(pattern, &input[1..]))
            }
            (Some(b'?'), Some(_)) => Self::match_impl(&pattern[1..], &input[1..]),
            (Some(p), Some(i)) if p == i => Self::match_impl(&pattern[1..], &input[1..]),
            _ => false,
        }
    }
}

impl PatternMatcher for WildcardMatcher {
    fn matches(&self, input: &str) -> bool {
        Self::match_impl(self.pattern.as_bytes(), input.as_bytes())
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
    fn star_matches_any_sequence_including_empty() {
        let m = WildcardMatcher::new("sensors/*/temp");
        assert!(m.matches("sensors/floor1/temp"));
        assert!(m.matches("sensors//temp"));
        assert!(!m.matches("alarms/floor1/temp"));
    }

    #[test]
    fn question_mark_matches_exactly_one_char() {
        let m = WildcardMatcher::new("dev?");
        assert!(m.matches("dev1"));
        assert!(!m.matches("dev"));
        assert!(!m.matches("dev12"));
    }

    #[test]
    fn trailing_star_matches_remainder() {
        let m = WildcardMatcher::new("sensors/*");
        assert!(m.matches("sensors/"));
        assert!(m.matches("sensors/a/b/c"));
    }
}
