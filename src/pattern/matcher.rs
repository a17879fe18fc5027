//! Pattern matcher trait and result type.

/// Result of a match attempt, including any captured groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMatchResult {
    pub matched: bool,
    pub captured_groups: Vec<String>,
}

impl PatternMatchResult {
    pub fn no_match() -> Self {
        PatternMatchResult::default()
    }

    pub fn matched(groups: Vec<String>) -> Self {
        PatternMatchResult {
            matched: true,
            captured_groups: groups,
        }
    }
}

impl From<&PatternMatchResult> for bool {
    fn from(result: &PatternMatchResult) -> bool {
        result.matched
    }
}

/// Common interface every concrete matcher implements.
pub trait PatternMatcher: Send + Sync {
    fn matches(&self, input: &str) -> bool;
    fn match_with_groups(&self, input: &str) -> PatternMatchResult;
    fn pattern(&self) -> &str;
}
