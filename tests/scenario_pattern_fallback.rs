//! Pattern fallback: the factory's heuristic resolves a `?`-bearing
//! pattern to a wildcard matcher and a `.`-bearing pattern to a regex
//! matcher, each matching what they should.

use ipb_core::pattern::{create, MatcherType, PatternMatcher};

#[test]
fn question_mark_pattern_resolves_to_wildcard() {
    let matcher = create("sensors/temp?", MatcherType::Auto).unwrap();
    assert!(matcher.matches("sensors/temp1"));
    assert!(!matcher.matches("sensors/temperature"));
}

#[test]
fn dot_star_pattern_resolves_to_regex() {
    let matcher = create("sensors/.*", MatcherType::Auto).unwrap();
    assert!(matcher.matches("sensors/temp1"));
    assert!(matcher.matches("sensors/temperature"));
}
