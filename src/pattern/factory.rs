//! Pattern matcher factory: picks the cheapest matcher that
//! can express a given pattern.

use super::exact::ExactMatcher;
use super::matcher::PatternMatcher;
use super::prefix::PrefixMatcher;
use super::regex::RegexMatcher;
use super::wildcard::WildcardMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherType {
    Auto,
    Exact,
    Prefix,
    Wildcard,
    Regex,
}

const REGEX_METACHARS: &[char] = &['(', ')', '[', ']', '{', '}', '^', '$', '+', '|', '\\', '.'];

/// Heuristic used by `Auto`: a trailing `*` with nothing else special is a
/// prefix match; any `*`/`?` makes it a wildcard; regex metacharacters
/// require the full regex engine; otherwise it's an exact match.
pub fn analyze_pattern(pattern: &str) -> MatcherType {
    let has_wildcard_chars = pattern.contains('*') || pattern.contains('?');
    let has_regex_metachars = pattern.chars().any(|c| REGEX_METACHARS.contains(&c));

    if has_regex_metachars {
        return MatcherType::Regex;
    }

    if !has_wildcard_chars {
        return MatcherType::Exact;
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        if !prefix.contains('*') && !prefix.contains('?') {
            return MatcherType::Prefix;
        }
    }

    MatcherType::Wildcard
}

pub fn create(pattern: &str, hint: MatcherType) -> Result<Box<dyn PatternMatcher>, regex::Error> {
    let resolved = if hint == MatcherType::Auto {
        analyze_pattern(pattern)
    } else {
        hint
    };

    Ok(match resolved {
        MatcherType::Exact => Box::new(ExactMatcher::new(pattern)),
        MatcherType::Prefix => {
            let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
            Box::new(PrefixMatcher::new(prefix))
        }
        MatcherType::Wildcard => Box::new(WildcardMatcher::new(pattern)),
        MatcherType::Regex => Box::new(RegexMatcher::new(pattern)?),
        MatcherType::Auto => unreachable!("resolved above"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_is_exact() {
        assert_eq!(analyze_pattern("sensors/temp/1"), MatcherType::Exact);
    }

    #[test]
    fn trailing_star_is_prefix() {
        assert_eq!(analyze_pattern("sensors/*"), MatcherType::Prefix);
    }

    #[test]
    fn interior_star_is_wildcard() {
        assert_eq!(analyze_pattern("sensors/*/temp"), MatcherType::Wildcard);
    }

    #[test]
    fn metachars_force_regex() {
        assert_eq!(analyze_pattern(r"MB:(\d+):(\d+)"), MatcherType::Regex);
    }

    #[test]
    fn create_auto_picks_matching_implementation() {
        let m = create("sensors/*", MatcherType::Auto).unwrap();
        assert!(m.matches("sensors/temp"));
    }
}
