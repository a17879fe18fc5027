//! Pattern matching: exact, prefix, wildcard, and runtime-regex
//! matchers behind a common trait, a trie for bulk exact/prefix lookup,
//! and a heuristic factory.

pub mod exact;
pub mod factory;
pub mod matcher;
pub mod prefix;
pub mod regex;
pub mod trie;
pub mod wildcard;

pub use exact::ExactMatcher;
pub use factory::{analyze_pattern, create, MatcherType};
pub use matcher::{PatternMatchResult, PatternMatcher};
pub use prefix::PrefixMatcher;
pub use regex::RegexMatcher;
pub use trie::{TrieMatcher, TrieStats};
pub use wildcard::WildcardMatcher;
