//! Rule engine configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEngineConfig {
    pub max_rules: usize,
    pub enable_cache: bool,
    pub cache_size: usize,
    pub cache_ttl_ms: u32,
    /// Compile `Pattern`/`Composite` address patterns at `add_rule`/
    /// `update_rule` time rather than on first evaluation.
    pub precompile_patterns: bool,
}

impl Default for RuleEngineConfig {
    fn default() -> Self {
        RuleEngineConfig {
            max_rules: 10_000,
            enable_cache: true,
            cache_size: 65_536,
            cache_ttl_ms: 1000,
            precompile_patterns: true,
        }
    }
}
