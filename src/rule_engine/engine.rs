//! Rule engine: priority-ordered rule evaluation against
//! `DataPoint`s, with an optional bounded, TTL-aware cache for repeated
//! address lookups.

use super::cache::EvaluationCache;
use super::config::RuleEngineConfig;
use super::stats::RuleEngineStats;
use super::types::{RoutingRule, RuleMatchResult, RuleType};
use crate::common::DataPoint;
use crate::pattern::{self, MatcherType, TrieMatcher};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

/// A metadata-only view of a [`RoutingRule`], returned from read APIs since
/// the rule itself may hold a non-cloneable custom predicate closure.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSummary {
    pub id: u32,
    pub name: String,
    pub rule_type: RuleType,
    pub priority: super::types::RulePriority,
    pub enabled: bool,
    pub match_count: u64,
    pub eval_count: u64,
}

impl From<&RoutingRule> for RuleSummary {
    fn from(r: &RoutingRule) -> Self {
        RuleSummary {
            id: r.id,
            name: r.name.clone(),
            rule_type: r.rule_type,
            priority: r.priority,
            enabled: r.enabled,
            match_count: r.match_count.load(std::sync::atomic::Ordering::Relaxed),
            eval_count: r.eval_count.load(std::sync::atomic::Ordering::Relaxed),
        }
    }
}

pub struct RuleEngine {
    config: RuleEngineConfig,
    rules: RwLock<Vec<RoutingRule>>,
    next_id: std::sync::atomic::AtomicU32,
    cache: Option<EvaluationCache>,
    stats: RuleEngineStats,
    /// Bulk exact/prefix index over enabled `Static` rules and any `Pattern`
    /// or `Composite` rule whose address pattern resolves to `Exact` or
    /// `Prefix`, rebuilt whenever the rule set changes. A single O(|address|)
    /// walk replaces an O(rule count) linear scan for those rule kinds.
    address_index: RwLock<TrieMatcher>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::with_config(RuleEngineConfig::default())
    }

    pub fn with_config(config: RuleEngineConfig) -> Self {
        let cache = if config.enable_cache {
            Some(EvaluationCache::new(config.cache_size, config.cache_ttl_ms))
        } else {
            None
        };
        RuleEngine {
            config,
            rules: RwLock::new(Vec::new()),
            next_id: std::sync::atomic::AtomicU32::new(1),
            cache,
            stats: RuleEngineStats::new(),
            address_index: RwLock::new(TrieMatcher::new()),
        }
    }

    /// Rebuilds the bulk address index from the current rule set. Called
    /// after every mutation so `evaluate` always sees a consistent index.
    fn rebuild_address_index(&self, rules: &[RoutingRule]) {
        let mut trie = TrieMatcher::new();
        for rule in rules {
            if !rule.enabled {
                continue;
            }
            if let Some(pattern) = rule.address_pattern.as_deref() {
                match pattern::analyze_pattern(pattern) {
                    MatcherType::Exact => trie.add_exact(pattern, rule.id),
                    MatcherType::Prefix => {
                        let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
                        trie.add_prefix(prefix, rule.id);
                    }
                    MatcherType::Wildcard | MatcherType::Regex | MatcherType::Auto => {}
                }
            } else if !rule.source_addresses.is_empty() {
                for address in &rule.source_addresses {
                    trie.add_exact(address, rule.id);
                }
            }
        }
        *self.address_index.write() = trie;
    }

    /// Assigns an id if `rule.id == 0`, inserts it in priority-descending
    /// order (equal-priority rules keep insertion order), and returns the
    /// id.
    pub fn add_rule(&self, mut rule: RoutingRule) -> u32 {
        if rule.id == 0 {
            rule.id = self.next_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
        if self.config.precompile_patterns {
            rule.precompile();
        }
        let id = rule.id;
        let mut rules = self.rules.write();
        rules.push(rule);
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        self.rebuild_address_index(&rules);
        id
    }

    /// Replaces the rule with id `rule_id` in place, preserving its
    /// position; `rule.id` is overwritten with `rule_id` if it differs.
    pub fn update_rule(&self, rule_id: u32, mut rule: RoutingRule) -> bool {
        rule.id = rule_id;
        if self.config.precompile_patterns {
            rule.precompile();
        }
        let mut rules = self.rules.write();
        if let Some(slot) = rules.iter_mut().find(|r| r.id == rule_id) {
            *slot = rule;
            rules.sort_by(|a, b| b.priority.cmp(&a.priority));
            self.rebuild_address_index(&rules);
            if let Some(cache) = &self.cache {
                cache.invalidate_matching(&[rule_id]);
            }
            true
        } else {
            false
        }
    }

    pub fn remove_rule(&self, rule_id: u32) -> bool {
        let mut rules = self.rules.write();
        let before = rules.len();
        rules.retain(|r| r.id != rule_id);
        let removed = rules.len() != before;
        if removed {
            self.rebuild_address_index(&rules);
            if let Some(cache) = &self.cache {
                cache.invalidate_matching(&[rule_id]);
            }
        }
        removed
    }

    pub fn set_rule_enabled(&self, rule_id: u32, enabled: bool) -> bool {
        let mut rules = self.rules.write();
        if let Some(rule) = rules.iter_mut().find(|r| r.id == rule_id) {
            rule.enabled = enabled;
            self.rebuild_address_index(&rules);
            true
        } else {
            false
        }
    }

    pub fn get_rule(&self, rule_id: u32) -> Option<RuleSummary> {
        self.rules
            .read()
            .iter()
            .find(|r| r.id == rule_id)
            .map(RuleSummary::from)
    }

    pub fn get_all_rules(&self) -> Vec<RuleSummary> {
        self.rules.read().iter().map(RuleSummary::from).collect()
    }

    pub fn clear_rules(&self) {
        self.rules.write().clear();
        *self.address_index.write() = TrieMatcher::new();
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.read().len()
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub fn stats(&self) -> &RuleEngineStats {
        &self.stats
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    pub fn config(&self) -> &RuleEngineConfig {
        &self.config
    }

    /// Evaluates every enabled rule against `dp`, in priority order.
    pub fn evaluate(&self, dp: &DataPoint) -> Vec<RuleMatchResult> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(dp.address()) {
                self.stats.cache_hits.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                return cached;
            }
            self.stats.cache_misses.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }

        let address_hits: HashSet<u32> = self
            .address_index
            .read()
            .find_matches(dp.address())
            .into_iter()
            .collect();

        let rules = self.rules.read();
        let mut results = Vec::new();
        let mut cacheable = true;

        for rule in rules.iter() {
            if !rule.enabled {
                continue;
            }
            if rule.bypasses_cache() {
                cacheable = false;
            }
            let result = self.evaluate_rule(rule, dp, &address_hits);
            if result.matched {
                results.push(result);
            }
        }
        drop(rules);

        if cacheable {
            if let Some(cache) = &self.cache {
                cache.put(dp.address().to_string(), results.clone());
            }
        }

        results
    }

    pub fn evaluate_first(&self, dp: &DataPoint) -> Option<RuleMatchResult> {
        self.evaluate(dp).into_iter().next()
    }

    pub fn evaluate_priority(
        &self,
        dp: &DataPoint,
        min_priority: super::types::RulePriority,
    ) -> Vec<RuleMatchResult> {
        self.evaluate(dp)
            .into_iter()
            .filter(|r| r.priority.map(|p| p >= min_priority).unwrap_or(false))
            .collect()
    }

    pub fn evaluate_batch(&self, data_points: &[DataPoint]) -> Vec<Vec<RuleMatchResult>> {
        data_points.iter().map(|dp| self.evaluate(dp)).collect()
    }

    fn evaluate_rule(
        &self,
        rule: &RoutingRule,
        dp: &DataPoint,
        address_hits: &HashSet<u32>,
    ) -> RuleMatchResult {
        let start = Instant::now();
        rule.eval_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        let matched = match rule.rule_type {
            RuleType::Static => address_hits.contains(&rule.id),
            RuleType::Pattern => match rule.address_pattern.as_deref() {
                Some(p) => match pattern::analyze_pattern(p) {
                    MatcherType::Exact | MatcherType::Prefix => address_hits.contains(&rule.id),
                    MatcherType::Wildcard | MatcherType::Regex | MatcherType::Auto => rule
                        .compiled_pattern()
                        .map(|m| m.matches(dp.address()))
                        .unwrap_or(false),
                },
                None => false,
            },
            RuleType::Protocol => rule.protocol_ids.contains(&dp.protocol_id()),
            RuleType::Quality => rule.quality_levels.contains(&dp.quality()),
            RuleType::Value => rule
                .value_condition
                .as_ref()
                .map(|c| c.evaluate(dp.value()))
                .unwrap_or(false),
            RuleType::Timestamp => {
                let after_start = rule.start_time.map(|t| dp.timestamp() >= t).unwrap_or(true);
                let before_end = rule.end_time.map(|t| dp.timestamp() <= t).unwrap_or(true);
                after_start && before_end
            }
            RuleType::Composite => self.evaluate_composite(rule, dp, address_hits),
            RuleType::Custom => rule
                .custom_predicate
                .as_ref()
                .map(|pred| catch_unwind(AssertUnwindSafe(|| pred(dp))).unwrap_or(false))
                .unwrap_or(false),
        };

        let elapsed_ns = start.elapsed().as_nanos() as i64;
        rule.total_eval_time_ns
            .fetch_add(elapsed_ns, std::sync::atomic::Ordering::Relaxed);
        self.stats.record_evaluation(elapsed_ns, matched);

        if matched {
            rule.match_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            RuleMatchResult {
                matched: true,
                rule_id: rule.id,
                priority: Some(rule.priority),
                target_ids: rule.target_sink_ids.clone(),
                captured_groups: Vec::new(),
            }
        } else {
            RuleMatchResult::no_match(rule.id)
        }
    }

    /// Conjunction of every filter dimension present on the rule; a
    /// dimension that isn't configured is treated as satisfied rather than
    /// as a non-match, so a rule can mix e.g. a pattern with a quality
    /// filter without requiring every other dimension to be set too.
    fn evaluate_composite(
        &self,
        rule: &RoutingRule,
        dp: &DataPoint,
        address_hits: &HashSet<u32>,
    ) -> bool {
        let address_ok = if let Some(pattern) = rule.address_pattern.as_deref() {
            match pattern::analyze_pattern(pattern) {
                MatcherType::Exact | MatcherType::Prefix => address_hits.contains(&rule.id),
                MatcherType::Wildcard | MatcherType::Regex | MatcherType::Auto => rule
                    .compiled_pattern()
                    .map(|m| m.matches(dp.address()))
                    .unwrap_or(false),
            }
        } else if !rule.source_addresses.is_empty() {
            address_hits.contains(&rule.id)
        } else {
            true
        };

        let protocol_ok = rule.protocol_ids.is_empty() || rule.protocol_ids.contains(&dp.protocol_id());
        let quality_ok = rule.quality_levels.is_empty() || rule.quality_levels.contains(&dp.quality());
        let value_ok = rule
            .value_condition
            .as_ref()
            .map(|c| c.evaluate(dp.value()))
            .unwrap_or(true);
        let time_ok = rule.start_time.map(|t| dp.timestamp() >= t).unwrap_or(true)
            && rule.end_time.map(|t| dp.timestamp() <= t).unwrap_or(true);
        let custom_ok = rule
            .custom_predicate
            .as_ref()
            .map(|pred| catch_unwind(AssertUnwindSafe(|| pred(dp))).unwrap_or(false))
            .unwrap_or(true);

        address_ok && protocol_ok && quality_ok && value_ok && time_ok && custom_ok
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::rule_engine::types::RulePriority;

    fn rule(id: u32, priority: RulePriority, address: &str, sink: &str) -> RoutingRule {
        RoutingRule {
            id,
            rule_type: RuleType::Static,
            priority,
            source_addresses: vec![address.to_string()],
            target_sink_ids: vec![sink.to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn higher_priority_rule_evaluated_first() {
        let engine = RuleEngine::new();
        engine.add_rule(rule(1, RulePriority::Low, "x", "low-sink"));
        engine.add_rule(rule(2, RulePriority::High, "x", "high-sink"));
        let dp = DataPoint::new("x", Value::Empty);
        let results = engine.evaluate(&dp);
        assert_eq!(results[0].target_ids, vec!["high-sink".to_string()]);
        assert_eq!(results[1].target_ids, vec!["low-sink".to_string()]);
    }

    #[test]
    fn same_priority_rules_evaluated_in_insertion_order() {
        let engine = RuleEngine::new();
        engine.add_rule(rule(5, RulePriority::Normal, "x", "five"));
        engine.add_rule(rule(2, RulePriority::Normal, "x", "two"));
        let dp = DataPoint::new("x", Value::Empty);
        let results = engine.evaluate(&dp);
        assert_eq!(results[0].rule_id, 5);
        assert_eq!(results[1].rule_id, 2);
    }

    #[test]
    fn disabled_rule_never_matches() {
        let engine = RuleEngine::new();
        let mut r = rule(1, RulePriority::Normal, "x", "sink");
        r.enabled = false;
        engine.add_rule(r);
        let dp = DataPoint::new("x", Value::Empty);
        assert!(engine.evaluate(&dp).is_empty());
    }

    #[test]
    fn value_rule_is_not_served_from_cache() {
        let engine = RuleEngine::new();
        let mut r = RoutingRule {
            id: 1,
            rule_type: RuleType::Value,
            value_condition: Some(super::super::types::ValueCondition::new(
                super::super::types::CompareOp::Gt,
                Value::F64(10.0),
            )),
            target_sink_ids: vec!["alert".to_string()],
            ..Default::default()
        };
        r.id = 1;
        engine.add_rule(r);

        let hot = DataPoint::new("temp", Value::F64(99.0));
        assert_eq!(engine.evaluate(&hot).len(), 1);
        let cold = DataPoint::new("temp", Value::F64(1.0));
        assert_eq!(engine.evaluate(&cold).len(), 0);
    }

    #[test]
    fn custom_predicate_panic_is_contained_as_no_match() {
        let engine = RuleEngine::new();
        let r = RoutingRule {
            id: 1,
            rule_type: RuleType::Custom,
            custom_predicate: Some(Box::new(|_: &DataPoint| panic!("boom"))),
            target_sink_ids: vec!["sink".to_string()],
            ..Default::default()
        };
        engine.add_rule(r);
        let dp = DataPoint::new("x", Value::Empty);
        let results = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| engine.evaluate(&dp)));
        assert!(results.is_ok());
        assert!(results.unwrap().is_empty());
    }

    #[test]
    fn pattern_rule_matches_via_wildcard() {
        let engine = RuleEngine::new();
        let r = RoutingRule {
            id: 1,
            rule_type: RuleType::Pattern,
            address_pattern: Some("sensors/*".to_string()),
            target_sink_ids: vec!["sink".to_string()],
            ..Default::default()
        };
        engine.add_rule(r);
        let dp = DataPoint::new("sensors/temp/1", Value::Empty);
        assert_eq!(engine.evaluate(&dp).len(), 1);
    }

    #[test]
    fn composite_rule_requires_every_configured_dimension() {
        let engine = RuleEngine::new();
        let r = RoutingRule {
            id: 1,
            rule_type: RuleType::Composite,
            address_pattern: Some("sensors/*".to_string()),
            quality_levels: vec![crate::common::Quality::Good],
            target_sink_ids: vec!["sink".to_string()],
            ..Default::default()
        };
        engine.add_rule(r);

        let good = DataPoint::new("sensors/temp", Value::Empty);
        assert_eq!(engine.evaluate(&good).len(), 1);

        let mut bad_quality = DataPoint::new("sensors/temp", Value::Empty);
        bad_quality.set_quality(crate::common::Quality::Bad);
        assert_eq!(engine.evaluate(&bad_quality).len(), 0);

        let wrong_address = DataPoint::new("other/temp", Value::Empty);
        assert_eq!(engine.evaluate(&wrong_address).len(), 0);
    }

    #[test]
    fn remove_rule_drops_it_from_future_evaluations() {
        let engine = RuleEngine::new();
        let id = engine.add_rule(rule(0, RulePriority::Normal, "x", "sink"));
        assert!(engine.remove_rule(id));
        let dp = DataPoint::new("x", Value::Empty);
        assert!(engine.evaluate(&dp).is_empty());
    }
}
