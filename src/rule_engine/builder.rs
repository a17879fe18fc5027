//! Fluent builder for [`RoutingRule`].

use super::types::{CompareOp, RulePriority, RuleType, RoutingRule, ValueCondition};
use crate::common::{DataPoint, Quality, Value};

#[derive(Default)]
pub struct RuleBuilder {
    rule: RoutingRule,
}

impl RuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.rule.name = name.into();
        self
    }

    pub fn priority(mut self, priority: RulePriority) -> Self {
        self.rule.priority = priority;
        self
    }

    pub fn match_address(mut self, address: impl Into<String>) -> Self {
        self.rule.rule_type = RuleType::Static;
        self.rule.source_addresses.push(address.into());
        self
    }

    pub fn match_addresses(mut self, addresses: Vec<String>) -> Self {
        self.rule.rule_type = RuleType::Static;
        self.rule.source_addresses = addresses;
        self
    }

    pub fn match_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.rule.rule_type = RuleType::Pattern;
        self.rule.address_pattern = Some(pattern.into());
        self
    }

    pub fn match_protocol(mut self, protocol_id: u16) -> Self {
        self.rule.rule_type = RuleType::Protocol;
        self.rule.protocol_ids.push(protocol_id);
        self
    }

    pub fn match_protocols(mut self, protocols: Vec<u16>) -> Self {
        self.rule.rule_type = RuleType::Protocol;
        self.rule.protocol_ids = protocols;
        self
    }

    pub fn match_quality(mut self, quality: Quality) -> Self {
        self.rule.rule_type = RuleType::Quality;
        self.rule.quality_levels.push(quality);
        self
    }

    pub fn match_value(mut self, op: CompareOp, reference: Value) -> Self {
        self.rule.rule_type = RuleType::Value;
        self.rule.value_condition = Some(ValueCondition::new(op, reference));
        self
    }

    pub fn match_value_condition(mut self, condition: ValueCondition) -> Self {
        self.rule.rule_type = RuleType::Value;
        self.rule.value_condition = Some(condition);
        self
    }

    pub fn match_custom(
        mut self,
        predicate: impl Fn(&DataPoint) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.rule.rule_type = RuleType::Custom;
        self.rule.custom_predicate = Some(Box::new(predicate));
        self
    }

    pub fn route_to(mut self, sink_id: impl Into<String>) -> Self {
        self.rule.target_sink_ids.push(sink_id.into());
        self
    }

    pub fn route_to_all(mut self, sink_ids: Vec<String>) -> Self {
        self.rule.target_sink_ids = sink_ids;
        self
    }

    pub fn build(self) -> RoutingRule {
        self.rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_pattern_rule_with_targets() {
        let rule = RuleBuilder::new()
            .name("temperature_sensors")
            .priority(RulePriority::High)
            .match_pattern("sensors/temp*")
            .route_to("influxdb")
            .route_to("kafka")
            .build();
        assert_eq!(rule.rule_type, RuleType::Pattern);
        assert_eq!(rule.priority, RulePriority::High);
        assert_eq!(rule.target_sink_ids, vec!["influxdb", "kafka"]);
    }
}
