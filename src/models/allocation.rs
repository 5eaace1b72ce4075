use rust_decimal::Decimal;
use serde::Serialize;

use super::RuleKind;

/// One rule's share of an allocation, in rule order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AllocationLine {
    pub rule_id: String,
    pub name: String,
    /// The rule as it was when the allocation was computed.
    pub rule: RuleKind,
    pub allocated: Decimal,
}

/// A paycheck split across the active rule set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Allocation {
    pub currency: String,
    pub gross_income: Decimal,
    pub fixed_total: Decimal,
    pub percentage_total: Decimal,
    pub remaining_after_fixed: Decimal,
    pub variable_total: Decimal,
    pub total_allocated: Decimal,
    pub leftover: Decimal,
    pub allocations: Vec<AllocationLine>,
}

impl Allocation {
    pub(crate) fn line_for(&self, rule_id: &str) -> Option<&AllocationLine> {
        self.allocations.iter().find(|a| a.rule_id == rule_id)
    }
}
