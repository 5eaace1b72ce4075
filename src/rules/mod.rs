//! Validation and normalization of category rule input.

use rust_decimal::Decimal;
use std::collections::BTreeSet;

use crate::error::{TagConflict, ValidationError};
use crate::models::{is_valid_money, round_money, CategoryRule, RawNumber, RuleKind, SpendingTag};

const PERCENT_CEILING: Decimal = Decimal::ONE_HUNDRED;

/// Raw rule data as a caller supplied it. Any field may be missing; on
/// update, missing fields fall back to the rule being replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CategoryInput {
    pub name: Option<String>,
    /// `"fixed"` or `"percent"`.
    pub kind: Option<String>,
    pub amount: Option<RawNumber>,
    pub percent: Option<RawNumber>,
    /// `Some(vec![])` clears the tags; `None` keeps the fallback's.
    pub spending_categories: Option<Vec<String>>,
}

impl CategoryInput {
    pub(crate) fn fixed(name: &str, amount: impl Into<RawNumber>) -> Self {
        Self {
            name: Some(name.to_string()),
            kind: Some("fixed".into()),
            amount: Some(amount.into()),
            ..Self::default()
        }
    }

    pub(crate) fn percent(name: &str, percent: impl Into<RawNumber>) -> Self {
        Self {
            name: Some(name.to_string()),
            kind: Some("percent".into()),
            percent: Some(percent.into()),
            ..Self::default()
        }
    }

    pub(crate) fn with_tags(mut self, tags: &[&str]) -> Self {
        self.spending_categories = Some(tags.iter().map(|t| t.to_string()).collect());
        self
    }
}

/// Turn raw input into a normalized rule.
///
/// The returned rule keeps the fallback's id; new rules come back with an
/// empty id for the caller to assign.
pub(crate) fn parse_rule(
    input: &CategoryInput,
    fallback: Option<&CategoryRule>,
) -> Result<CategoryRule, ValidationError> {
    let name = input
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| fallback.map(|f| f.name.clone()))
        .filter(|n| !n.is_empty())
        .ok_or(ValidationError::NameRequired)?;

    let kind_str = input
        .kind
        .as_deref()
        .or_else(|| fallback.map(|f| f.kind.as_str()))
        .ok_or(ValidationError::InvalidKind)?;

    let kind = match kind_str {
        "fixed" => {
            let amount = input
                .amount
                .as_ref()
                .and_then(RawNumber::to_decimal)
                .or_else(|| match (&input.amount, fallback.map(|f| f.kind)) {
                    (None, Some(RuleKind::Fixed { amount })) => Some(amount),
                    _ => None,
                })
                .filter(|a| is_valid_money(*a))
                .ok_or(ValidationError::InvalidFixedAmount)?;
            RuleKind::Fixed {
                amount: round_money(amount),
            }
        }
        "percent" => {
            let percent = input
                .percent
                .as_ref()
                .and_then(RawNumber::to_decimal)
                .or_else(|| match (&input.percent, fallback.map(|f| f.kind)) {
                    (None, Some(RuleKind::Percent { percent })) => Some(percent),
                    _ => None,
                })
                .filter(|p| *p > Decimal::ZERO)
                .ok_or(ValidationError::InvalidPercent)?;
            RuleKind::Percent {
                percent: round_money(percent),
            }
        }
        _ => return Err(ValidationError::InvalidKind),
    };

    let spending_categories = match &input.spending_categories {
        Some(tags) => parse_tags(tags)?,
        None => fallback
            .map(|f| f.spending_categories.clone())
            .unwrap_or_default(),
    };

    Ok(CategoryRule {
        id: fallback.map(|f| f.id.clone()).unwrap_or_default(),
        name,
        kind,
        spending_categories,
    })
}

fn parse_tags(tags: &[String]) -> Result<BTreeSet<SpendingTag>, ValidationError> {
    tags.iter()
        .map(|t| {
            SpendingTag::parse(t).ok_or_else(|| ValidationError::UnknownSpendingCategory(t.clone()))
        })
        .collect()
}

/// Normalize a whole list of inputs, assigning fresh ids. The first invalid
/// entry aborts the whole list.
pub(crate) fn normalize_rules(
    inputs: &[CategoryInput],
    mut next_id: impl FnMut(&str) -> String,
) -> Result<Vec<CategoryRule>, ValidationError> {
    inputs
        .iter()
        .map(|input| {
            let mut rule = parse_rule(input, None)?;
            rule.id = next_id(&rule.name);
            Ok(rule)
        })
        .collect()
}

/// Would adding `incoming_percent` (replacing `exclude_id`) keep the
/// percent rules at or under 100 in total?
pub(crate) fn check_percent_ceiling(
    active: &[CategoryRule],
    incoming_percent: Decimal,
    exclude_id: Option<&str>,
) -> bool {
    let existing: Decimal = active
        .iter()
        .filter(|r| Some(r.id.as_str()) != exclude_id)
        .map(|r| r.kind.percent())
        .sum();
    existing + incoming_percent <= PERCENT_CEILING
}

/// Every incoming tag already owned by some other rule.
pub(crate) fn check_spending_category_conflicts(
    active: &[CategoryRule],
    incoming: &BTreeSet<SpendingTag>,
    exclude_id: Option<&str>,
) -> Vec<TagConflict> {
    incoming
        .iter()
        .filter_map(|tag| {
            active
                .iter()
                .filter(|r| Some(r.id.as_str()) != exclude_id)
                .find(|r| r.spending_categories.contains(tag))
                .map(|owner| TagConflict {
                    tag: *tag,
                    conflicting_rule_name: owner.name.clone(),
                })
        })
        .collect()
}

/// Check a rule set that is about to replace the active one wholesale.
pub(crate) fn validate_rule_set(rules: &[CategoryRule]) -> Result<(), ValidationError> {
    if !check_percent_ceiling(rules, Decimal::ZERO, None) {
        return Err(ValidationError::PercentageCeilingExceeded);
    }

    let mut conflicts = Vec::new();
    for (i, rule) in rules.iter().enumerate() {
        conflicts.extend(check_spending_category_conflicts(
            &rules[..i],
            &rule.spending_categories,
            None,
        ));
    }
    if !conflicts.is_empty() {
        return Err(ValidationError::SpendingCategoryConflict(conflicts));
    }
    Ok(())
}
