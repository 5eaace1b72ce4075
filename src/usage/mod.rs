//! Spend per category and the alerts derived from it.
//!
//! Nothing here is cached: callers rebuild usage and alerts from the
//! current allocation and transaction log on every query.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{
    round_money, Alert, AlertKind, Allocation, BudgetStatus, CategoryRule, Paycheck, RuleKind,
    Transaction,
};

/// Spend at or above this share of the allocation raises a warning.
const NEAR_BUDGET_PERCENT: Decimal = Decimal::from_parts(85, 0, 0, false, 0);

/// One rule joined with its allocation and spend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryUsage {
    #[serde(flatten)]
    pub rule: CategoryRule,
    pub allocated: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub status: BudgetStatus,
}

impl CategoryUsage {
    pub(crate) fn id(&self) -> &str {
        &self.rule.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.rule.name
    }

    /// Spent over allocated, `None` when nothing was allocated.
    pub(crate) fn ratio(&self) -> Option<Decimal> {
        if self.allocated > Decimal::ZERO {
            Some(self.spent / self.allocated)
        } else {
            None
        }
    }
}

/// Join rules with the allocation and the transaction log.
///
/// Without an allocation (no paycheck yet) fixed rules count their own
/// amount as allocated and percent rules count zero. Transaction currency
/// is not checked.
pub(crate) fn usage_by_category(
    rules: &[CategoryRule],
    allocation: Option<&Allocation>,
    transactions: &[Transaction],
) -> Vec<CategoryUsage> {
    rules
        .iter()
        .map(|rule| {
            let allocated = allocation
                .and_then(|a| a.line_for(&rule.id))
                .map(|line| line.allocated)
                .unwrap_or_else(|| match rule.kind {
                    RuleKind::Fixed { amount } => amount,
                    RuleKind::Percent { .. } => Decimal::ZERO,
                });
            let spent = round_money(
                transactions
                    .iter()
                    .filter(|t| t.belongs_to(&rule.id))
                    .map(|t| t.amount)
                    .sum(),
            );
            CategoryUsage {
                rule: rule.clone(),
                allocated,
                spent,
                remaining: round_money(allocated - spent),
                status: classify(allocated, spent),
            }
        })
        .collect()
}

/// Classify spend against an allocation. There is no hysteresis.
pub(crate) fn classify(allocated: Decimal, spent: Decimal) -> BudgetStatus {
    if allocated <= Decimal::ZERO {
        BudgetStatus::Comfortable
    } else if spent > allocated {
        BudgetStatus::Critical
    } else if spent * Decimal::ONE_HUNDRED >= allocated * NEAR_BUDGET_PERCENT {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Comfortable
    }
}

fn whole_percent(ratio: Decimal) -> Decimal {
    (ratio * Decimal::ONE_HUNDRED).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Alerts for every category at or past the warning threshold.
pub(crate) fn build_alerts(
    usages: &[CategoryUsage],
    currency: &str,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    usages
        .iter()
        .filter_map(|usage| {
            let ratio = usage.ratio()?;
            let kind = match classify(usage.allocated, usage.spent) {
                BudgetStatus::Critical => AlertKind::OverBudget,
                BudgetStatus::Warning => AlertKind::NearBudget,
                BudgetStatus::Comfortable => return None,
            };
            let percent_used = whole_percent(ratio);
            let message = match kind {
                AlertKind::OverBudget => format!(
                    "{} is over budget by {} {:.2}",
                    usage.name(),
                    currency,
                    round_money(usage.spent - usage.allocated)
                ),
                AlertKind::NearBudget => format!(
                    "{} has used {}% of its budget",
                    usage.name(),
                    percent_used
                ),
            };
            Some(Alert {
                id: format!("{}-{}", kind.as_str(), usage.id()),
                kind,
                severity: kind.severity(),
                currency: currency.to_string(),
                category_id: usage.id().to_string(),
                category_name: usage.name().to_string(),
                allocated: usage.allocated,
                spent: usage.spent,
                remaining: usage.remaining,
                percent_used,
                message,
                updated_at: now,
            })
        })
        .collect()
}

/// Dashboard rollup over every category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Summary {
    pub currency: String,
    pub paycheck: Option<Paycheck>,
    pub allocated_total: Decimal,
    pub spent_total: Decimal,
    /// Whole percent of the allocated total already spent.
    pub budget_used_percent: Decimal,
    pub leftover_budget: Decimal,
    /// Paycheck share no percent rule claimed.
    pub unallocated: Decimal,
    pub alerts: Vec<Alert>,
    pub categories: Vec<CategoryUsage>,
}

pub(crate) fn summarize(
    currency: &str,
    paycheck: Option<&Paycheck>,
    allocation: Option<&Allocation>,
    categories: Vec<CategoryUsage>,
    now: DateTime<Utc>,
) -> Summary {
    let allocated_total = round_money(categories.iter().map(|c| c.allocated).sum());
    let spent_total = round_money(categories.iter().map(|c| c.spent).sum());
    let budget_used_percent = if allocated_total > Decimal::ZERO {
        whole_percent(spent_total / allocated_total)
    } else {
        Decimal::ZERO
    };
    let alerts = build_alerts(&categories, currency, now);

    Summary {
        currency: currency.to_string(),
        paycheck: paycheck.cloned(),
        allocated_total,
        spent_total,
        budget_used_percent,
        leftover_budget: round_money(allocated_total - spent_total),
        unallocated: allocation.map(|a| a.leftover).unwrap_or(Decimal::ZERO),
        alerts,
        categories,
    }
}
