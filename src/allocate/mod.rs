//! Splitting a paycheck across fixed and percentage rules.
//!
//! Every total is rounded to cents where it is computed, in this order:
//! percentage total, fixed total, remainder after fixed, each percent line,
//! variable total, leftover. Rounding at other points gives different cents.

use rust_decimal::Decimal;

use crate::error::AllocationError;
use crate::models::{is_valid_money, round_money, Allocation, AllocationLine, CategoryRule, RuleKind};

/// Split `gross_income` across `rules`, preserving rule order.
///
/// Fixed rules are paid first; percent rules share what remains. Anything
/// the percentages leave unclaimed is reported as `leftover` and never
/// redistributed. No partial result is produced on failure.
pub(crate) fn allocate(
    gross_income: Decimal,
    rules: &[CategoryRule],
    currency: &str,
) -> Result<Allocation, AllocationError> {
    if !is_valid_money(gross_income) {
        return Err(AllocationError::InvalidAmount);
    }

    let percentage_total = percentage_total(rules);
    if percentage_total > Decimal::ONE_HUNDRED {
        return Err(AllocationError::PercentageCeilingExceeded {
            total: percentage_total,
        });
    }

    let fixed_total = round_money(rules.iter().map(|r| r.kind.fixed_amount()).sum());
    if fixed_total > gross_income {
        return Err(AllocationError::FixedExceedsIncome {
            fixed_total,
            gross_income: round_money(gross_income),
        });
    }

    let remaining_after_fixed = round_money(gross_income - fixed_total);

    let allocations: Vec<AllocationLine> = rules
        .iter()
        .map(|rule| {
            let allocated = match rule.kind {
                RuleKind::Fixed { amount } => amount,
                RuleKind::Percent { percent } => {
                    round_money(percent / Decimal::ONE_HUNDRED * remaining_after_fixed)
                }
            };
            AllocationLine {
                rule_id: rule.id.clone(),
                name: rule.name.clone(),
                rule: rule.kind,
                allocated,
            }
        })
        .collect();

    // Summed from the rounded lines so per-line drift lands in `leftover`.
    let variable_total = round_money(
        allocations
            .iter()
            .filter(|a| !a.rule.is_fixed())
            .map(|a| a.allocated)
            .sum(),
    );
    let leftover = round_money(remaining_after_fixed - variable_total);

    Ok(Allocation {
        currency: currency.to_string(),
        gross_income: round_money(gross_income),
        fixed_total,
        percentage_total,
        remaining_after_fixed,
        variable_total,
        total_allocated: round_money(fixed_total + variable_total),
        leftover,
        allocations,
    })
}

/// Sum of the percent rules' percentages, rounded.
pub(crate) fn percentage_total(rules: &[CategoryRule]) -> Decimal {
    round_money(rules.iter().map(|r| r.kind.percent()).sum())
}
