mod alert;
mod allocation;
mod category_rule;
mod money;
mod paycheck;
mod spending_tag;
mod transaction;

pub(crate) use alert::{Alert, AlertKind, BudgetStatus, Severity};
pub(crate) use allocation::{Allocation, AllocationLine};
pub(crate) use category_rule::{CategoryRule, RuleKind};
pub(crate) use money::{is_valid_money, normalize_currency, round_money, RawNumber};
pub(crate) use paycheck::Paycheck;
pub(crate) use spending_tag::SpendingTag;
pub(crate) use transaction::Transaction;

#[cfg(test)]
mod tests;
