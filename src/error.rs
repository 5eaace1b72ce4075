use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::SpendingTag;

/// A spending tag already owned by another rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TagConflict {
    pub tag: SpendingTag,
    pub conflicting_rule_name: String,
}

impl std::fmt::Display for TagConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "\"{}\" is already assigned to {}",
            self.tag, self.conflicting_rule_name
        )
    }
}

fn join_conflicts(conflicts: &[TagConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Rejected rule or transaction input.
#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum ValidationError {
    #[error("Category name is required.")]
    NameRequired,

    #[error("Category type must be either \"fixed\" or \"percent\".")]
    InvalidKind,

    #[error("A numeric \"amount\" is required for fixed categories.")]
    InvalidFixedAmount,

    #[error("A positive numeric \"percent\" is required for percentage categories.")]
    InvalidPercent,

    #[error("Percentage categories cannot exceed 100% in total.")]
    PercentageCeilingExceeded,

    #[error("Spending categories already in use: {}", join_conflicts(.0))]
    SpendingCategoryConflict(Vec<TagConflict>),

    #[error("Unknown spending category: {0}")]
    UnknownSpendingCategory(String),

    #[error("A positive numeric transaction amount is required.")]
    InvalidTransactionAmount,
}

/// Why a paycheck could not be split.
#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum AllocationError {
    #[error("A numeric paycheck amount is required.")]
    InvalidAmount,

    #[error("Percentage categories cannot exceed 100% (got {total}%).")]
    PercentageCeilingExceeded { total: Decimal },

    #[error("Fixed amounts ({fixed_total}) exceed the paycheck amount ({gross_income}).")]
    FixedExceedsIncome {
        fixed_total: Decimal,
        gross_income: Decimal,
    },
}

/// Any failure of a budget operation. None of them leave partial effects.
#[derive(Debug, Error)]
pub(crate) enum BudgetError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("storage failure: {0}")]
    Storage(String),
}

impl BudgetError {
    pub(crate) fn category_not_found(id: &str) -> Self {
        Self::NotFound {
            what: "Category",
            id: id.to_string(),
        }
    }

    pub(crate) fn transaction_not_found(id: &str) -> Self {
        Self::NotFound {
            what: "Transaction",
            id: id.to_string(),
        }
    }
}

pub(crate) type BudgetResult<T> = std::result::Result<T, BudgetError>;
