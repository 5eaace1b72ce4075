use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AlertKind {
    NearBudget,
    OverBudget,
}

impl AlertKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::NearBudget => "near_budget",
            Self::OverBudget => "over_budget",
        }
    }

    pub(crate) fn severity(&self) -> Severity {
        match self {
            Self::NearBudget => Severity::Warning,
            Self::OverBudget => Severity::Critical,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Severity {
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Where a category sits relative to its allocation. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum BudgetStatus {
    Comfortable,
    Warning,
    Critical,
}

impl BudgetStatus {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Comfortable => "Comfortable",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A near/over budget notice, rebuilt on every query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Alert {
    /// `{kind}-{category_id}`: one alert per category per kind.
    pub id: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub currency: String,
    pub category_id: String,
    pub category_name: String,
    pub allocated: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    /// Whole percent.
    pub percent_used: Decimal,
    pub message: String,
    pub updated_at: DateTime<Utc>,
}
