use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;

use super::SpendingTag;

/// How a rule claims its share of the paycheck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum RuleKind {
    /// A constant amount, deducted before any percentage split.
    Fixed { amount: Decimal },
    /// A share of whatever is left after fixed rules.
    Percent { percent: Decimal },
}

impl RuleKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Percent { .. } => "percent",
        }
    }

    pub(crate) fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed { .. })
    }

    /// The percent claimed, zero for fixed rules.
    pub(crate) fn percent(&self) -> Decimal {
        match self {
            Self::Percent { percent } => *percent,
            Self::Fixed { .. } => Decimal::ZERO,
        }
    }

    /// The fixed amount claimed, zero for percent rules.
    pub(crate) fn fixed_amount(&self) -> Decimal {
        match self {
            Self::Fixed { amount } => *amount,
            Self::Percent { .. } => Decimal::ZERO,
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed { amount } => write!(f, "fixed {amount:.2}"),
            Self::Percent { percent } => write!(f, "{percent}%"),
        }
    }
}

/// A budget bucket definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryRule {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: RuleKind,
    pub spending_categories: BTreeSet<SpendingTag>,
}

impl CategoryRule {
    pub(crate) fn new(id: impl Into<String>, name: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            spending_categories: BTreeSet::new(),
        }
    }

    pub(crate) fn with_tags(mut self, tags: impl IntoIterator<Item = SpendingTag>) -> Self {
        self.spending_categories = tags.into_iter().collect();
        self
    }

    /// Find a rule by ID in a slice.
    pub(crate) fn find_by_id<'a>(rules: &'a [CategoryRule], id: &str) -> Option<&'a CategoryRule> {
        rules.iter().find(|r| r.id == id)
    }

    /// Find a rule by name (case-insensitive) in a slice.
    pub(crate) fn find_by_name<'a>(rules: &'a [CategoryRule], name: &str) -> Option<&'a CategoryRule> {
        let lower = name.trim().to_lowercase();
        rules.iter().find(|r| r.name.to_lowercase() == lower)
    }

    /// Find the rule that owns a spending tag.
    pub(crate) fn find_by_tag(rules: &[CategoryRule], tag: SpendingTag) -> Option<&CategoryRule> {
        rules.iter().find(|r| r.spending_categories.contains(&tag))
    }

    /// The rule set a fresh install starts with.
    pub(crate) fn defaults() -> Vec<CategoryRule> {
        vec![
            Self::new(
                "essentials",
                "Essentials",
                RuleKind::Percent {
                    percent: Decimal::from(50),
                },
            ),
            Self::new(
                "non-essentials",
                "Non-essentials",
                RuleKind::Percent {
                    percent: Decimal::from(20),
                },
            ),
            Self::new(
                "uncategorized",
                "Uncategorized",
                RuleKind::Percent {
                    percent: Decimal::from(30),
                },
            ),
        ]
    }
}

impl std::fmt::Display for CategoryRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
