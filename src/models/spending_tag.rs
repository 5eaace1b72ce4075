use serde::Serialize;

/// Fine-grained spending label. Each tag routes to at most one budget rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum SpendingTag {
    Groceries,
    Rent,
    Utilities,
    Transport,
    Dining,
    Entertainment,
    Shopping,
    Health,
    Insurance,
    Subscriptions,
    Education,
    Travel,
    Savings,
    Debt,
    Gifts,
    PersonalCare,
    Other,
}

impl SpendingTag {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Groceries => "groceries",
            Self::Rent => "rent",
            Self::Utilities => "utilities",
            Self::Transport => "transport",
            Self::Dining => "dining",
            Self::Entertainment => "entertainment",
            Self::Shopping => "shopping",
            Self::Health => "health",
            Self::Insurance => "insurance",
            Self::Subscriptions => "subscriptions",
            Self::Education => "education",
            Self::Travel => "travel",
            Self::Savings => "savings",
            Self::Debt => "debt",
            Self::Gifts => "gifts",
            Self::PersonalCare => "personal-care",
            Self::Other => "other",
        }
    }

    /// Unknown tags are `None`; the vocabulary is closed.
    pub(crate) fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == lower || (lower == "personal care" && *t == Self::PersonalCare))
    }

    pub(crate) fn all() -> &'static [SpendingTag] {
        &[
            Self::Groceries,
            Self::Rent,
            Self::Utilities,
            Self::Transport,
            Self::Dining,
            Self::Entertainment,
            Self::Shopping,
            Self::Health,
            Self::Insurance,
            Self::Subscriptions,
            Self::Education,
            Self::Travel,
            Self::Savings,
            Self::Debt,
            Self::Gifts,
            Self::PersonalCare,
            Self::Other,
        ]
    }
}

impl std::fmt::Display for SpendingTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
