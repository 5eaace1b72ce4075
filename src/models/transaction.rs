use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A recorded spend against one budget rule. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Transaction {
    pub id: String,
    pub category_id: String,
    pub amount: Decimal,
    /// Label only. Spend totals never look at it.
    pub currency: String,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn belongs_to(&self, category_id: &str) -> bool {
        self.category_id == category_id
    }
}
