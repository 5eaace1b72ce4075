use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// The current paycheck. Replaced wholesale on update; no history is kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Paycheck {
    pub amount: Decimal,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}
