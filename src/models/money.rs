use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Round a monetary value to whole cents.
pub(crate) fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Largest magnitude any raw input may coerce to: 10^15.
///
/// Totals, percent shares and ratios are computed with plain `Decimal`
/// arithmetic; inputs at this size keep every such result far inside range.
const MAX_MAGNITUDE: Decimal =
    Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Money must be a non-negative amount.
pub(crate) fn is_valid_money(value: Decimal) -> bool {
    value >= Decimal::ZERO
}

/// A number as supplied by a caller, before coercion.
///
/// Front ends hand over whatever they received (a JSON number, a CLI
/// argument, a CSV cell) and the core decides whether it is usable.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    /// Coerce to a decimal. Empty text, unparsable text, NaN, infinities and
    /// anything beyond [`MAX_MAGNITUDE`] all yield `None`; nothing is ever
    /// defaulted to zero.
    pub(crate) fn to_decimal(&self) -> Option<Decimal> {
        self.parse().filter(|d| d.abs() <= MAX_MAGNITUDE)
    }

    fn parse(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => from_finite(*n),
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                if let Ok(d) = Decimal::from_str(trimmed) {
                    return Some(d);
                }
                trimmed.parse::<f64>().ok().and_then(from_finite)
            }
        }
    }
}

fn from_finite(n: f64) -> Option<Decimal> {
    if n.is_finite() {
        Decimal::from_f64(n)
    } else {
        None
    }
}

impl From<f64> for RawNumber {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RawNumber {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawNumber {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Decimal> for RawNumber {
    fn from(d: Decimal) -> Self {
        Self::Text(d.to_string())
    }
}

/// Normalize a currency label: trimmed and upper-cased, falling back to
/// `default` when blank. Currency is a label only; nothing converts between them.
pub(crate) fn normalize_currency(input: Option<&str>, default: &str) -> String {
    match input.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_uppercase(),
        _ => default.trim().to_uppercase(),
    }
}
