#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

// ── Money ─────────────────────────────────────────────────────

#[test]
fn test_round_money_half_up() {
    assert_eq!(round_money(dec!(1.005)), dec!(1.01));
    assert_eq!(round_money(dec!(1.004)), dec!(1.00));
    assert_eq!(round_money(dec!(33.333)), dec!(33.33));
    assert_eq!(round_money(dec!(0)), dec!(0));
}

#[test]
fn test_is_valid_money() {
    assert!(is_valid_money(dec!(0)));
    assert!(is_valid_money(dec!(12.50)));
    assert!(!is_valid_money(dec!(-0.01)));
}

#[test]
fn test_raw_number_from_number() {
    assert_eq!(RawNumber::Number(42.5).to_decimal(), Some(dec!(42.5)));
    assert_eq!(RawNumber::Number(0.1).to_decimal(), Some(dec!(0.1)));
}

#[test]
fn test_raw_number_rejects_non_finite() {
    assert_eq!(RawNumber::Number(f64::NAN).to_decimal(), None);
    assert_eq!(RawNumber::Number(f64::INFINITY).to_decimal(), None);
    assert_eq!(RawNumber::Number(f64::NEG_INFINITY).to_decimal(), None);
    assert_eq!(RawNumber::from("NaN").to_decimal(), None);
    assert_eq!(RawNumber::from("inf").to_decimal(), None);
    assert_eq!(RawNumber::from("-Infinity").to_decimal(), None);
}

#[test]
fn test_raw_number_text() {
    assert_eq!(RawNumber::from("1500").to_decimal(), Some(dec!(1500)));
    assert_eq!(RawNumber::from("  12.34 ").to_decimal(), Some(dec!(12.34)));
    assert_eq!(RawNumber::from("-5").to_decimal(), Some(dec!(-5)));
    assert_eq!(RawNumber::from("1e3").to_decimal(), Some(dec!(1000)));
}

#[test]
fn test_raw_number_text_fails_closed() {
    assert_eq!(RawNumber::from("").to_decimal(), None);
    assert_eq!(RawNumber::from("   ").to_decimal(), None);
    assert_eq!(RawNumber::from("abc").to_decimal(), None);
    assert_eq!(RawNumber::from("12abc").to_decimal(), None);
}

#[test]
fn test_raw_number_rejects_huge_magnitudes() {
    assert_eq!(
        RawNumber::from("1000000000000000").to_decimal(),
        Some(dec!(1000000000000000))
    );
    assert_eq!(RawNumber::from("1000000000000000.01").to_decimal(), None);
    assert_eq!(RawNumber::from("79228162514264337593543950335").to_decimal(), None);
    assert_eq!(RawNumber::from("-50000000000000000000000000000").to_decimal(), None);
    assert_eq!(RawNumber::Number(1e16).to_decimal(), None);
    assert_eq!(RawNumber::from("1e20").to_decimal(), None);
}

#[test]
fn test_normalize_currency() {
    assert_eq!(normalize_currency(Some(" eur "), "USD"), "EUR");
    assert_eq!(normalize_currency(Some(""), "usd"), "USD");
    assert_eq!(normalize_currency(None, "GBP"), "GBP");
}

// ── SpendingTag ───────────────────────────────────────────────

#[test]
fn test_spending_tag_parse() {
    assert_eq!(SpendingTag::parse("groceries"), Some(SpendingTag::Groceries));
    assert_eq!(SpendingTag::parse("GROCERIES"), Some(SpendingTag::Groceries));
    assert_eq!(SpendingTag::parse(" rent "), Some(SpendingTag::Rent));
    assert_eq!(
        SpendingTag::parse("personal-care"),
        Some(SpendingTag::PersonalCare)
    );
    assert_eq!(
        SpendingTag::parse("personal care"),
        Some(SpendingTag::PersonalCare)
    );
    assert_eq!(SpendingTag::parse("yachts"), None);
}

#[test]
fn test_spending_tag_roundtrip() {
    for t in SpendingTag::all() {
        let s = t.as_str();
        assert_eq!(SpendingTag::parse(s), Some(*t), "Roundtrip failed for {s}");
    }
}

#[test]
fn test_spending_tag_display() {
    assert_eq!(format!("{}", SpendingTag::PersonalCare), "personal-care");
}

// ── CategoryRule ──────────────────────────────────────────────

#[test]
fn test_rule_kind_accessors() {
    let fixed = RuleKind::Fixed { amount: dec!(100) };
    let pct = RuleKind::Percent { percent: dec!(30) };
    assert!(fixed.is_fixed());
    assert!(!pct.is_fixed());
    assert_eq!(fixed.percent(), Decimal::ZERO);
    assert_eq!(fixed.fixed_amount(), dec!(100));
    assert_eq!(pct.percent(), dec!(30));
    assert_eq!(pct.fixed_amount(), Decimal::ZERO);
    assert_eq!(fixed.as_str(), "fixed");
    assert_eq!(pct.as_str(), "percent");
}

#[test]
fn test_default_rules() {
    let rules = CategoryRule::defaults();
    let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["essentials", "non-essentials", "uncategorized"]);
    let total: Decimal = rules.iter().map(|r| r.kind.percent()).sum();
    assert_eq!(total, dec!(100));
}

#[test]
fn test_rule_lookup() {
    let rules = vec![
        CategoryRule::new("rent", "Rent", RuleKind::Fixed { amount: dec!(900) })
            .with_tags([SpendingTag::Rent, SpendingTag::Utilities]),
        CategoryRule::new("fun", "Fun", RuleKind::Percent { percent: dec!(10) }),
    ];
    assert_eq!(CategoryRule::find_by_id(&rules, "fun").unwrap().name, "Fun");
    assert_eq!(CategoryRule::find_by_name(&rules, "RENT").unwrap().id, "rent");
    assert_eq!(
        CategoryRule::find_by_tag(&rules, SpendingTag::Utilities)
            .unwrap()
            .id,
        "rent"
    );
    assert!(CategoryRule::find_by_tag(&rules, SpendingTag::Travel).is_none());
    assert!(CategoryRule::find_by_id(&rules, "missing").is_none());
}

#[test]
fn test_rule_serializes_flat() {
    let rule = CategoryRule::new("fun", "Fun", RuleKind::Percent { percent: dec!(10) })
        .with_tags([SpendingTag::Dining]);
    let json = serde_json::to_value(&rule).unwrap();
    assert_eq!(json["type"], "percent");
    assert_eq!(json["percent"], 10.0);
    assert_eq!(json["spendingCategories"][0], "dining");
}

// ── Alerts ────────────────────────────────────────────────────

#[test]
fn test_alert_kind_severity() {
    assert_eq!(AlertKind::NearBudget.severity(), Severity::Warning);
    assert_eq!(AlertKind::OverBudget.severity(), Severity::Critical);
    assert_eq!(AlertKind::OverBudget.as_str(), "over_budget");
    assert_eq!(format!("{}", Severity::Critical), "critical");
}
