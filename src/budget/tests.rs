#![allow(clippy::unwrap_used)]

use super::*;
use anyhow::bail;
use chrono::TimeZone;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex as StdMutex};

use crate::models::{AlertKind, BudgetStatus, RuleKind, SpendingTag};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
struct SeqIds {
    next: u32,
}

impl IdGenerator for SeqIds {
    fn rule_id(&mut self, name: &str) -> String {
        self.next += 1;
        format!("{}-{}", slugify(name), self.next)
    }

    fn transaction_id(&mut self) -> String {
        self.next += 1;
        format!("txn-{}", self.next)
    }
}

/// Store that shares its contents with the test and can be told to fail.
#[derive(Clone, Default)]
struct SharedStore {
    state: Arc<StdMutex<Option<BudgetState>>>,
    fail: Arc<StdMutex<bool>>,
}

impl Store for SharedStore {
    fn load(&mut self) -> anyhow::Result<Option<BudgetState>> {
        Ok(self.state.lock().unwrap().clone())
    }

    fn save(&mut self, state: &BudgetState) -> anyhow::Result<()> {
        if *self.fail.lock().unwrap() {
            bail!("disk full");
        }
        *self.state.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn budget_with(store: SharedStore) -> Budget {
    Budget::open(
        Box::new(store),
        Box::new(FixedClock(t0())),
        Box::new(SeqIds::default()),
        "usd",
    )
    .unwrap()
}

fn budget() -> Budget {
    budget_with(SharedStore::default())
}

fn paid_budget() -> Budget {
    let b = budget();
    b.set_paycheck(&RawNumber::from(3000.0), Some("USD")).unwrap();
    b
}

// ── Opening ───────────────────────────────────────────────────

#[test]
fn test_open_seeds_defaults() {
    let store = SharedStore::default();
    let b = budget_with(store.clone());
    let ids: Vec<String> = b.categories().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["essentials", "non-essentials", "uncategorized"]);
    assert!(b.paycheck().is_none());
    assert!(b.allocation().is_none());
    assert!(store.state.lock().unwrap().is_some());
    assert_eq!(b.default_currency(), "USD");
}

#[test]
fn test_open_loads_existing_state() {
    let store = SharedStore::default();
    {
        let b = budget_with(store.clone());
        b.set_paycheck(&RawNumber::from("2000"), None).unwrap();
    }
    let b = budget_with(store);
    assert_eq!(b.paycheck().unwrap().amount, dec!(2000));
    assert_eq!(b.allocation().unwrap().total_allocated, dec!(2000));
}

#[test]
fn test_in_memory_budget() {
    let b = Budget::in_memory("eur").unwrap();
    assert_eq!(b.default_currency(), "EUR");
    assert_eq!(b.categories().len(), 3);
}

// ── Categories ────────────────────────────────────────────────

#[test]
fn test_create_category_assigns_id() {
    let b = budget();
    b.delete_category("uncategorized").unwrap();
    let rule = b
        .create_category(&CategoryInput::fixed("Rent & Bills", 900.0).with_tags(&["rent"]))
        .unwrap();
    assert_eq!(rule.id, "rent-bills-1");
    assert_eq!(rule.kind, RuleKind::Fixed { amount: dec!(900) });
    assert!(rule.spending_categories.contains(&SpendingTag::Rent));
    assert_eq!(b.categories().last().unwrap(), &rule);
}

#[test]
fn test_create_category_over_ceiling_is_rejected() {
    let b = budget();
    let err = b
        .create_category(&CategoryInput::percent("Extra", 1.0))
        .unwrap_err();
    assert!(matches!(
        err,
        BudgetError::Validation(ValidationError::PercentageCeilingExceeded)
    ));
    assert_eq!(b.categories().len(), 3);
}

#[test]
fn test_tag_conflict_names_owner() {
    let b = budget();
    b.update_category(
        "essentials",
        &CategoryInput::default().with_tags(&["groceries", "rent"]),
    )
    .unwrap();
    b.delete_category("uncategorized").unwrap();

    let err = b
        .create_category(&CategoryInput::percent("Food", 10.0).with_tags(&["Groceries"]))
        .unwrap_err();
    match err {
        BudgetError::Validation(ValidationError::SpendingCategoryConflict(conflicts)) => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].tag, SpendingTag::Groceries);
            assert_eq!(conflicts[0].conflicting_rule_name, "Essentials");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_update_may_keep_its_own_tags() {
    let b = budget();
    b.update_category("essentials", &CategoryInput::default().with_tags(&["rent"]))
        .unwrap();
    let rule = b
        .update_category(
            "essentials",
            &CategoryInput {
                name: Some("Needs".into()),
                spending_categories: Some(vec!["rent".into(), "utilities".into()]),
                ..CategoryInput::default()
            },
        )
        .unwrap();
    assert_eq!(rule.name, "Needs");
    assert_eq!(rule.kind, RuleKind::Percent { percent: dec!(50) });
    assert_eq!(rule.spending_categories.len(), 2);
}

#[test]
fn test_tag_can_be_dropped_and_taken_back() {
    let b = budget();
    let set_tags = |tags: &[&str]| {
        b.update_category("non-essentials", &CategoryInput::default().with_tags(tags))
    };

    assert_eq!(
        set_tags(&["rent"]).unwrap().spending_categories,
        BTreeSet::from([SpendingTag::Rent])
    );
    assert!(set_tags(&[]).unwrap().spending_categories.is_empty());
    assert_eq!(
        set_tags(&["rent"]).unwrap().spending_categories,
        BTreeSet::from([SpendingTag::Rent])
    );
}

#[test]
fn test_conflicting_tag_update_leaves_state_untouched() {
    let b = paid_budget();
    b.update_category("essentials", &CategoryInput::default().with_tags(&["groceries"]))
        .unwrap();
    let rules_before = b.categories();
    let allocation_before = b.allocation();

    let err = b
        .update_category(
            "non-essentials",
            &CategoryInput::default().with_tags(&["groceries", "dining"]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        BudgetError::Validation(ValidationError::SpendingCategoryConflict(_))
    ));
    assert_eq!(b.categories(), rules_before);
    assert_eq!(b.allocation(), allocation_before);
}

#[test]
fn test_huge_rule_values_are_rejected() {
    let b = budget();
    let err = b
        .create_category(&CategoryInput::percent("Huge", "79228162514264337593543950335"))
        .unwrap_err();
    assert!(matches!(
        err,
        BudgetError::Validation(ValidationError::InvalidPercent)
    ));

    let err = b
        .create_category(&CategoryInput::fixed("Yacht", "50000000000000000000000000000"))
        .unwrap_err();
    assert!(matches!(
        err,
        BudgetError::Validation(ValidationError::InvalidFixedAmount)
    ));
    assert_eq!(b.categories().len(), 3);
}

#[test]
fn test_largest_accepted_values_still_summarize() {
    let b = budget();
    b.create_category(&CategoryInput::fixed("Yacht", "1000000000000000")).unwrap();
    b.create_category(&CategoryInput::fixed("Jet", "1000000000000000")).unwrap();
    b.add_transaction(&TransactionInput::new("essentials", "1000000000000000"))
        .unwrap();
    b.add_transaction(&TransactionInput::new("essentials", "1000000000000000"))
        .unwrap();

    let summary = b.summary();
    assert_eq!(summary.allocated_total, dec!(2000000000000000));
    assert_eq!(summary.spent_total, dec!(2000000000000000));
    assert_eq!(summary.budget_used_percent, dec!(100));

    let err = b
        .add_transaction(&TransactionInput::new("essentials", "1e28"))
        .unwrap_err();
    assert!(matches!(
        err,
        BudgetError::Validation(ValidationError::InvalidTransactionAmount)
    ));
}

#[test]
fn test_update_missing_category() {
    let b = budget();
    let err = b
        .update_category("nope", &CategoryInput::percent("X", 5.0))
        .unwrap_err();
    assert!(matches!(err, BudgetError::NotFound { what: "Category", .. }));
}

#[test]
fn test_create_that_breaks_allocation_is_rejected() {
    let b = paid_budget();
    b.delete_category("uncategorized").unwrap();
    let err = b
        .create_category(&CategoryInput::fixed("Rent", 5000.0))
        .unwrap_err();
    assert!(matches!(
        err,
        BudgetError::Allocation(AllocationError::FixedExceedsIncome { .. })
    ));
    assert_eq!(b.categories().len(), 2);
    assert_eq!(b.allocation().unwrap().fixed_total, dec!(0));
}

#[test]
fn test_update_that_breaks_allocation_is_rejected() {
    let b = paid_budget();
    let rules_before = b.categories();
    let allocation_before = b.allocation();

    let err = b
        .update_category(
            "uncategorized",
            &CategoryInput {
                kind: Some("fixed".into()),
                amount: Some(RawNumber::from(5000.0)),
                ..CategoryInput::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        BudgetError::Allocation(AllocationError::FixedExceedsIncome { .. })
    ));
    assert_eq!(b.categories(), rules_before);
    assert_eq!(b.allocation(), allocation_before);
}

#[test]
fn test_delete_category_recomputes_allocation() {
    let b = paid_budget();
    b.delete_category("uncategorized").unwrap();
    let allocation = b.allocation().unwrap();
    assert_eq!(allocation.allocations.len(), 2);
    assert_eq!(allocation.leftover, dec!(900));
    assert!(matches!(
        b.delete_category("uncategorized"),
        Err(BudgetError::NotFound { .. })
    ));
}

// ── Paycheck & allocation ─────────────────────────────────────

#[test]
fn test_set_paycheck_computes_allocation() {
    let b = budget();
    let paycheck = b.set_paycheck(&RawNumber::from(" 3000 "), Some("eur")).unwrap();
    assert_eq!(paycheck.currency, "EUR");
    assert_eq!(paycheck.updated_at, t0());
    let allocation = b.allocation().unwrap();
    assert_eq!(allocation.line_for("essentials").unwrap().allocated, dec!(1500));
    assert_eq!(allocation.currency, "EUR");
}

#[test]
fn test_set_paycheck_rejects_bad_amounts() {
    let b = paid_budget();
    for raw in [
        RawNumber::from("abc"),
        RawNumber::from(-5.0),
        RawNumber::from(f64::NAN),
        RawNumber::from("79228162514264337593543950335"),
    ] {
        let err = b.set_paycheck(&raw, None).unwrap_err();
        assert!(matches!(
            err,
            BudgetError::Allocation(AllocationError::InvalidAmount)
        ));
    }
    assert_eq!(b.paycheck().unwrap().amount, dec!(3000));
}

#[test]
fn test_paycheck_below_fixed_total_is_rejected() {
    let b = budget();
    b.delete_category("uncategorized").unwrap();
    b.create_category(&CategoryInput::fixed("Rent", 1200.0)).unwrap();
    let err = b.set_paycheck(&RawNumber::from(1000.0), None).unwrap_err();
    assert!(matches!(
        err,
        BudgetError::Allocation(AllocationError::FixedExceedsIncome { .. })
    ));
    assert!(b.paycheck().is_none());
}

#[test]
fn test_preview_does_not_commit() {
    let b = paid_budget();
    let preview = b
        .preview_allocation(&RawNumber::from(1000.0), None, None)
        .unwrap();
    assert_eq!(preview.total_allocated, dec!(1000));
    assert_eq!(b.allocation().unwrap().gross_income, dec!(3000));
}

#[test]
fn test_preview_with_override_rules() {
    let b = paid_budget();
    let rules = vec![
        CategoryInput::fixed("Rent", 1000.0),
        CategoryInput::percent("Savings", 50.0),
    ];
    let preview = b
        .preview_allocation(&RawNumber::from(2000.0), Some("gbp"), Some(&rules))
        .unwrap();
    assert_eq!(preview.currency, "GBP");
    assert_eq!(preview.fixed_total, dec!(1000));
    assert_eq!(preview.allocations[1].allocated, dec!(500));
    assert_eq!(b.categories().len(), 3);
}

#[test]
fn test_preview_with_empty_override_uses_active_rules() {
    let b = paid_budget();
    let preview = b
        .preview_allocation(&RawNumber::from(100.0), None, Some(&[]))
        .unwrap();
    assert_eq!(preview.allocations.len(), 3);
}

#[test]
fn test_preview_with_invalid_override() {
    let b = paid_budget();
    let rules = vec![CategoryInput::percent("A", 70.0), CategoryInput::percent("B", 40.0)];
    let err = b
        .preview_allocation(&RawNumber::from(100.0), None, Some(&rules))
        .unwrap_err();
    assert!(matches!(
        err,
        BudgetError::Allocation(AllocationError::PercentageCeilingExceeded { .. })
    ));
}

// ── Onboarding ────────────────────────────────────────────────

#[test]
fn test_onboard_replaces_everything() {
    let b = paid_budget();
    b.add_transaction(&TransactionInput::new("essentials", 10.0))
        .unwrap();

    let splits = vec![
        CategoryInput::fixed("Rent", 1200.0).with_tags(&["rent"]),
        CategoryInput::percent("Savings", 40.0).with_tags(&["savings"]),
    ];
    let allocation = b
        .onboard(&RawNumber::from(3200.0), Some("cad"), &splits)
        .unwrap();
    assert_eq!(allocation.currency, "CAD");
    assert_eq!(allocation.line_for("savings-3").unwrap().allocated, dec!(800));
    assert_eq!(b.categories().len(), 2);
    assert!(b.transactions(None).is_empty());
}

#[test]
fn test_onboard_with_conflicting_tags_changes_nothing() {
    let b = paid_budget();
    let splits = vec![
        CategoryInput::percent("A", 10.0).with_tags(&["dining"]),
        CategoryInput::percent("B", 10.0).with_tags(&["dining"]),
    ];
    let err = b
        .onboard(&RawNumber::from(1000.0), None, &splits)
        .unwrap_err();
    assert!(matches!(
        err,
        BudgetError::Validation(ValidationError::SpendingCategoryConflict(_))
    ));
    assert_eq!(b.categories().len(), 3);
    assert_eq!(b.paycheck().unwrap().amount, dec!(3000));
}

// ── Transactions ──────────────────────────────────────────────

#[test]
fn test_add_transaction_defaults() {
    let b = paid_budget();
    let txn = b
        .add_transaction(&TransactionInput {
            note: Some("  weekly shop ".into()),
            ..TransactionInput::new("essentials", "42.50")
        })
        .unwrap();
    assert_eq!(txn.amount, dec!(42.50));
    assert_eq!(txn.currency, "USD");
    assert_eq!(txn.note.as_deref(), Some("weekly shop"));
    assert_eq!(txn.occurred_at, t0());
    assert!(txn.id.starts_with("txn-"));
}

#[test]
fn test_add_transaction_rejects_bad_input() {
    let b = paid_budget();
    assert!(matches!(
        b.add_transaction(&TransactionInput::new("ghost", 5.0)),
        Err(BudgetError::NotFound { .. })
    ));
    for amount in [RawNumber::from(0.0), RawNumber::from(-1.0), RawNumber::from("x")] {
        let err = b
            .add_transaction(&TransactionInput::new("essentials", amount))
            .unwrap_err();
        assert!(matches!(
            err,
            BudgetError::Validation(ValidationError::InvalidTransactionAmount)
        ));
    }
    assert!(b.transactions(None).is_empty());
}

#[test]
fn test_transactions_newest_first_and_filtered() {
    let b = paid_budget();
    for (day, cat) in [(1, "essentials"), (3, "essentials"), (2, "non-essentials")] {
        b.add_transaction(&TransactionInput {
            occurred_at: Some(Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()),
            ..TransactionInput::new(cat, 1.0)
        })
        .unwrap();
    }
    let days: Vec<u32> = b
        .transactions(None)
        .iter()
        .map(|t| chrono::Datelike::day(&t.occurred_at))
        .collect();
    assert_eq!(days, vec![3, 2, 1]);
    assert_eq!(b.transactions(Some("essentials")).len(), 2);
    assert!(b.transactions(Some("uncategorized")).is_empty());
}

#[test]
fn test_add_transactions_commits_valid_inputs_together() {
    let store = SharedStore::default();
    let b = budget_with(store.clone());
    let results = b
        .add_transactions(&[
            TransactionInput::new("essentials", "40"),
            TransactionInput::new("nope", "10"),
            TransactionInput::new("essentials", "-3"),
            TransactionInput::new("uncategorized", 12.5),
        ])
        .unwrap();

    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(BudgetError::NotFound { .. })));
    assert!(matches!(
        results[2],
        Err(BudgetError::Validation(ValidationError::InvalidTransactionAmount))
    ));
    assert_eq!(results[3].as_ref().unwrap().amount, dec!(12.5));

    let saved = store.state.lock().unwrap().clone().unwrap();
    assert_eq!(saved.transactions.len(), 2);
    assert_eq!(b.transactions(None).len(), 2);
}

#[test]
fn test_add_transactions_failed_save_records_nothing() {
    let store = SharedStore::default();
    let b = budget_with(store.clone());
    *store.fail.lock().unwrap() = true;

    let err = b
        .add_transactions(&[TransactionInput::new("essentials", "40")])
        .unwrap_err();
    assert!(matches!(err, BudgetError::Storage(_)));
    assert!(b.transactions(None).is_empty());
}

#[test]
fn test_delete_transaction() {
    let b = paid_budget();
    let txn = b
        .add_transaction(&TransactionInput::new("essentials", 5.0))
        .unwrap();
    b.delete_transaction(&txn.id).unwrap();
    assert!(b.transactions(None).is_empty());
    assert!(matches!(
        b.delete_transaction(&txn.id),
        Err(BudgetError::NotFound { what: "Transaction", .. })
    ));
}

// ── Summary & alerts ──────────────────────────────────────────

#[test]
fn test_spend_drives_alerts() {
    let b = paid_budget();
    b.add_transaction(&TransactionInput::new("essentials", 1400.0))
        .unwrap();
    let alerts = b.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::NearBudget);

    b.add_transaction(&TransactionInput::new("essentials", 700.0))
        .unwrap();
    let alerts = b.alerts();
    assert_eq!(alerts[0].kind, AlertKind::OverBudget);
    assert!(alerts[0].message.contains("over budget"));
}

#[test]
fn test_summary_reflects_state() {
    let b = paid_budget();
    b.add_transaction(&TransactionInput::new("non-essentials", 600.0))
        .unwrap();
    let summary = b.summary();
    assert_eq!(summary.currency, "USD");
    assert_eq!(summary.allocated_total, dec!(3000));
    assert_eq!(summary.spent_total, dec!(600));
    assert_eq!(summary.budget_used_percent, dec!(20));
    assert_eq!(summary.categories[1].status, BudgetStatus::Warning);
    assert_eq!(b.usage()[1].remaining, dec!(0));
}

#[test]
fn test_reset_restores_defaults() {
    let b = paid_budget();
    b.add_transaction(&TransactionInput::new("essentials", 5.0))
        .unwrap();
    b.reset().unwrap();
    assert!(b.paycheck().is_none());
    assert!(b.transactions(None).is_empty());
    assert_eq!(b.categories(), CategoryRule::defaults());
}

// ── Atomicity ─────────────────────────────────────────────────

#[test]
fn test_failed_save_leaves_state_untouched() {
    let store = SharedStore::default();
    let b = budget_with(store.clone());
    b.set_paycheck(&RawNumber::from(3000.0), None).unwrap();

    *store.fail.lock().unwrap() = true;
    let err = b
        .add_transaction(&TransactionInput::new("essentials", 5.0))
        .unwrap_err();
    assert!(matches!(err, BudgetError::Storage(ref msg) if msg.contains("disk full")));
    assert!(b.transactions(None).is_empty());

    assert!(b.set_paycheck(&RawNumber::from(10.0), None).is_err());
    assert_eq!(b.allocation().unwrap().gross_income, dec!(3000));
}
