//! The budget service: one state container, one lock.
//!
//! Every mutation builds a candidate state, recomputes the allocation from
//! it, persists it, and only then swaps it in. Readers take the same lock,
//! so a rule change is never observed next to a stale allocation.

mod collaborators;

pub(crate) use collaborators::{
    slugify, Clock, IdGenerator, MemoryStore, SlugIds, Store, SystemClock,
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::{Mutex, MutexGuard};

use crate::allocate::allocate;
use crate::error::{AllocationError, BudgetError, BudgetResult, ValidationError};
use crate::models::{
    normalize_currency, Alert, Allocation, CategoryRule, Paycheck, RawNumber, Transaction,
};
use crate::rules::{
    check_percent_ceiling, check_spending_category_conflicts, normalize_rules, parse_rule,
    validate_rule_set, CategoryInput,
};
use crate::usage::{self, CategoryUsage, Summary};

/// Everything the budget persists.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BudgetState {
    pub rules: Vec<CategoryRule>,
    pub paycheck: Option<Paycheck>,
    pub transactions: Vec<Transaction>,
}

impl BudgetState {
    /// Default rules, no paycheck, no transactions.
    pub(crate) fn fresh() -> Self {
        Self {
            rules: CategoryRule::defaults(),
            paycheck: None,
            transactions: Vec::new(),
        }
    }
}

/// Raw transaction data as a caller supplied it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TransactionInput {
    pub category_id: String,
    pub amount: RawNumber,
    pub currency: Option<String>,
    pub note: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TransactionInput {
    pub(crate) fn new(category_id: &str, amount: impl Into<RawNumber>) -> Self {
        Self {
            category_id: category_id.to_string(),
            amount: amount.into(),
            currency: None,
            note: None,
            occurred_at: None,
        }
    }
}

struct Inner {
    state: BudgetState,
    allocation: Option<Allocation>,
    store: Box<dyn Store>,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

pub(crate) struct Budget {
    inner: Mutex<Inner>,
    default_currency: String,
}

impl Budget {
    /// Load state from `store`, seeding the default rule set when empty.
    pub(crate) fn open(
        mut store: Box<dyn Store>,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdGenerator>,
        default_currency: &str,
    ) -> Result<Self> {
        let state = match store.load()? {
            Some(state) => state,
            None => {
                let fresh = BudgetState::fresh();
                store.save(&fresh)?;
                info!("seeded default budget categories");
                fresh
            }
        };

        let allocation = match compute_allocation(&state) {
            Ok(a) => a,
            Err(e) => {
                warn!("stored budget cannot be allocated: {e}");
                None
            }
        };

        Ok(Self {
            inner: Mutex::new(Inner {
                state,
                allocation,
                store,
                clock,
                ids,
            }),
            default_currency: normalize_currency(Some(default_currency), "USD"),
        })
    }

    /// A budget backed by a process-local store.
    pub(crate) fn in_memory(default_currency: &str) -> Result<Self> {
        Self::open(
            Box::new(MemoryStore::default()),
            Box::new(SystemClock),
            Box::new(SlugIds),
            default_currency,
        )
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn categories(&self) -> Vec<CategoryRule> {
        self.lock().state.rules.clone()
    }

    pub(crate) fn create_category(&self, input: &CategoryInput) -> BudgetResult<CategoryRule> {
        let mut inner = self.lock();
        let mut rule = parse_rule(input, None).inspect_err(|e| warn!("rejected category: {e}"))?;
        check_rule_fits(&inner.state.rules, &rule, None)?;

        rule.id = inner.ids.rule_id(&rule.name);
        let mut next = inner.state.clone();
        next.rules.push(rule.clone());
        commit(&mut inner, next)?;

        info!("created category {} ({})", rule.name, rule.id);
        Ok(rule)
    }

    pub(crate) fn update_category(
        &self,
        id: &str,
        input: &CategoryInput,
    ) -> BudgetResult<CategoryRule> {
        let mut inner = self.lock();
        let index = inner
            .state
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| BudgetError::category_not_found(id))?;

        let current = &inner.state.rules[index];
        let rule = parse_rule(input, Some(current))
            .inspect_err(|e| warn!("rejected update of {id}: {e}"))?;
        check_rule_fits(&inner.state.rules, &rule, Some(id))?;

        let mut next = inner.state.clone();
        next.rules[index] = rule.clone();
        commit(&mut inner, next)?;

        info!("updated category {} ({})", rule.name, rule.id);
        Ok(rule)
    }

    pub(crate) fn delete_category(&self, id: &str) -> BudgetResult<()> {
        let mut inner = self.lock();
        if CategoryRule::find_by_id(&inner.state.rules, id).is_none() {
            return Err(BudgetError::category_not_found(id));
        }

        let mut next = inner.state.clone();
        next.rules.retain(|r| r.id != id);
        commit(&mut inner, next)?;

        info!("deleted category {id}");
        Ok(())
    }

    // ── Paycheck & allocation ─────────────────────────────────

    pub(crate) fn paycheck(&self) -> Option<Paycheck> {
        self.lock().state.paycheck.clone()
    }

    /// The committed allocation, `None` until a paycheck is set.
    pub(crate) fn allocation(&self) -> Option<Allocation> {
        self.lock().allocation.clone()
    }

    pub(crate) fn set_paycheck(
        &self,
        amount: &RawNumber,
        currency: Option<&str>,
    ) -> BudgetResult<Paycheck> {
        let mut inner = self.lock();
        let amount = amount.to_decimal().ok_or(AllocationError::InvalidAmount)?;
        let fallback = self.currency_of(&inner.state);
        let paycheck = Paycheck {
            amount,
            currency: normalize_currency(currency, &fallback),
            updated_at: inner.clock.now(),
        };

        let mut next = inner.state.clone();
        next.paycheck = Some(paycheck.clone());
        commit(&mut inner, next).inspect_err(|e| warn!("rejected paycheck: {e}"))?;

        info!("paycheck set to {} {}", paycheck.amount, paycheck.currency);
        Ok(paycheck)
    }

    /// Compute an allocation without committing anything. An empty or
    /// missing `rules` override uses the active rule set.
    pub(crate) fn preview_allocation(
        &self,
        amount: &RawNumber,
        currency: Option<&str>,
        rules: Option<&[CategoryInput]>,
    ) -> BudgetResult<Allocation> {
        let mut inner = self.lock();
        let amount = amount.to_decimal().ok_or(AllocationError::InvalidAmount)?;
        let currency = normalize_currency(currency, &self.currency_of(&inner.state));

        let allocation = match rules {
            Some(inputs) if !inputs.is_empty() => {
                let ids = &mut inner.ids;
                let normalized = normalize_rules(inputs, |name| ids.rule_id(name))?;
                allocate(amount, &normalized, &currency)?
            }
            _ => allocate(amount, &inner.state.rules, &currency)?,
        };
        Ok(allocation)
    }

    /// Replace the paycheck and the whole rule set in one step, starting
    /// with an empty transaction log.
    pub(crate) fn onboard(
        &self,
        amount: &RawNumber,
        currency: Option<&str>,
        splits: &[CategoryInput],
    ) -> BudgetResult<Allocation> {
        let mut inner = self.lock();
        let amount = amount.to_decimal().ok_or(AllocationError::InvalidAmount)?;
        let currency = normalize_currency(currency, &self.default_currency);

        let ids = &mut inner.ids;
        let rules = normalize_rules(splits, |name| ids.rule_id(name))?;
        validate_rule_set(&rules)?;

        let next = BudgetState {
            rules,
            paycheck: Some(Paycheck {
                amount,
                currency,
                updated_at: inner.clock.now(),
            }),
            transactions: Vec::new(),
        };
        commit(&mut inner, next).inspect_err(|e| warn!("rejected onboarding: {e}"))?;

        info!("onboarded with {} categories", inner.state.rules.len());
        inner
            .allocation
            .clone()
            .ok_or(BudgetError::Allocation(AllocationError::InvalidAmount))
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn add_transaction(&self, input: &TransactionInput) -> BudgetResult<Transaction> {
        let mut inner = self.lock();
        let txn = self.build_transaction(&mut inner, input)?;

        let mut next = inner.state.clone();
        next.transactions.push(txn.clone());
        commit(&mut inner, next)?;

        debug!("recorded {} against {}", txn.amount, txn.category_id);
        Ok(txn)
    }

    /// Record many spends with a single save. Each input is validated on
    /// its own and gets its own result, in order; the valid ones are
    /// committed together. The outer error means nothing was recorded.
    pub(crate) fn add_transactions(
        &self,
        inputs: &[TransactionInput],
    ) -> BudgetResult<Vec<BudgetResult<Transaction>>> {
        let mut inner = self.lock();
        let results: Vec<BudgetResult<Transaction>> = inputs
            .iter()
            .map(|input| self.build_transaction(&mut inner, input))
            .collect();

        let mut next = inner.state.clone();
        next.transactions
            .extend(results.iter().filter_map(|r| r.as_ref().ok()).cloned());
        let added = next.transactions.len() - inner.state.transactions.len();
        if added > 0 {
            commit(&mut inner, next)?;
            info!("recorded {added} transactions in one batch");
        }
        Ok(results)
    }

    fn build_transaction(
        &self,
        inner: &mut Inner,
        input: &TransactionInput,
    ) -> BudgetResult<Transaction> {
        if CategoryRule::find_by_id(&inner.state.rules, &input.category_id).is_none() {
            return Err(BudgetError::category_not_found(&input.category_id));
        }
        let amount = input
            .amount
            .to_decimal()
            .filter(|a| *a > rust_decimal::Decimal::ZERO)
            .ok_or(ValidationError::InvalidTransactionAmount)?;

        let fallback = self.currency_of(&inner.state);
        Ok(Transaction {
            id: inner.ids.transaction_id(),
            category_id: input.category_id.clone(),
            amount,
            currency: normalize_currency(input.currency.as_deref(), &fallback),
            note: input
                .note
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            occurred_at: input.occurred_at.unwrap_or_else(|| inner.clock.now()),
        })
    }

    /// Transactions newest first, optionally for one category.
    pub(crate) fn transactions(&self, category_id: Option<&str>) -> Vec<Transaction> {
        let inner = self.lock();
        let mut txns: Vec<Transaction> = inner
            .state
            .transactions
            .iter()
            .filter(|t| category_id.is_none_or(|c| t.belongs_to(c)))
            .cloned()
            .collect();
        txns.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        txns
    }

    /// Dev tooling only; the budget itself treats the log as append-only.
    pub(crate) fn delete_transaction(&self, id: &str) -> BudgetResult<()> {
        let mut inner = self.lock();
        if !inner.state.transactions.iter().any(|t| t.id == id) {
            return Err(BudgetError::transaction_not_found(id));
        }
        let mut next = inner.state.clone();
        next.transactions.retain(|t| t.id != id);
        commit(&mut inner, next)?;
        info!("deleted transaction {id}");
        Ok(())
    }

    /// Dev tooling: back to the default rules with no paycheck or spend.
    pub(crate) fn reset(&self) -> BudgetResult<()> {
        let mut inner = self.lock();
        commit(&mut inner, BudgetState::fresh())?;
        info!("budget reset to defaults");
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub(crate) fn usage(&self) -> Vec<CategoryUsage> {
        let inner = self.lock();
        usage::usage_by_category(
            &inner.state.rules,
            inner.allocation.as_ref(),
            &inner.state.transactions,
        )
    }

    pub(crate) fn alerts(&self) -> Vec<Alert> {
        self.summary().alerts
    }

    pub(crate) fn summary(&self) -> Summary {
        let inner = self.lock();
        let categories = usage::usage_by_category(
            &inner.state.rules,
            inner.allocation.as_ref(),
            &inner.state.transactions,
        );
        usage::summarize(
            &self.currency_of(&inner.state),
            inner.state.paycheck.as_ref(),
            inner.allocation.as_ref(),
            categories,
            inner.clock.now(),
        )
    }

    pub(crate) fn default_currency(&self) -> &str {
        &self.default_currency
    }

    fn currency_of(&self, state: &BudgetState) -> String {
        state
            .paycheck
            .as_ref()
            .map(|p| p.currency.clone())
            .unwrap_or_else(|| self.default_currency.clone())
    }
}

/// Percent ceiling and tag exclusivity for a rule entering the active set.
fn check_rule_fits(
    active: &[CategoryRule],
    rule: &CategoryRule,
    exclude_id: Option<&str>,
) -> Result<(), ValidationError> {
    if !check_percent_ceiling(active, rule.kind.percent(), exclude_id) {
        warn!("rejected {}: percentage ceiling", rule.name);
        return Err(ValidationError::PercentageCeilingExceeded);
    }
    let conflicts = check_spending_category_conflicts(active, &rule.spending_categories, exclude_id);
    if !conflicts.is_empty() {
        warn!("rejected {}: {} tag conflict(s)", rule.name, conflicts.len());
        return Err(ValidationError::SpendingCategoryConflict(conflicts));
    }
    Ok(())
}

fn compute_allocation(state: &BudgetState) -> Result<Option<Allocation>, AllocationError> {
    state
        .paycheck
        .as_ref()
        .map(|p| allocate(p.amount, &state.rules, &p.currency))
        .transpose()
}

/// Recompute, persist, then publish `next`. Any failure leaves `inner` as it was.
fn commit(inner: &mut Inner, next: BudgetState) -> BudgetResult<()> {
    let allocation = compute_allocation(&next)?;
    inner
        .store
        .save(&next)
        .map_err(|e| BudgetError::Storage(format!("{e:#}")))?;
    inner.state = next;
    inner.allocation = allocation;
    debug!(
        "recomputed allocation: {}",
        inner
            .allocation
            .as_ref()
            .map(|a| format!("{} allocated, {} leftover", a.total_allocated, a.leftover))
            .unwrap_or_else(|| "no paycheck".into())
    );
    Ok(())
}

#[cfg(test)]
mod tests;
