use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

use super::BudgetState;

pub(crate) trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of rule and transaction ids. Ids must be unique within the active
/// rule set and transaction log; avoiding collisions is the generator's job.
pub(crate) trait IdGenerator: Send {
    fn rule_id(&mut self, name: &str) -> String;
    fn transaction_id(&mut self) -> String;
}

static NON_SLUG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").ok());

/// Lower-case `name` and collapse every run of other characters into `-`.
pub(crate) fn slugify(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let slug = match NON_SLUG.as_ref() {
        Some(re) => re.replace_all(&lower, "-").into_owned(),
        None => lower,
    };
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "cat".to_string()
    } else {
        slug.to_string()
    }
}

/// `<slug>-<random hex>` rule ids and `txn-<random hex>` transaction ids.
pub(crate) struct SlugIds;

impl IdGenerator for SlugIds {
    fn rule_id(&mut self, name: &str) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", slugify(name), &suffix[..8])
    }

    fn transaction_id(&mut self) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("txn-{}", &suffix[..12])
    }
}

/// Where committed budget state is kept between runs.
///
/// `save` is called with the complete candidate state before it becomes
/// visible; an error aborts the operation.
pub(crate) trait Store: Send {
    fn load(&mut self) -> Result<Option<BudgetState>>;
    fn save(&mut self, state: &BudgetState) -> Result<()>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Option<BudgetState>,
}

impl Store for MemoryStore {
    fn load(&mut self) -> Result<Option<BudgetState>> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &BudgetState) -> Result<()> {
        self.state = Some(state.clone());
        Ok(())
    }
}
