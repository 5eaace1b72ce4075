use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::models::normalize_currency;

pub(crate) const DB_ENV: &str = "PAYSPLIT_DB";
pub(crate) const CURRENCY_ENV: &str = "PAYSPLIT_CURRENCY";
pub(crate) const LOG_ENV: &str = "PAYSPLIT_LOG";

const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Runtime settings, resolved once at start-up.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub default_currency: String,
    pub log_filter: String,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        let proj_dirs = directories::ProjectDirs::from("com", "paysplit", "PaySplit")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        Ok(Self::resolve(data_dir, |key| std::env::var(key).ok()))
    }

    /// Build a config from a data directory and an environment lookup.
    pub(crate) fn resolve(data_dir: PathBuf, var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let db_path = non_empty(DB_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("paysplit.db"));
        let default_currency =
            normalize_currency(non_empty(CURRENCY_ENV).as_deref(), DEFAULT_CURRENCY);
        let log_filter = non_empty(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            data_dir,
            db_path,
            default_currency,
            log_filter,
        }
    }

    pub(crate) fn log_path(&self) -> PathBuf {
        self.data_dir.join("paysplit.log")
    }
}
