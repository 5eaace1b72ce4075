mod schema;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::budget::{BudgetState, Store};
use crate::models::*;

const SEEDED_KEY: &str = "seeded";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn is_seeded(&self) -> Result<bool> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM meta WHERE key = ?1)",
            params![SEEDED_KEY],
            |row| row.get(0),
        )?)
    }

    // ── Rules ─────────────────────────────────────────────────

    fn get_rules(&self) -> Result<Vec<CategoryRule>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, kind, value FROM category_rules ORDER BY position")?;
        let rows = stmt.query_map([], |row| {
            let kind: String = row.get(2)?;
            let value = decimal_column(row, 3)?;
            let kind = match kind.as_str() {
                "fixed" => RuleKind::Fixed { amount: value },
                _ => RuleKind::Percent { percent: value },
            };
            Ok(CategoryRule::new(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                kind,
            ))
        })?;
        let mut rules = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare("SELECT rule_id, tag FROM rule_tags")?;
        let tags = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for tag in tags {
            let (rule_id, tag) = tag?;
            let tag = SpendingTag::parse(&tag)
                .ok_or_else(|| anyhow!("Unknown spending category in database: {tag}"))?;
            if let Some(rule) = rules.iter_mut().find(|r| r.id == rule_id) {
                rule.spending_categories.insert(tag);
            }
        }
        Ok(rules)
    }

    // ── Paycheck ──────────────────────────────────────────────

    fn get_paycheck(&self) -> Result<Option<Paycheck>> {
        Ok(self
            .conn
            .query_row(
                "SELECT amount, currency, updated_at FROM paycheck WHERE id = 1",
                [],
                |row| {
                    Ok(Paycheck {
                        amount: decimal_column(row, 0)?,
                        currency: row.get(1)?,
                        updated_at: timestamp_column(row, 2)?,
                    })
                },
            )
            .optional()?)
    }

    // ── Transactions ──────────────────────────────────────────

    fn get_transactions(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category_id, amount, currency, note, occurred_at
             FROM transactions ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Transaction {
                id: row.get(0)?,
                category_id: row.get(1)?,
                amount: decimal_column(row, 2)?,
                currency: row.get(3)?,
                note: row.get(4)?,
                occurred_at: timestamp_column(row, 5)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

impl Store for Database {
    fn load(&mut self) -> Result<Option<BudgetState>> {
        if !self.is_seeded()? {
            return Ok(None);
        }
        let state = BudgetState {
            rules: self.get_rules()?,
            paycheck: self.get_paycheck()?,
            transactions: self.get_transactions()?,
        };
        debug!(
            "loaded {} rules and {} transactions",
            state.rules.len(),
            state.transactions.len()
        );
        Ok(Some(state))
    }

    /// Replace the stored state in a single SQLite transaction.
    fn save(&mut self, state: &BudgetState) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM rule_tags; DELETE FROM category_rules;
             DELETE FROM paycheck; DELETE FROM transactions;",
        )?;

        for (position, rule) in state.rules.iter().enumerate() {
            let value = match rule.kind {
                RuleKind::Fixed { amount } => amount,
                RuleKind::Percent { percent } => percent,
            };
            tx.execute(
                "INSERT INTO category_rules (id, position, name, kind, value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    rule.id,
                    position as i64,
                    rule.name,
                    rule.kind.as_str(),
                    value.to_string(),
                ],
            )?;
            for tag in &rule.spending_categories {
                tx.execute(
                    "INSERT INTO rule_tags (rule_id, tag) VALUES (?1, ?2)",
                    params![rule.id, tag.as_str()],
                )
                .with_context(|| format!("Failed to store tag {tag} for {}", rule.name))?;
            }
        }

        if let Some(paycheck) = &state.paycheck {
            tx.execute(
                "INSERT INTO paycheck (id, amount, currency, updated_at) VALUES (1, ?1, ?2, ?3)",
                params![
                    paycheck.amount.to_string(),
                    paycheck.currency,
                    paycheck.updated_at.to_rfc3339(),
                ],
            )?;
        }

        for txn in &state.transactions {
            tx.execute(
                "INSERT INTO transactions (id, category_id, amount, currency, note, occurred_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    txn.id,
                    txn.category_id,
                    txn.amount.to_string(),
                    txn.currency,
                    txn.note,
                    txn.occurred_at.to_rfc3339(),
                ],
            )?;
        }

        tx.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES (?1, '1')",
            params![SEEDED_KEY],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
