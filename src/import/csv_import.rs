use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::{info, warn};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::budget::{Budget, TransactionInput};
use crate::models::{CategoryRule, RawNumber, SpendingTag, Transaction};

const EXPORT_HEADER: [&str; 7] = [
    "id",
    "category_id",
    "category",
    "amount",
    "currency",
    "note",
    "occurred_at",
];

/// A row that was left out of an import, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SkippedRow {
    /// 1-based line in the file, header included.
    pub(crate) line: usize,
    pub(crate) reason: String,
}

#[derive(Debug, Default)]
pub(crate) struct ImportReport {
    pub(crate) imported: Vec<Transaction>,
    pub(crate) skipped: Vec<SkippedRow>,
}

impl ImportReport {
    fn skip(&mut self, line: usize, reason: String) {
        warn!("skipped CSV line {line}: {reason}");
        self.skipped.push(SkippedRow { line, reason });
    }
}

/// Positions of the recognised columns in the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: Option<usize>,
    category: usize,
    amount: usize,
    currency: Option<usize>,
    note: Option<usize>,
}

impl Columns {
    fn from_header(header: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        Ok(Self {
            date: find("date"),
            category: find("category").context("CSV is missing a 'category' column")?,
            amount: find("amount").context("CSV is missing an 'amount' column")?,
            currency: find("currency"),
            note: find("note").or_else(|| find("notes")),
        })
    }
}

pub(crate) struct CsvImporter;

impl CsvImporter {
    pub(crate) fn import_file(path: &Path, budget: &Budget) -> Result<ImportReport> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
        Self::import(file, budget)
    }

    /// Record every routable row as a spend, committed in one batch. Bad
    /// rows are reported, not fatal.
    pub(crate) fn import<R: Read>(reader: R, budget: &Budget) -> Result<ImportReport> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns = Columns::from_header(rdr.headers().context("Failed to read CSV header")?)?;
        let rules = budget.categories();

        let mut report = ImportReport::default();
        let mut lines = Vec::new();
        let mut inputs = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let line = i + 2;
            let record = result.with_context(|| format!("Failed to read CSV line {line}"))?;
            let field = |idx: Option<usize>| {
                idx.and_then(|c| record.get(c))
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };

            match Self::parse_row(&record, columns, &rules) {
                Ok(input) => {
                    lines.push(line);
                    inputs.push(TransactionInput {
                        currency: field(columns.currency),
                        note: field(columns.note),
                        ..input
                    });
                }
                Err(reason) => report.skip(line, reason),
            }
        }

        let results = budget
            .add_transactions(&inputs)
            .context("Failed to save imported transactions")?;
        for (line, result) in lines.into_iter().zip(results) {
            match result {
                Ok(txn) => report.imported.push(txn),
                Err(e) => report.skip(line, e.to_string()),
            }
        }
        report.skipped.sort_by_key(|s| s.line);

        info!(
            "imported {} transactions, skipped {}",
            report.imported.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn parse_row(
        record: &csv::StringRecord,
        columns: Columns,
        rules: &[CategoryRule],
    ) -> std::result::Result<TransactionInput, String> {
        let key = record.get(columns.category).unwrap_or_default();
        let category_id = route_category(rules, key)
            .ok_or_else(|| format!("no category matches '{key}'"))?;

        let raw_amount = record.get(columns.amount).unwrap_or_default();
        let occurred_at = match columns.date.and_then(|c| record.get(c)) {
            Some(d) if !d.is_empty() => Some(parse_date(d).map_err(|e| e.to_string())?),
            _ => None,
        };

        Ok(TransactionInput {
            occurred_at,
            ..TransactionInput::new(&category_id, RawNumber::from(clean_amount(raw_amount)))
        })
    }

    pub(crate) fn export_file(
        path: &Path,
        transactions: &[Transaction],
        rules: &[CategoryRule],
    ) -> Result<usize> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        Self::export(file, transactions, rules)
    }

    pub(crate) fn export<W: Write>(
        writer: W,
        transactions: &[Transaction],
        rules: &[CategoryRule],
    ) -> Result<usize> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(EXPORT_HEADER)?;
        for txn in transactions {
            let name = CategoryRule::find_by_id(rules, &txn.category_id)
                .map(|r| r.name.as_str())
                .unwrap_or("");
            let amount = format!("{:.2}", txn.amount);
            let occurred_at = txn.occurred_at.to_rfc3339();
            wtr.write_record([
                txn.id.as_str(),
                txn.category_id.as_str(),
                name,
                amount.as_str(),
                txn.currency.as_str(),
                txn.note.as_deref().unwrap_or(""),
                occurred_at.as_str(),
            ])?;
        }
        wtr.flush().context("Failed to write CSV")?;
        Ok(transactions.len())
    }
}

/// Match a rule by id, then by name, then by an owned spending tag.
pub(crate) fn route_category(rules: &[CategoryRule], key: &str) -> Option<String> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    CategoryRule::find_by_id(rules, key)
        .or_else(|| CategoryRule::find_by_name(rules, key))
        .or_else(|| SpendingTag::parse(key).and_then(|tag| CategoryRule::find_by_tag(rules, tag)))
        .map(|r| r.id.clone())
}

fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    for fmt in &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.and_time(NaiveTime::MIN).and_utc());
        }
    }
    anyhow::bail!("Could not parse date: {}", s)
}

/// Strip currency symbols and thousands separators.
fn clean_amount(s: &str) -> String {
    s.replace(['$', ',', '"'], "").trim().to_string()
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
