use anyhow::{Context, Result};
use std::path::Path;

use crate::budget::{Budget, TransactionInput};
use crate::import::{route_category, CsvImporter};
use crate::models::{Allocation, RawNumber};
use crate::rules::CategoryInput;
use crate::ui::commands::shellexpand;
use crate::ui::util::format_amount;

pub(crate) fn as_cli(args: &[String], budget: &Budget) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "summary" | "s" => cli_summary(rest, budget),
        "alerts" => cli_alerts(rest, budget),
        "categories" => cli_categories(budget),
        "paycheck" => cli_paycheck(rest, budget),
        "add-category" => cli_add_category(rest, budget),
        "update-category" => cli_update_category(rest, budget),
        "delete-category" => cli_delete_category(rest, budget),
        "spend" => cli_spend(rest, budget),
        "transactions" => cli_transactions(rest, budget),
        "preview" => cli_preview(rest, budget),
        "onboard" => cli_onboard(rest, budget),
        "import" => cli_import(rest, budget),
        "export" => cli_export(rest, budget),
        "reset" => {
            budget.reset()?;
            println!("Budget reset to the default categories.");
            Ok(())
        }
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("paysplit {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("PaySplit: split each paycheck across budget categories");
    println!();
    println!("Usage: paysplit [command]");
    println!();
    println!("Commands:");
    println!("  (none)                              Launch interactive TUI");
    println!("  summary [--json]                    Print paycheck, totals and usage");
    println!("  alerts [--json]                     List near and over budget categories");
    println!("  categories                          List category rules");
    println!("  paycheck <amount> [currency]        Set the current paycheck");
    println!("  add-category <name> fixed|percent <value> [--tags a,b]");
    println!("  update-category <id> [--name N] [--kind K] [--value V] [--tags a,b]");
    println!("  delete-category <id>                Remove a category");
    println!("  spend <category> <amount> [note]    Record spending (id, name or tag)");
    println!("  transactions [category]             List spending, newest first");
    println!("  preview <amount> [currency]         Show a split without saving it");
    println!("  onboard <amount> <currency> <name=percent>...");
    println!("                                      Replace paycheck and categories");
    println!("  import <file.csv>                   Import spending from CSV");
    println!("  export [path]                       Export spending to CSV");
    println!("  reset                               Restore default categories");
    println!("  --help, -h                          Show this help");
    println!("  --version, -V                       Show version");
}

// ── Reports ──────────────────────────────────────────────────

fn cli_summary(args: &[String], budget: &Budget) -> Result<()> {
    let summary = budget.summary();
    if has_flag(args, "--json") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let cur = summary.currency.as_str();
    match &summary.paycheck {
        Some(p) => println!(
            "Paycheck:    {} (updated {})",
            format_amount(p.amount, &p.currency),
            p.updated_at.format("%Y-%m-%d")
        ),
        None => println!("Paycheck:    not set"),
    }
    println!("Allocated:   {}", format_amount(summary.allocated_total, cur));
    println!("Unallocated: {}", format_amount(summary.unallocated, cur));
    println!(
        "Spent:       {} ({}%)",
        format_amount(summary.spent_total, cur),
        summary.budget_used_percent
    );
    println!("Left:        {}", format_amount(summary.leftover_budget, cur));
    println!();
    println!(
        "{:<24} {:>14} {:>14} {:>14}  Status",
        "Category", "Allocated", "Spent", "Remaining"
    );
    println!("{}", "─".repeat(80));
    for c in &summary.categories {
        println!(
            "{:<24} {:>14} {:>14} {:>14}  {}",
            c.name(),
            format_amount(c.allocated, cur),
            format_amount(c.spent, cur),
            format_amount(c.remaining, cur),
            c.status
        );
    }
    if !summary.alerts.is_empty() {
        println!();
        println!("{} alert(s); run `paysplit alerts` for details", summary.alerts.len());
    }
    Ok(())
}

fn cli_alerts(args: &[String], budget: &Budget) -> Result<()> {
    let alerts = budget.alerts();
    if has_flag(args, "--json") {
        println!("{}", serde_json::to_string_pretty(&alerts)?);
        return Ok(());
    }
    if alerts.is_empty() {
        println!("No alerts.");
        return Ok(());
    }
    for alert in &alerts {
        println!(
            "[{}] {:>4}%  {}",
            alert.severity.to_string().to_uppercase(),
            alert.percent_used,
            alert.message
        );
    }
    Ok(())
}

fn cli_categories(budget: &Budget) -> Result<()> {
    let rules = budget.categories();
    if rules.is_empty() {
        println!("No categories. Add one with `paysplit add-category`.");
        return Ok(());
    }
    println!("{:<24} {:<24} {:<16} Tags", "ID", "Name", "Rule");
    println!("{}", "─".repeat(80));
    for rule in &rules {
        let tags: Vec<&str> = rule.spending_categories.iter().map(|t| t.as_str()).collect();
        println!(
            "{:<24} {:<24} {:<16} {}",
            rule.id,
            rule.name,
            rule.kind.to_string(),
            tags.join(",")
        );
    }
    Ok(())
}

fn cli_transactions(args: &[String], budget: &Budget) -> Result<()> {
    let rules = budget.categories();
    let filter = match args.first() {
        Some(key) => Some(
            route_category(&rules, key)
                .ok_or_else(|| anyhow::anyhow!("No category matches '{key}'"))?,
        ),
        None => None,
    };

    let txns = budget.transactions(filter.as_deref());
    if txns.is_empty() {
        println!("No transactions.");
        return Ok(());
    }
    for txn in &txns {
        let name = rules
            .iter()
            .find(|r| r.id == txn.category_id)
            .map(|r| r.name.as_str())
            .unwrap_or("(deleted)");
        println!(
            "{}  {:<20} {:>14}  {}  [{}]",
            txn.occurred_at.format("%Y-%m-%d"),
            name,
            format_amount(txn.amount, &txn.currency),
            txn.note.as_deref().unwrap_or(""),
            txn.id
        );
    }
    Ok(())
}

// ── Paycheck ─────────────────────────────────────────────────

fn cli_paycheck(args: &[String], budget: &Budget) -> Result<()> {
    let Some(amount) = args.first() else {
        anyhow::bail!("Usage: paysplit paycheck <amount> [currency]");
    };
    let paycheck = budget.set_paycheck(&RawNumber::from(amount.as_str()), arg(args, 1))?;
    println!(
        "Paycheck set to {}",
        format_amount(paycheck.amount, &paycheck.currency)
    );
    if let Some(allocation) = budget.allocation() {
        print_allocation(&allocation);
    }
    Ok(())
}

fn cli_preview(args: &[String], budget: &Budget) -> Result<()> {
    let Some(amount) = args.first() else {
        anyhow::bail!("Usage: paysplit preview <amount> [currency]");
    };
    let allocation =
        budget.preview_allocation(&RawNumber::from(amount.as_str()), arg(args, 1), None)?;
    print_allocation(&allocation);
    Ok(())
}

fn cli_onboard(args: &[String], budget: &Budget) -> Result<()> {
    if args.len() < 3 {
        anyhow::bail!("Usage: paysplit onboard <amount> <currency> <name=percent>...");
    }
    let splits = args[2..]
        .iter()
        .map(|s| parse_split(s))
        .collect::<Result<Vec<_>>>()?;
    let allocation = budget.onboard(
        &RawNumber::from(args[0].as_str()),
        Some(args[1].as_str()),
        &splits,
    )?;
    println!("Onboarded {} categories.", splits.len());
    print_allocation(&allocation);
    Ok(())
}

fn print_allocation(allocation: &Allocation) {
    let cur = allocation.currency.as_str();
    println!();
    for line in &allocation.allocations {
        println!(
            "  {:<24} {:<14} {:>14}",
            line.name,
            line.rule.to_string(),
            format_amount(line.allocated, cur)
        );
    }
    println!("  {}", "─".repeat(54));
    println!(
        "  {:<39}{:>14}",
        "Fixed",
        format_amount(allocation.fixed_total, cur)
    );
    println!(
        "  {:<39}{:>14}",
        format!("Percent ({}%)", allocation.percentage_total),
        format_amount(allocation.variable_total, cur)
    );
    println!(
        "  {:<39}{:>14}",
        "Unallocated",
        format_amount(allocation.leftover, cur)
    );
}

// ── Categories ───────────────────────────────────────────────

fn cli_add_category(args: &[String], budget: &Budget) -> Result<()> {
    let pos = positionals(args);
    let Some(kind_pos) = pos
        .iter()
        .rposition(|p| matches!(*p, "fixed" | "percent"))
        .filter(|&i| i > 0 && i + 1 < pos.len())
    else {
        anyhow::bail!("Usage: paysplit add-category <name> fixed|percent <value> [--tags a,b]");
    };

    let name = pos[..kind_pos].join(" ");
    let value = pos[kind_pos + 1];
    let mut input = match pos[kind_pos] {
        "fixed" => CategoryInput::fixed(&name, value),
        _ => CategoryInput::percent(&name, value),
    };
    input.spending_categories = flag_value(args, "--tags").map(split_tags);

    let rule = budget.create_category(&input)?;
    println!("Created {} ({}): {}", rule.name, rule.id, rule.kind);
    Ok(())
}

fn cli_update_category(args: &[String], budget: &Budget) -> Result<()> {
    let Some(id) = args.first().filter(|a| !a.starts_with("--")) else {
        anyhow::bail!(
            "Usage: paysplit update-category <id> [--name N] [--kind K] [--value V] [--tags a,b]"
        );
    };

    let value = flag_value(args, "--value").map(RawNumber::from);
    let input = CategoryInput {
        name: flag_value(args, "--name").map(str::to_string),
        kind: flag_value(args, "--kind").map(str::to_string),
        // The parser reads whichever field matches the resulting kind.
        amount: value.clone(),
        percent: value,
        spending_categories: flag_value(args, "--tags").map(split_tags),
    };

    let rule = budget.update_category(id, &input)?;
    println!("Updated {} ({}): {}", rule.name, rule.id, rule.kind);
    Ok(())
}

fn cli_delete_category(args: &[String], budget: &Budget) -> Result<()> {
    let Some(id) = args.first() else {
        anyhow::bail!("Usage: paysplit delete-category <id>");
    };
    budget.delete_category(id)?;
    println!("Deleted category {id}");
    Ok(())
}

// ── Spending ─────────────────────────────────────────────────

fn cli_spend(args: &[String], budget: &Budget) -> Result<()> {
    let (Some(key), Some(amount)) = (args.first(), args.get(1)) else {
        anyhow::bail!("Usage: paysplit spend <category> <amount> [note]");
    };
    let category_id = route_category(&budget.categories(), key)
        .ok_or_else(|| anyhow::anyhow!("No category matches '{key}'"))?;

    let note = (args.len() > 2).then(|| args[2..].join(" "));
    let input = TransactionInput {
        note,
        ..TransactionInput::new(&category_id, amount.as_str())
    };
    let txn = budget.add_transaction(&input)?;
    println!(
        "Recorded {} against {}",
        format_amount(txn.amount, &txn.currency),
        txn.category_id
    );

    for alert in budget
        .alerts()
        .iter()
        .filter(|a| a.category_id == txn.category_id)
    {
        println!("{}", alert.message);
    }
    Ok(())
}

fn cli_import(args: &[String], budget: &Budget) -> Result<()> {
    let Some(file_path) = args.first() else {
        anyhow::bail!("Usage: paysplit import <file.csv>");
    };
    let expanded = shellexpand(file_path);
    let path = Path::new(&expanded);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }

    let report = CsvImporter::import_file(path, budget)?;
    for skipped in &report.skipped {
        println!("  line {}: {}", skipped.line, skipped.reason);
    }
    println!(
        "Imported {} transactions, skipped {}",
        report.imported.len(),
        report.skipped.len()
    );
    Ok(())
}

fn cli_export(args: &[String], budget: &Budget) -> Result<()> {
    let output = match args.first() {
        Some(p) => shellexpand(p),
        None => format!("paysplit_{}.csv", chrono::Local::now().format("%Y-%m-%d")),
    };

    let count = CsvImporter::export_file(
        Path::new(&output),
        &budget.transactions(None),
        &budget.categories(),
    )
    .with_context(|| format!("Failed to export to {output}"))?;
    println!("Exported {count} transactions to {output}");
    Ok(())
}

// ── Argument helpers ─────────────────────────────────────────

fn arg(args: &[String], index: usize) -> Option<&str> {
    args.get(index).map(String::as_str)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither `--flag` nor a flag's value.
fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(a) = iter.next() {
        if a.starts_with("--") {
            iter.next();
        } else {
            out.push(a.as_str());
        }
    }
    out
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// `Name=30` becomes a 30% rule named `Name`.
fn parse_split(raw: &str) -> Result<CategoryInput> {
    let (name, percent) = raw
        .rsplit_once('=')
        .filter(|(n, p)| !n.trim().is_empty() && !p.trim().is_empty())
        .with_context(|| format!("Expected name=percent, got '{raw}'"))?;
    Ok(CategoryInput::percent(name.trim(), percent.trim()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use rust_decimal_macros::dec;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_flag_value_and_positionals() {
        let a = args("Date Night percent 5 --tags dining,entertainment");
        assert_eq!(flag_value(&a, "--tags"), Some("dining,entertainment"));
        assert_eq!(flag_value(&a, "--name"), None);
        assert_eq!(positionals(&a), vec!["Date", "Night", "percent", "5"]);
        assert!(has_flag(&args("--json"), "--json"));
    }

    #[test]
    fn test_split_tags_drops_blanks() {
        assert_eq!(split_tags("rent, utilities,,"), vec!["rent", "utilities"]);
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn test_parse_split() {
        let input = parse_split("Needs=50").unwrap();
        assert_eq!(input.name.as_deref(), Some("Needs"));
        assert_eq!(input.kind.as_deref(), Some("percent"));
        assert!(parse_split("Needs").is_err());
        assert!(parse_split("=50").is_err());
    }

    #[test]
    fn test_add_and_update_category() {
        let budget = Budget::in_memory("USD").unwrap();
        budget.reset().unwrap();
        let before = budget.categories().len();

        cli_add_category(&args("Gym fixed 40 --tags health"), &budget).unwrap();
        let rules = budget.categories();
        assert_eq!(rules.len(), before + 1);
        let gym = rules.iter().find(|r| r.name == "Gym").unwrap();
        assert_eq!(gym.kind.fixed_amount(), dec!(40));

        let mut update = vec![gym.id.clone()];
        update.extend(args("--value 55.5"));
        cli_update_category(&update, &budget).unwrap();
        let gym = budget
            .categories()
            .into_iter()
            .find(|r| r.name == "Gym")
            .unwrap();
        assert_eq!(gym.kind.fixed_amount(), dec!(55.50));
    }

    #[test]
    fn test_spend_routes_by_name() {
        let budget = Budget::in_memory("USD").unwrap();
        budget.set_paycheck(&"2000".into(), None).unwrap();
        let name = budget.categories()[0].name.clone();
        let mut a = vec![name];
        a.extend(args("12.50 coffee beans"));
        cli_spend(&a, &budget).unwrap();

        let txns = budget.transactions(None);
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].note.as_deref(), Some("coffee beans"));
    }

    #[test]
    fn test_onboard_replaces_rules() {
        let budget = Budget::in_memory("USD").unwrap();
        cli_onboard(&args("4000 eur Needs=50 Wants=30 Savings=20"), &budget).unwrap();
        let names: Vec<String> = budget.categories().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Needs", "Wants", "Savings"]);
        assert_eq!(budget.paycheck().unwrap().currency, "EUR");
    }

    #[test]
    fn test_unknown_command_errors() {
        let budget = Budget::in_memory("USD").unwrap();
        assert!(as_cli(&args("paysplit frobnicate"), &budget).is_err());
    }
}
