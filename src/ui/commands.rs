use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use super::app::{App, PendingAction, Screen};
use crate::budget::{Budget, TransactionInput};
use crate::import::{route_category, CsvImporter};
use crate::models::RawNumber;
use crate::rules::CategoryInput;

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &Budget) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit PaySplit", cmd_quit, r);
    register_command!("quit", "Quit PaySplit", cmd_quit, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("c", "Go to Categories", cmd_categories, r);
    register_command!("categories", "Go to Categories", cmd_categories, r);
    register_command!("t", "Go to Transactions", cmd_transactions, r);
    register_command!("transactions", "Go to Transactions", cmd_transactions, r);
    register_command!("a", "Go to Alerts", cmd_alerts, r);
    register_command!("alerts", "Go to Alerts", cmd_alerts, r);
    register_command!(
        "paycheck",
        "Set paycheck (e.g. :paycheck 3000 USD)",
        cmd_paycheck,
        r
    );
    register_command!("p", "Set paycheck (e.g. :p 3000)", cmd_paycheck, r);
    register_command!(
        "spend",
        "Record spending (e.g. :spend groceries 42.50 weekly shop)",
        cmd_spend,
        r
    );
    register_command!("s", "Record spending (e.g. :s rent 900)", cmd_spend, r);
    register_command!(
        "category",
        "Create category (e.g. :category Rent fixed 900 rent,utilities)",
        cmd_category,
        r
    );
    register_command!(
        "delete-category",
        "Delete selected category",
        cmd_delete_category,
        r
    );
    register_command!(
        "delete-txn",
        "Delete selected transaction",
        cmd_delete_txn,
        r
    );
    register_command!(
        "import",
        "Import spending from CSV (e.g. :import ~/spend.csv)",
        cmd_import,
        r
    );
    register_command!(
        "export",
        "Export transactions to CSV (e.g. :export ~/spend.csv)",
        cmd_export,
        r
    );

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, budget: &Budget) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, budget)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1)
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Expand a leading `~/` to the home directory.
pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _budget: &Budget) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _budget: &Budget) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, budget: &Budget) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    app.refresh_all(budget);
    Ok(())
}

fn cmd_categories(_args: &str, app: &mut App, budget: &Budget) -> anyhow::Result<()> {
    app.screen = Screen::Categories;
    app.refresh_all(budget);
    Ok(())
}

fn cmd_transactions(_args: &str, app: &mut App, budget: &Budget) -> anyhow::Result<()> {
    app.screen = Screen::Transactions;
    app.refresh_all(budget);
    Ok(())
}

fn cmd_alerts(_args: &str, app: &mut App, budget: &Budget) -> anyhow::Result<()> {
    app.screen = Screen::Alerts;
    app.refresh_all(budget);
    Ok(())
}

fn cmd_paycheck(args: &str, app: &mut App, budget: &Budget) -> anyhow::Result<()> {
    let mut parts = args.split_whitespace();
    let Some(amount) = parts.next() else {
        app.set_status("Usage: :paycheck <amount> [currency]");
        return Ok(());
    };
    let currency = parts.next();

    match budget.set_paycheck(&RawNumber::from(amount), currency) {
        Ok(paycheck) => {
            app.refresh_all(budget);
            app.set_status(format!(
                "Paycheck set to {} {:.2}",
                paycheck.currency, paycheck.amount
            ));
        }
        Err(e) => app.set_status(e.to_string()),
    }
    Ok(())
}

fn cmd_spend(args: &str, app: &mut App, budget: &Budget) -> anyhow::Result<()> {
    let mut parts = args.splitn(3, ' ');
    let (Some(category), Some(amount)) = (parts.next(), parts.next()) else {
        app.set_status("Usage: :spend <category> <amount> [note]");
        return Ok(());
    };
    let note = parts.next().map(str::to_string);

    let Some(category_id) = route_category(&budget.categories(), category) else {
        app.set_status(format!("No category matches '{category}'"));
        return Ok(());
    };

    let input = TransactionInput {
        note,
        ..TransactionInput::new(&category_id, amount)
    };
    match budget.add_transaction(&input) {
        Ok(txn) => {
            app.refresh_all(budget);
            let name = app.category_name(&txn.category_id).unwrap_or("?").to_string();
            app.set_status(format!("Recorded {:.2} against {name}", txn.amount));
        }
        Err(e) => app.set_status(e.to_string()),
    }
    Ok(())
}

fn cmd_category(args: &str, app: &mut App, budget: &Budget) -> anyhow::Result<()> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() < 3 {
        app.set_status("Usage: :category <name> fixed|percent <value> [tag,tag]");
        return Ok(());
    }

    // Name may contain spaces: find the kind keyword from the right.
    let Some(kind_pos) = parts
        .iter()
        .rposition(|p| matches!(*p, "fixed" | "percent"))
        .filter(|&i| i > 0 && i + 1 < parts.len())
    else {
        app.set_status("Category type must be either \"fixed\" or \"percent\".");
        return Ok(());
    };

    let name = parts[..kind_pos].join(" ");
    let value = parts[kind_pos + 1];
    let mut input = match parts[kind_pos] {
        "fixed" => CategoryInput::fixed(&name, value),
        _ => CategoryInput::percent(&name, value),
    };
    if let Some(tags) = parts.get(kind_pos + 2) {
        let tags: Vec<&str> = tags.split(',').filter(|t| !t.is_empty()).collect();
        input = input.with_tags(&tags);
    }

    match budget.create_category(&input) {
        Ok(rule) => {
            app.refresh_all(budget);
            app.set_status(format!("Created category: {} ({})", rule.name, rule.kind));
        }
        Err(e) => app.set_status(e.to_string()),
    }
    Ok(())
}

fn cmd_delete_category(_args: &str, app: &mut App, _budget: &Budget) -> anyhow::Result<()> {
    let Some(selected) = app.selected_category() else {
        app.set_status("No category selected");
        return Ok(());
    };
    let id = selected.id().to_string();
    let name = selected.name().to_string();
    let message = format!("Delete category '{name}'?");
    app.confirm(PendingAction::DeleteCategory { id, name }, message);
    Ok(())
}

fn cmd_delete_txn(_args: &str, app: &mut App, _budget: &Budget) -> anyhow::Result<()> {
    if app.screen != Screen::Transactions {
        app.set_status("Switch to Transactions to delete a transaction");
        return Ok(());
    }
    let Some(txn) = app.selected_transaction() else {
        app.set_status("No transaction selected");
        return Ok(());
    };
    let id = txn.id.clone();
    let message = format!("Delete transaction of {:.2}?", txn.amount);
    app.confirm(PendingAction::DeleteTransaction { id }, message);
    Ok(())
}

fn cmd_import(args: &str, app: &mut App, budget: &Budget) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :import <file.csv>");
        return Ok(());
    }
    let path = shellexpand(args);
    match CsvImporter::import_file(Path::new(&path), budget) {
        Ok(report) => {
            app.refresh_all(budget);
            app.set_status(format!(
                "Imported {} transactions, skipped {}",
                report.imported.len(),
                report.skipped.len()
            ));
        }
        Err(e) => app.set_status(format!("Import failed: {e:#}")),
    }
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, budget: &Budget) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :export <file.csv>");
        return Ok(());
    }
    let path = shellexpand(args);
    let count = CsvImporter::export_file(
        Path::new(&path),
        &budget.transactions(None),
        &budget.categories(),
    )?;
    app.set_status(format!("Exported {count} transactions to {path}"));
    Ok(())
}

/// Run a confirmed action.
pub(crate) fn execute_pending(action: PendingAction, app: &mut App, budget: &Budget) {
    let result = match &action {
        PendingAction::DeleteCategory { id, .. } => budget.delete_category(id),
        PendingAction::DeleteTransaction { id } => budget.delete_transaction(id),
    };
    match (result, action) {
        (Ok(()), PendingAction::DeleteCategory { name, .. }) => {
            app.set_status(format!("Deleted category: {name}"));
        }
        (Ok(()), PendingAction::DeleteTransaction { .. }) => {
            app.set_status("Deleted transaction");
        }
        (Err(e), _) => app.set_status(e.to_string()),
    }
    app.refresh_all(budget);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::ui::app::InputMode;
    use rust_decimal_macros::dec;

    fn setup() -> (Budget, App) {
        let budget = Budget::in_memory("USD").unwrap();
        let app = App::new(&budget);
        (budget, app)
    }

    #[test]
    fn test_registry_has_aliases() {
        for name in ["q", "quit", "paycheck", "spend", "category", "delete-category", "help"] {
            assert!(COMMANDS.contains_key(name), "{name}");
        }
    }

    #[test]
    fn test_unknown_command_suggests() {
        let (budget, mut app) = setup();
        handle_command("paychek 10", &mut app, &budget).unwrap();
        assert!(app.status_message.contains(":paycheck"));
    }

    #[test]
    fn test_paycheck_and_spend() {
        let (budget, mut app) = setup();
        handle_command("paycheck 3000 usd", &mut app, &budget).unwrap();
        assert_eq!(app.summary.allocated_total, dec!(3000));

        handle_command("spend essentials 1400 rent and food", &mut app, &budget).unwrap();
        assert_eq!(app.transactions.len(), 1);
        assert_eq!(app.transactions[0].note.as_deref(), Some("rent and food"));
        assert_eq!(app.alerts().len(), 1);
    }

    #[test]
    fn test_spend_reports_errors_in_status() {
        let (budget, mut app) = setup();
        handle_command("spend nowhere 5", &mut app, &budget).unwrap();
        assert!(app.status_message.contains("nowhere"));
        handle_command("spend essentials -5", &mut app, &budget).unwrap();
        assert!(app.status_message.contains("transaction amount"));
        assert!(app.transactions.is_empty());
    }

    #[test]
    fn test_category_with_spaces_and_tags() {
        let (budget, mut app) = setup();
        handle_command("category Car Loan fixed 250 debt,transport", &mut app, &budget).unwrap();
        let rule = budget.categories().pop().unwrap();
        assert_eq!(rule.name, "Car Loan");
        assert_eq!(rule.spending_categories.len(), 2);
        assert!(app.status_message.starts_with("Created category"));
    }

    #[test]
    fn test_category_rejected_over_ceiling() {
        let (budget, mut app) = setup();
        handle_command("category Fun percent 5", &mut app, &budget).unwrap();
        assert_eq!(
            app.status_message,
            "Percentage categories cannot exceed 100% in total."
        );
        assert_eq!(budget.categories().len(), 3);
    }

    #[test]
    fn test_delete_category_needs_confirmation() {
        let (budget, mut app) = setup();
        app.category_index = 2;
        handle_command("delete-category", &mut app, &budget).unwrap();
        assert_eq!(app.input_mode, InputMode::Confirm);
        assert_eq!(budget.categories().len(), 3);

        let action = app.pending_action.take().unwrap();
        execute_pending(action, &mut app, &budget);
        assert_eq!(budget.categories().len(), 2);
        assert_eq!(app.status_message, "Deleted category: Uncategorized");
    }

    #[test]
    fn test_shellexpand() {
        assert_eq!(shellexpand("/tmp/x.csv"), "/tmp/x.csv");
        assert!(!shellexpand("~/x.csv").starts_with('~'));
    }
}
