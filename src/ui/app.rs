use crate::budget::Budget;
use crate::models::{Alert, Transaction};
use crate::usage::{CategoryUsage, Summary};
use crate::ui::util::clamp_index;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Categories,
    Transactions,
    Alerts,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[
            Self::Dashboard,
            Self::Categories,
            Self::Transactions,
            Self::Alerts,
        ]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Categories => write!(f, "Categories"),
            Self::Transactions => write!(f, "Transactions"),
            Self::Alerts => write!(f, "Alerts"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    DeleteCategory { id: String, name: String },
    DeleteTransaction { id: String },
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,

    /// Dashboard rollup; its `categories` back the Categories tab too.
    pub(crate) summary: Summary,

    pub(crate) category_index: usize,
    pub(crate) category_scroll: usize,

    pub(crate) transactions: Vec<Transaction>,
    pub(crate) transaction_index: usize,
    pub(crate) transaction_scroll: usize,

    pub(crate) alert_index: usize,
    pub(crate) alert_scroll: usize,

    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(budget: &Budget) -> Self {
        let mut app = Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,

            summary: budget.summary(),

            category_index: 0,
            category_scroll: 0,

            transactions: Vec::new(),
            transaction_index: 0,
            transaction_scroll: 0,

            alert_index: 0,
            alert_scroll: 0,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        };
        app.refresh_all(budget);
        app
    }

    /// Re-read everything from the budget. Cheap: the budget recomputes on demand.
    pub(crate) fn refresh_all(&mut self, budget: &Budget) {
        self.summary = budget.summary();
        self.transactions = budget.transactions(None);

        let categories = self.summary.categories.len();
        let alerts = self.summary.alerts.len();
        clamp_index(&mut self.category_index, &mut self.category_scroll, categories);
        clamp_index(
            &mut self.transaction_index,
            &mut self.transaction_scroll,
            self.transactions.len(),
        );
        clamp_index(&mut self.alert_index, &mut self.alert_scroll, alerts);
    }

    pub(crate) fn currency(&self) -> &str {
        &self.summary.currency
    }

    pub(crate) fn categories(&self) -> &[CategoryUsage] {
        &self.summary.categories
    }

    pub(crate) fn alerts(&self) -> &[Alert] {
        &self.summary.alerts
    }

    pub(crate) fn selected_category(&self) -> Option<&CategoryUsage> {
        self.summary.categories.get(self.category_index)
    }

    pub(crate) fn selected_transaction(&self) -> Option<&Transaction> {
        self.transactions.get(self.transaction_index)
    }

    pub(crate) fn category_name(&self, id: &str) -> Option<&str> {
        self.summary
            .categories
            .iter()
            .find(|c| c.id() == id)
            .map(|c| c.name())
    }

    /// Ask for a y/N confirmation before running `action`.
    pub(crate) fn confirm(&mut self, action: PendingAction, message: impl Into<String>) {
        self.pending_action = Some(action);
        self.confirm_message = message.into();
        self.input_mode = InputMode::Confirm;
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}
