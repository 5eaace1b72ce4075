use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use super::app::{App, InputMode, Screen};
use super::commands;
use super::theme;
use super::util::format_amount;
use crate::models::Severity;

/// Key bindings shown in the help popup, in display order.
const KEY_HELP: [(&str, &str); 9] = [
    ("j/k", "move cursor"),
    ("g/G", "first / last row"),
    ("1-4", "jump to tab"),
    ("Tab", "next tab"),
    (":", "command bar"),
    ("D", "delete selected category or transaction"),
    ("r", "reload from the budget"),
    ("?", "this help"),
    ("Ctrl-q", "quit"),
];

pub(crate) fn render(f: &mut Frame, app: &App) {
    let [tabs, body, status, command] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_tabs(f, tabs, app);
    match app.screen {
        Screen::Dashboard => super::screens::dashboard::render(f, body, app),
        Screen::Categories => super::screens::categories::render(f, body, app),
        Screen::Transactions => super::screens::transactions::render(f, body, app),
        Screen::Alerts => super::screens::alerts::render(f, body, app),
    }
    render_status(f, status, app);
    render_command_line(f, command, app);

    if app.show_help {
        render_help(f);
    }
}

fn render_tabs(f: &mut Frame, area: Rect, app: &App) {
    let titles = Screen::all().iter().enumerate().map(|(i, screen)| {
        let alerts = app.alerts().len();
        match screen {
            Screen::Alerts if alerts > 0 => format!("{}:{screen} ({alerts})", i + 1),
            _ => format!("{}:{screen}", i + 1),
        }
    });
    let selected = Screen::all()
        .iter()
        .position(|s| *s == app.screen)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(theme::TEXT_DIM).bg(theme::HEADER_BG))
        .highlight_style(
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" ");
    f.render_widget(tabs, area);
}

/// One-line budget digest for the status bar.
fn budget_digest(app: &App) -> String {
    let summary = &app.summary;
    let Some(paycheck) = &summary.paycheck else {
        return "no paycheck set".to_string();
    };
    format!(
        "paycheck {} · spent {}% · {} left",
        format_amount(paycheck.amount, &paycheck.currency),
        summary.budget_used_percent,
        format_amount(summary.leftover_budget, &summary.currency)
    )
}

fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let badge_bg = match app.input_mode {
        InputMode::Normal => theme::ACCENT,
        InputMode::Command => theme::GREEN,
        InputMode::Confirm => theme::RED,
    };
    // The worst open alert tints the digest.
    let alerts = app.alerts();
    let digest_fg = if alerts.iter().any(|a| a.severity == Severity::Critical) {
        theme::severity_color(Severity::Critical)
    } else if !alerts.is_empty() {
        theme::severity_color(Severity::Warning)
    } else {
        theme::TEXT_DIM
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", app.input_mode),
            Style::default()
                .fg(theme::HEADER_BG)
                .bg(badge_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(budget_digest(app), Style::default().fg(digest_fg)),
    ]);
    let hint = Line::from(" ? help ").right_aligned();

    let [left, right] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(8)]).areas(area);
    f.render_widget(Paragraph::new(line).style(theme::status_bar_style()), left);
    f.render_widget(Paragraph::new(hint).style(theme::status_bar_style()), right);
}

fn render_command_line(f: &mut Frame, area: Rect, app: &App) {
    let line = match app.input_mode {
        InputMode::Command => {
            let cursor = area.x + 1 + app.command_input.chars().count() as u16;
            f.set_cursor_position((cursor, area.y));
            Line::from(format!(":{}", app.command_input))
        }
        InputMode::Confirm => Line::from(vec![
            Span::styled(app.confirm_message.as_str(), Style::default().fg(theme::YELLOW)),
            Span::styled(" (y/N)", theme::dim_style()),
        ]),
        InputMode::Normal if app.status_message.is_empty() => Line::default(),
        InputMode::Normal => Line::from(app.status_message.as_str()),
    };
    f.render_widget(Paragraph::new(line).style(theme::command_bar_style()), area);
}

/// Registry commands for the help popup: long names only, one line per
/// description, sorted by name.
fn command_help() -> Vec<(&'static str, &'static str)> {
    let mut entries: Vec<(&'static str, &'static str)> = commands::COMMANDS
        .iter()
        .filter(|(name, _)| name.len() > 2)
        .map(|(name, cmd)| (*name, cmd.description))
        .collect();
    entries.sort();
    entries.dedup_by_key(|(_, desc)| *desc);
    entries
}

fn render_help(f: &mut Frame) {
    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default()
                .fg(theme::YELLOW)
                .add_modifier(Modifier::BOLD),
        ))
    };

    let mut lines = vec![heading("Keys")];
    lines.extend(
        KEY_HELP
            .iter()
            .map(|(key, what)| Line::from(format!("  {key:<8} {what}"))),
    );
    lines.push(Line::default());
    lines.push(heading("Commands"));
    lines.extend(
        command_help()
            .into_iter()
            .map(|(name, desc)| Line::from(format!("  :{name:<16} {desc}"))),
    );

    let area = f.area();
    let height = (lines.len() as u16 + 2).min(area.height);
    let [popup] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(76)])
        .flex(Flex::Center)
        .areas(popup);

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).style(theme::normal_style()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" PaySplit · any key closes ")
                .border_style(Style::default().fg(theme::ACCENT))
                .style(Style::default().bg(theme::HEADER_BG)),
        ),
        popup,
    );
}
