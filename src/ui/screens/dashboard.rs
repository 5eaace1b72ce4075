use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use rust_decimal::Decimal;

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, progress_bar, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Summary cards
            Constraint::Min(5),    // Usage bars
        ])
        .split(area);

    render_summary_cards(f, chunks[0], app);
    render_usage(f, chunks[1], app);
}

fn render_summary_cards(f: &mut Frame, area: Rect, app: &App) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let summary = &app.summary;
    let currency = app.currency();
    let paycheck = summary
        .paycheck
        .as_ref()
        .map(|p| p.amount)
        .unwrap_or(Decimal::ZERO);

    render_card(
        f,
        cards[0],
        "Paycheck",
        format_amount(paycheck, currency),
        theme::ACCENT,
        summary
            .paycheck
            .as_ref()
            .map(|p| format!("updated {}", p.updated_at.format("%Y-%m-%d")))
            .unwrap_or_else(|| ":paycheck <amount> to start".into()),
    );
    render_card(
        f,
        cards[1],
        "Allocated",
        format_amount(summary.allocated_total, currency),
        theme::TEXT,
        format!("{} unallocated", format_amount(summary.unallocated, currency)),
    );
    render_card(
        f,
        cards[2],
        "Spent",
        format_amount(summary.spent_total, currency),
        if summary.spent_total > summary.allocated_total {
            theme::RED
        } else {
            theme::YELLOW
        },
        format!("{}% of budget", summary.budget_used_percent),
    );
    render_card(
        f,
        cards[3],
        "Left",
        format_amount(summary.leftover_budget, currency),
        if summary.leftover_budget >= Decimal::ZERO {
            theme::GREEN
        } else {
            theme::RED
        },
        format!("{} alerts", summary.alerts.len()),
    );
}

fn render_card(
    f: &mut Frame,
    area: Rect,
    title: &str,
    display: String,
    color: ratatui::style::Color,
    subtitle: String,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(format!(" {title} "), theme::title_style()));

    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            display,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, theme::dim_style())),
    ])
    .centered()
    .block(block);

    f.render_widget(text, area);
}

fn render_usage(f: &mut Frame, area: Rect, app: &App) {
    let currency = app.currency();
    let bar_width = (area.width as usize).saturating_sub(60).clamp(10, 40);

    let items: Vec<ListItem> = app
        .categories()
        .iter()
        .take(area.height.saturating_sub(2) as usize)
        .map(|usage| {
            let color = theme::status_color(usage.status);
            let percent = usage
                .ratio()
                .map(|r| format!(" {:.0}%", r * Decimal::ONE_HUNDRED))
                .unwrap_or_else(|| " -".into());

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<18}", truncate(usage.name(), 17)),
                    theme::normal_style(),
                ),
                Span::styled(
                    format!(
                        "{:>14} / {:<14} ",
                        format_amount(usage.spent, currency),
                        format_amount(usage.allocated, currency)
                    ),
                    Style::default().fg(color),
                ),
                Span::styled(
                    progress_bar(usage.ratio(), bar_width),
                    Style::default().fg(color),
                ),
                Span::styled(
                    percent,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(" Spending by Category ", theme::title_style())),
    );
    f.render_widget(list, area);
}
