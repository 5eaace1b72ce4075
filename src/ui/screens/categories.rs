use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::models::RuleKind;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(" Categories ({}) ", app.categories().len()),
            theme::title_style(),
        ));

    if app.categories().is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No categories", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Add one with :category <name> fixed|percent <value>",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let currency = app.currency();
    let header = Row::new(
        ["Name", "Rule", "Allocated", "Remaining", "Tags"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    )
    .height(1);

    let rows: Vec<Row> = app
        .categories()
        .iter()
        .enumerate()
        .skip(app.category_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, usage)| {
            let rule = match usage.rule.kind {
                RuleKind::Fixed { amount } => format!("fixed {}", format_amount(amount, currency)),
                RuleKind::Percent { percent } => format!("{percent}%"),
            };
            let tags: Vec<&str> = usage
                .rule
                .spending_categories
                .iter()
                .map(|t| t.as_str())
                .collect();

            let style = if i == app.category_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            Row::new(vec![
                Cell::from(truncate(usage.name(), 24)),
                Cell::from(rule),
                Cell::from(format_amount(usage.allocated, currency)),
                Cell::from(Span::styled(
                    format_amount(usage.remaining, currency),
                    Style::default().fg(theme::status_color(usage.status)),
                )),
                Cell::from(tags.join(", ")),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(26),
        Constraint::Length(18),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Min(10),
    ];

    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}
