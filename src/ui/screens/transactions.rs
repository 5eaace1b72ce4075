use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(" Transactions ({}) ", app.transactions.len()),
            theme::title_style(),
        ));

    if app.transactions.is_empty() {
        let msg = vec![
            Line::from(""),
            Line::from(Span::styled("No spending recorded", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Add one with :spend <category> <amount> or :import a CSV",
                theme::dim_style(),
            )),
        ];
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header_cells = ["Date", "Category", "Note", "Amount"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .transactions
        .iter()
        .enumerate()
        .skip(app.transaction_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, txn)| {
            let (cat_name, cat_style) = match app.category_name(&txn.category_id) {
                Some(name) => (name.to_string(), Style::default()),
                None => (format!("({})", txn.category_id), theme::dim_style()),
            };

            let style = if i == app.transaction_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            Row::new(vec![
                Cell::from(txn.occurred_at.format("%Y-%m-%d").to_string()),
                Cell::from(Span::styled(truncate(&cat_name, 20), cat_style)),
                Cell::from(truncate(txn.note.as_deref().unwrap_or(""), 40)),
                Cell::from(format_amount(txn.amount, &txn.currency)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(22),
        Constraint::Min(20),
        Constraint::Length(16),
    ];

    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}
