use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(" Alerts ({}) ", app.alerts().len()),
            theme::title_style(),
        ));

    if app.alerts().is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Every category is under 85% of its budget",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = app
        .alerts()
        .iter()
        .enumerate()
        .skip(app.alert_scroll)
        .take(area.height.saturating_sub(2) as usize)
        .map(|(i, alert)| {
            let color = theme::severity_color(alert.severity);
            let row_style = if i == app.alert_index {
                theme::selected_style()
            } else {
                theme::normal_style()
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!(" {:<9}", alert.severity.to_string().to_uppercase()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{:>5}%  ", alert.percent_used), Style::default().fg(color)),
                Span::styled(alert.message.clone(), row_style),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}
