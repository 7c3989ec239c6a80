//! Filter form, active-filter line and the results listing.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::app::AppState;
use super::theme;
use crate::filter::FilterField;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(FilterField::ALL.len() as u16 + 2),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(area);

    render_form(f, chunks[0], app);
    f.render_widget(
        Paragraph::new(Span::styled(app.active_filters_line(), theme::accent())),
        chunks[1],
    );
    render_listing(f, chunks[2], app);
}

fn render_form(f: &mut Frame, area: Rect, app: &AppState) {
    let lines: Vec<Line> = FilterField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let label = app.label_for(i);
            let style = if i == app.cursor { theme::cursor() } else { theme::muted() };
            Line::from(vec![
                Span::styled(format!("{:>22}: ", field.name()), style),
                Span::styled(format!("< {} >", label), theme::accent()),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" [↑↓]field [←→]option [Enter]apply [r]eset ")
        .title_style(theme::muted());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_listing(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Results [PgUp/PgDn] ")
        .title_style(theme::muted());

    let para = if app.result.is_none() {
        Paragraph::new(Span::styled("Press Enter to apply the filters.", theme::muted()))
    } else {
        Paragraph::new(app.listing.as_str()).scroll((app.listing_scroll as u16, 0))
    };
    f.render_widget(para.block(block), area);
}
