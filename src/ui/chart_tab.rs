//! Ticker search and the price chart with both moving averages.

use chrono::{Datelike, NaiveDate};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};

use super::app::AppState;
use super::theme;
use crate::series::{date_axis, TimeSeries};

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let input = Paragraph::new(Line::from(vec![
        Span::raw(app.search_input.as_str()),
        Span::styled("_", theme::accent()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Enter Stock Ticker [Enter]search [Esc]clear ")
            .title_style(theme::muted()),
    );
    f.render_widget(input, chunks[0]);

    match &app.series {
        Some(series) => render_chart(f, chunks[1], series, app.chart.tick_months),
        None => render_empty(f, chunks[1]),
    }
}

fn render_empty(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Type a ticker symbol and press Enter to plot its price history.",
            theme::muted(),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn render_chart(f: &mut Frame, area: Rect, series: &TimeSeries, tick_months: u32) {
    let (Some(first), Some(last), Some((lo, hi))) =
        (series.first_date(), series.last_date(), series.value_range())
    else {
        return render_empty(f, area);
    };

    let price: Vec<(f64, f64)> = series
        .points
        .iter()
        .map(|p| (x(p.date), p.adjusted_price))
        .collect();
    let short: Vec<(f64, f64)> = series
        .points
        .iter()
        .filter_map(|p| p.sma_short.map(|v| (x(p.date), v)))
        .collect();
    let long: Vec<(f64, f64)> = series
        .points
        .iter()
        .filter_map(|p| p.sma_long.map(|v| (x(p.date), v)))
        .collect();

    let short_name = format!("{}-day SMA", series.short_window);
    let long_name = format!("{}-day SMA", series.long_window);
    let datasets = vec![
        Dataset::default()
            .name("Stock Price")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme::PRICE))
            .data(&price),
        Dataset::default()
            .name(short_name)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme::SMA_SHORT))
            .data(&short),
        Dataset::default()
            .name(long_name)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme::SMA_LONG))
            .data(&long),
    ];

    // "MM-YYYY" is 7 wide; keep a gap between labels
    let max_labels = (area.width as usize / 10).max(2);
    let (x_bounds, x_labels) = match date_axis(first, last, tick_months, max_labels) {
        Some(axis) => ([x(axis.from), x(axis.to)], axis.labels),
        None => ([x(first), x(last) + 1.0], vec![first.format("%m-%Y").to_string()]),
    };
    let x_labels: Vec<Span> = x_labels
        .into_iter()
        .map(|l| Span::styled(l, theme::muted()))
        .collect();

    let pad = ((hi - lo).abs() * 0.05).max(0.01);
    let (y_min, y_max) = (lo - pad, hi + pad);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", series.title()))
                .title_style(theme::accent_bold()),
        )
        .x_axis(
            Axis::default()
                .title(Span::styled("Date", theme::muted()))
                .style(theme::muted())
                .bounds(x_bounds)
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Price", theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{:.2}", y_min), theme::muted()),
                    Span::styled(format!("{:.2}", (y_min + y_max) / 2.0), theme::muted()),
                    Span::styled(format!("{:.2}", y_max), theme::muted()),
                ]),
        );

    f.render_widget(chart, area);
}
