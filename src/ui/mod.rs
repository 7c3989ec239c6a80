//! Terminal window: two tabs over the session dataset, status bar below.

pub mod app;
pub mod chart_tab;
pub mod filters_tab;
pub mod input;
pub mod theme;

use std::io::{self, stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};

use crate::config::ChartConfig;
use crate::dataset::Dataset;
use self::app::{AppState, StatusLevel, Tab};

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|t| Line::from(Span::styled(t.label(), theme::tab_title(*t == app.tab))))
        .collect();
    let selected = Tab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title(" Stock Screener "))
        .highlight_style(theme::accent_bold());
    f.render_widget(tabs, chunks[0]);

    match app.tab {
        Tab::Filters => filters_tab::render(f, chunks[1], app),
        Tab::Chart => chart_tab::render(f, chunks[1], app),
    }

    render_status(f, chunks[2], app);
}

fn render_status(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans = vec![Span::styled(" [Tab]switch [Ctrl-C]quit", theme::muted())];
    if let Some((msg, level)) = &app.status {
        spans.push(Span::raw(" | "));
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::styled(msg.as_str(), style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Run the interactive session until the user quits.
pub fn run(dataset: &Dataset, chart: ChartConfig) -> Result<()> {
    // Restore the terminal before a panic message is printed.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = AppState::new(chart);
    let result = event_loop(&mut terminal, &mut app, dataset);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    dataset: &Dataset,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if let Some(action) = input::map_key(app, key) {
                    app.update(dataset, action);
                }
            }
        }
    }
    Ok(())
}
