//! Application state and the single action handler.
//!
//! Key presses are mapped to [`Action`]s (see `input`), and
//! [`AppState::update`] is the only place state changes. The dataset is
//! passed in read-only on every call.

use crate::config::ChartConfig;
use crate::dataset::Dataset;
use crate::filter::listing::format_listing;
use crate::filter::{apply_filters, FilterField, FilterSelection, FilteredResult};
use crate::series::{series_with_windows, TimeSeries};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Filters,
    Chart,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Filters, Tab::Chart];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Filters => "Filters",
            Tab::Chart => "Stock Search & Plot",
        }
    }

    pub fn next(self) -> Tab {
        match self {
            Tab::Filters => Tab::Chart,
            Tab::Chart => Tab::Filters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextTab,
    CursorUp,
    CursorDown,
    PrevOption,
    NextOption,
    ResetFilters,
    ApplyFilters,
    ScrollUp(usize),
    ScrollDown(usize),
    SearchInput(char),
    SearchBackspace,
    SearchClear,
    SubmitSearch,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub running: bool,
    pub tab: Tab,

    /// Highlighted row of the filter form.
    pub cursor: usize,
    /// Selected option index per field, into `FilterField::labels()`.
    pub choices: [usize; FilterField::ALL.len()],

    pub result: Option<FilteredResult>,
    pub listing: String,
    pub listing_scroll: usize,

    pub search_input: String,
    pub series: Option<TimeSeries>,

    pub status: Option<(String, StatusLevel)>,
    pub chart: ChartConfig,
}

impl AppState {
    pub fn new(chart: ChartConfig) -> Self {
        Self {
            running: true,
            tab: Tab::Filters,
            cursor: 0,
            choices: [0; FilterField::ALL.len()],
            result: None,
            listing: String::new(),
            listing_scroll: 0,
            search_input: String::new(),
            series: None,
            status: None,
            chart,
        }
    }

    pub fn label_for(&self, field_idx: usize) -> &'static str {
        let labels = FilterField::ALL[field_idx].labels();
        labels[self.choices[field_idx] % labels.len()]
    }

    /// Current form contents as a selection.
    pub fn selection(&self) -> FilterSelection {
        let mut sel = FilterSelection::new();
        for (i, field) in FilterField::ALL.into_iter().enumerate() {
            sel.set(field, self.label_for(i));
        }
        sel
    }

    pub fn active_filters_line(&self) -> String {
        match &self.result {
            Some(r) => r.active_filters_message(),
            None => "Active Filters: None".to_string(),
        }
    }

    fn set_status(&mut self, msg: impl Into<String>, level: StatusLevel) {
        self.status = Some((msg.into(), level));
    }

    fn cycle_option(&mut self, forward: bool) {
        let n = FilterField::ALL[self.cursor].labels().len();
        let c = &mut self.choices[self.cursor];
        *c = if forward { (*c + 1) % n } else { (*c + n - 1) % n };
    }

    pub fn update(&mut self, dataset: &Dataset, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::NextTab => self.tab = self.tab.next(),

            Action::CursorUp => self.cursor = self.cursor.saturating_sub(1),
            Action::CursorDown => {
                self.cursor = (self.cursor + 1).min(FilterField::ALL.len() - 1);
            }
            Action::PrevOption => self.cycle_option(false),
            Action::NextOption => self.cycle_option(true),
            Action::ResetFilters => self.choices = [0; FilterField::ALL.len()],

            Action::ApplyFilters => {
                let result = apply_filters(dataset.rows(), &self.selection());
                info!("Filter applied: {} companies", result.rows.len());
                self.listing = format_listing(&result.rows);
                self.listing_scroll = 0;
                self.set_status(format!("{} companies", result.rows.len()), StatusLevel::Info);
                self.result = Some(result);
            }
            Action::ScrollUp(n) => self.listing_scroll = self.listing_scroll.saturating_sub(n),
            Action::ScrollDown(n) => {
                let max = self.listing.lines().count().saturating_sub(1);
                self.listing_scroll = (self.listing_scroll + n).min(max);
            }

            Action::SearchInput(c) => self.search_input.push(c),
            Action::SearchBackspace => {
                self.search_input.pop();
            }
            Action::SearchClear => self.search_input.clear(),
            Action::SubmitSearch => {
                let symbol = self.search_input.trim().to_uppercase();
                if symbol.is_empty() {
                    return;
                }
                debug!("Search {}", symbol);
                match series_with_windows(
                    &symbol,
                    dataset.rows(),
                    self.chart.short_window,
                    self.chart.long_window,
                ) {
                    Ok(series) => {
                        self.set_status(
                            format!("{}: {} observations", series.symbol, series.points.len()),
                            StatusLevel::Info,
                        );
                        self.series = Some(series);
                    }
                    Err(e) => {
                        self.series = None;
                        self.set_status(e.to_string(), StatusLevel::Error);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::row;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            row("AAA", "2021-01-01", Some(12.0), 9.0),
            row("AAA", "2021-06-01", Some(12.0), 11.0),
            row("BBB", "2021-06-01", Some(60.0), 150.0),
        ])
    }

    fn state() -> AppState {
        AppState::new(ChartConfig::default())
    }

    #[test]
    fn test_cycle_options_wraps() {
        let mut app = state();
        let ds = dataset();
        app.update(&ds, Action::PrevOption);
        assert_eq!(app.label_for(0), "High (>50)");
        app.update(&ds, Action::NextOption);
        assert_eq!(app.label_for(0), "Any");
        app.update(&ds, Action::NextOption);
        assert_eq!(app.label_for(0), "Low (<15)");
    }

    #[test]
    fn test_apply_filters_updates_listing() {
        let mut app = state();
        let ds = dataset();
        app.update(&ds, Action::NextOption); // P/E: Low (<15)
        app.update(&ds, Action::ApplyFilters);

        let result = app.result.as_ref().unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].symbol, "AAA");
        assert_eq!(app.active_filters_line(), "Active Filters: P/E: Low (<15)");
        assert!(app.listing.contains("AAA"));
        assert!(!app.listing.contains("BBB"));
    }

    #[test]
    fn test_apply_is_repeatable() {
        let mut app = state();
        let ds = dataset();
        app.update(&ds, Action::ApplyFilters);
        let first = app.result.clone();
        app.update(&ds, Action::ApplyFilters);
        assert_eq!(app.result, first);
        assert_eq!(app.active_filters_line(), "No active filters");
    }

    #[test]
    fn test_cursor_stays_in_form() {
        let mut app = state();
        let ds = dataset();
        app.update(&ds, Action::CursorUp);
        assert_eq!(app.cursor, 0);
        for _ in 0..20 {
            app.update(&ds, Action::CursorDown);
        }
        assert_eq!(app.cursor, FilterField::ALL.len() - 1);
        app.update(&ds, Action::NextOption);
        assert_eq!(app.selection().get(FilterField::StockPrice), Some("Low (<$10)"));
    }

    #[test]
    fn test_search_found_and_missing() {
        let mut app = state();
        let ds = dataset();
        for c in "aaa".chars() {
            app.update(&ds, Action::SearchInput(c));
        }
        app.update(&ds, Action::SubmitSearch);
        assert_eq!(app.series.as_ref().map(|s| s.symbol.as_str()), Some("AAA"));

        app.update(&ds, Action::SearchClear);
        for c in "zzz".chars() {
            app.update(&ds, Action::SearchInput(c));
        }
        app.update(&ds, Action::SubmitSearch);
        assert!(app.series.is_none());
        assert_eq!(
            app.status,
            Some(("No data available for ZZZ".to_string(), StatusLevel::Error))
        );
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut app = state();
        let ds = dataset();
        app.update(&ds, Action::ApplyFilters);
        app.update(&ds, Action::ScrollDown(50));
        assert_eq!(app.listing_scroll, app.listing.lines().count() - 1);
        app.update(&ds, Action::ScrollUp(50));
        assert_eq!(app.listing_scroll, 0);
    }
}
