//! Keyboard mapping: global keys first, then the active tab's keys.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::{Action, AppState, Tab};

const PAGE: usize = 10;

pub fn map_key(app: &AppState, key: KeyEvent) -> Option<Action> {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    if matches!(key.code, KeyCode::Tab | KeyCode::BackTab) {
        return Some(Action::NextTab);
    }

    match app.tab {
        Tab::Filters => filters_key(key),
        Tab::Chart => chart_key(app, key),
    }
}

fn filters_key(key: KeyEvent) -> Option<Action> {
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Up | KeyCode::Char('k') => Action::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => Action::CursorDown,
        KeyCode::Left | KeyCode::Char('h') => Action::PrevOption,
        KeyCode::Right | KeyCode::Char('l') => Action::NextOption,
        KeyCode::Enter | KeyCode::Char('a') => Action::ApplyFilters,
        KeyCode::Char('r') => Action::ResetFilters,
        KeyCode::PageUp => Action::ScrollUp(PAGE),
        KeyCode::PageDown => Action::ScrollDown(PAGE),
        KeyCode::Char('K') => Action::ScrollUp(1),
        KeyCode::Char('J') => Action::ScrollDown(1),
        _ => return None,
    };
    Some(action)
}

fn chart_key(app: &AppState, key: KeyEvent) -> Option<Action> {
    let action = match key.code {
        KeyCode::Enter => Action::SubmitSearch,
        KeyCode::Backspace => Action::SearchBackspace,
        KeyCode::Esc if app.search_input.is_empty() => Action::NextTab,
        KeyCode::Esc => Action::SearchClear,
        KeyCode::Char(c) if !c.is_control() => Action::SearchInput(c),
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartConfig;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_q_quits_only_on_filters_tab() {
        let mut app = AppState::new(ChartConfig::default());
        assert_eq!(map_key(&app, press(KeyCode::Char('q'))), Some(Action::Quit));

        app.tab = Tab::Chart;
        assert_eq!(
            map_key(&app, press(KeyCode::Char('q'))),
            Some(Action::SearchInput('q'))
        );
    }

    #[test]
    fn test_esc_on_chart_tab() {
        let mut app = AppState::new(ChartConfig::default());
        app.tab = Tab::Chart;
        assert_eq!(map_key(&app, press(KeyCode::Esc)), Some(Action::NextTab));
        app.search_input.push('A');
        assert_eq!(map_key(&app, press(KeyCode::Esc)), Some(Action::SearchClear));
    }

    #[test]
    fn test_ctrl_c_and_tab_are_global() {
        let mut app = AppState::new(ChartConfig::default());
        app.tab = Tab::Chart;
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(&app, ctrl_c), Some(Action::Quit));
        assert_eq!(map_key(&app, press(KeyCode::Tab)), Some(Action::NextTab));
    }
}
