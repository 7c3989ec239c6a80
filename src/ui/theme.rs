//! Colour tokens for the screener window.

use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(0, 200, 200);
pub const PRICE: Color = Color::Rgb(0, 128, 128);
pub const SMA_SHORT: Color = Color::Rgb(255, 165, 0);
pub const SMA_LONG: Color = Color::Rgb(147, 112, 219);
pub const NEGATIVE: Color = Color::Rgb(255, 80, 80);
pub const MUTED: Color = Color::Rgb(120, 140, 170);

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn cursor() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

pub fn tab_title(active: bool) -> Style {
    if active { accent_bold() } else { muted() }
}
