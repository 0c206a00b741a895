//! Colors and the styles built from them.

use ratatui::style::{Color, Modifier, Style};

// ── Palette ───────────────────────────────────────────────────────────

pub const FILAMENT: Color = Color::Rgb(255, 176, 96);
pub const LAMP_YELLOW: Color = Color::Rgb(250, 232, 140);
pub const DAYLIGHT: Color = Color::Rgb(150, 220, 255);
pub const DUSK_VIOLET: Color = Color::Rgb(176, 120, 255);
pub const ON_GREEN: Color = Color::Rgb(110, 230, 140);
pub const FAULT_RED: Color = Color::Rgb(240, 96, 96);

pub const SOFT_WHITE: Color = Color::Rgb(200, 200, 210);
pub const SLATE: Color = Color::Rgb(100, 110, 140);
pub const ROW_GLOW: Color = Color::Rgb(48, 44, 40);
pub const NIGHT: Color = Color::Rgb(24, 24, 32);

// ── Styles ────────────────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::new().fg(FILAMENT).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::new().fg(DUSK_VIOLET)
}

pub fn border_default() -> Style {
    Style::new().fg(SLATE)
}

pub fn table_header() -> Style {
    Style::new().fg(DAYLIGHT).add_modifier(Modifier::BOLD)
}

pub fn table_row() -> Style {
    Style::new().fg(SOFT_WHITE)
}

pub fn table_cursor() -> Style {
    Style::new().bg(ROW_GLOW).add_modifier(Modifier::BOLD)
}

/// Description half of a key hint, e.g. "quit" in "q quit".
pub fn key_hint() -> Style {
    Style::new().fg(SLATE)
}

pub fn key_hint_key() -> Style {
    Style::new().fg(DAYLIGHT).add_modifier(Modifier::BOLD)
}

pub fn power_on() -> Style {
    Style::new().fg(ON_GREEN).add_modifier(Modifier::BOLD)
}

pub fn power_off() -> Style {
    Style::new().fg(SLATE)
}

pub fn unreachable() -> Style {
    Style::new().fg(FAULT_RED)
}
