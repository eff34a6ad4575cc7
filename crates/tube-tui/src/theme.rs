//! Color palette and style constants.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(17, 24, 39);
pub const C_ACCENT: Color = Color::Rgb(236, 72, 153); // pink, also the "playing" colour
pub const C_ACCENT_DIM: Color = Color::Rgb(150, 50, 100);
pub const C_LOADING: Color = Color::Rgb(255, 184, 80);
pub const C_READY: Color = Color::Rgb(80, 200, 120);
pub const C_ERROR: Color = Color::Rgb(255, 80, 80);
pub const C_MUTED: Color = Color::Rgb(107, 114, 128);
pub const C_SECONDARY: Color = Color::Rgb(156, 163, 175);
pub const C_PRIMARY: Color = Color::Rgb(243, 244, 246);
pub const C_PANEL_BORDER: Color = Color::Rgb(55, 65, 81);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(120, 100, 200);
pub const C_INPUT_BG: Color = Color::Rgb(31, 41, 55);
pub const C_INPUT_FG: Color = Color::Rgb(255, 255, 255);
pub const C_BUTTON_BG: Color = Color::Rgb(31, 41, 55);
pub const C_BUTTON_FOCUSED_BG: Color = Color::Rgb(55, 65, 81);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_title() -> Style {
    Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}
