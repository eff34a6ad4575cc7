//! Header component — 2-row top bar.
//!
//! Row 1: product name, with the controller phase on the right.
//! Row 2: tagline.
//!
//! Not focusable.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tube_core::Phase;

use crate::{
    app_state::AppState,
    theme::{style_secondary, style_title, C_ACCENT, C_LOADING, C_MUTED, C_READY},
};

pub struct Header;

impl Header {
    pub fn draw(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        if area.height == 0 {
            return;
        }
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let phase_color = match state.phase {
            Phase::Idle => C_MUTED,
            Phase::Loading => C_LOADING,
            Phase::Ready => C_READY,
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(12)])
            .split(rows[0]);
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" ⌕ ", Style::default().fg(C_ACCENT)),
                Span::styled("SearchTube", style_title()),
            ])),
            cols[0],
        );
        frame.render_widget(
            Paragraph::new(
                Line::from(Span::styled(
                    format!("{} ", state.phase.label()),
                    Style::default().fg(phase_color).add_modifier(Modifier::BOLD),
                ))
                .right_aligned(),
            ),
            cols[1],
        );

        if rows[1].height > 0 {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    "   Loop any YouTube videos",
                    style_secondary(),
                ))),
                rows[1],
            );
        }
    }
}
