//! LogPanel component — scrollable view of recent controller/library events.
//!
//! Hidden by default; F2 opens it below the transport row.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_SECONDARY},
    widgets::pane_chrome::pane_chrome,
};

pub struct LogPanel {
    pub expanded: bool,
    pub scroll: usize,
    /// Track last log count to detect new entries for auto-scroll
    last_log_count: usize,
}

impl LogPanel {
    pub fn new() -> Self {
        Self {
            expanded: false,
            scroll: 0,
            last_log_count: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
        if self.expanded {
            // Jump to bottom on open
            self.scroll = usize::MAX;
        }
    }
}

impl Component for LogPanel {
    fn id(&self) -> ComponentId {
        ComponentId::LogPanel
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !self.expanded {
            return vec![];
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::End | KeyCode::Char('G') => self.scroll = usize::MAX,
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if !self.expanded {
            return vec![];
        }
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            MouseEventKind::ScrollDown => self.scroll = self.scroll.saturating_add(1),
            MouseEventKind::Down(_) => return vec![Action::FocusPane(ComponentId::LogPanel)],
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::ToggleLogs = action {
            self.toggle();
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        if area.height == 0 || !self.expanded {
            return;
        }
        frame.render_widget(Clear, area);

        let block = pane_chrome("log", focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let logs = &state.log_lines;
        let height = inner.height as usize;
        let log_count = logs.len();

        // Auto-scroll to bottom if new logs arrived and we were at bottom
        if log_count > self.last_log_count {
            let max_scroll = log_count.saturating_sub(height);
            if self.scroll >= max_scroll.saturating_sub(1) {
                self.scroll = usize::MAX;
            }
            self.last_log_count = log_count;
        }

        if logs.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  no log entries yet", Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let max_scroll = log_count.saturating_sub(height);
        if self.scroll > max_scroll {
            self.scroll = max_scroll;
        }

        let lines: Vec<Line> = logs
            .iter()
            .skip(self.scroll)
            .take(height)
            .map(|msg| match msg.split_once(' ') {
                Some((ts, rest)) => Line::from(vec![
                    Span::styled(format!(" {} ", ts), Style::default().fg(C_MUTED)),
                    Span::styled(rest.to_string(), Style::default().fg(C_SECONDARY)),
                ]),
                None => Line::from(Span::styled(msg.clone(), Style::default().fg(C_SECONDARY))),
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// Prefix `msg` with a local `HH:MM:SS` stamp.
pub fn stamp(msg: &str) -> String {
    format!("{} {}", chrono::Local::now().format("%H:%M:%S"), msg)
}
