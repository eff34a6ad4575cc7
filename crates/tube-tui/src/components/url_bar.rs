//! UrlBar — the free-text field.  Every edit re-runs extraction upstream.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};
use unicode_width::UnicodeWidthChar;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_INPUT_BG, C_INPUT_FG, C_MUTED},
    widgets::pane_chrome::pane_chrome,
};

const PLACEHOLDER: &str = "paste a YouTube URL or video link";

pub struct UrlBar {
    input: Input,
}

impl UrlBar {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
        }
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }
}

impl Component for UrlBar {
    fn id(&self) -> ComponentId {
        ComponentId::UrlBar
    }

    /// Esc clears the field; Enter moves on to the controls; everything else
    /// edits the text.
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Esc => {
                if self.input.value().is_empty() {
                    return vec![];
                }
                self.input = Input::default();
                vec![Action::InputChanged(String::new())]
            }
            KeyCode::Enter => vec![Action::FocusPane(ComponentId::Transport)],
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if self.input.value() != before {
                    vec![Action::InputChanged(self.input.value().to_string())]
                } else {
                    vec![]
                }
            }
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::Down(_) => vec![Action::FocusPane(ComponentId::UrlBar)],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        let block = pane_chrome("url", focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let scroll = self.input.visual_scroll(inner.width.saturating_sub(1) as usize);
        let value = self.input.value();
        let span = if value.is_empty() {
            Span::styled(PLACEHOLDER, Style::default().fg(C_MUTED))
        } else {
            Span::styled(skip_columns(value, scroll), Style::default().fg(C_INPUT_FG))
        };
        frame.render_widget(
            Paragraph::new(Line::from(span)).style(Style::default().bg(C_INPUT_BG)),
            inner,
        );

        if focused {
            let cursor_x = inner.x + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(inner.x + inner.width - 1), inner.y));
        }
    }
}

/// The tail of `s` left after scrolling `cols` display columns off the left.
fn skip_columns(s: &str, cols: usize) -> &str {
    let mut used = 0;
    for (i, ch) in s.char_indices() {
        if used >= cols {
            return &s[i..];
        }
        used += ch.width().unwrap_or(0);
    }
    ""
}
