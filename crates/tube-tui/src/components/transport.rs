//! Transport row — rotate, repeat and play/pause buttons.
//!
//! Buttons are inert until a player is bound; the App forwards their actions
//! to the controller, which ignores them without a handle.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tube_core::Phase;

use crate::{
    action::{Action, Button, ComponentId},
    app_state::AppState,
    component::Component,
    intent::RenderHint,
    theme::{
        C_ACCENT, C_ACCENT_DIM, C_BUTTON_BG, C_BUTTON_FOCUSED_BG, C_ERROR, C_MUTED, C_PRIMARY,
    },
    widgets::pane_chrome::pane_chrome,
};

pub struct Transport {
    pub selected: usize,
}

impl Transport {
    pub fn new() -> Self {
        // play/pause is the most common target
        Self { selected: 2 }
    }

    pub fn selected_button(&self) -> Button {
        Button::ALL[self.selected]
    }

    fn button_areas(inner: Rect) -> Vec<Rect> {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(inner)
            .to_vec()
    }

    fn label(button: Button, state: &AppState) -> (String, Style) {
        match button {
            Button::Rotate => ("⟲ rotate".to_string(), Style::default().fg(C_PRIMARY)),
            Button::Repeat => ("⟳ repeat".to_string(), Style::default().fg(C_PRIMARY)),
            Button::PlayPause => {
                let icon = if state.shown_playing { "⏸ pause" } else { "▶ play" };
                let style = match state.play_hint {
                    RenderHint::Normal if state.shown_playing => {
                        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
                    }
                    RenderHint::Normal => Style::default().fg(C_PRIMARY),
                    RenderHint::PendingVisible => {
                        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
                    }
                    RenderHint::PendingHidden => Style::default().fg(C_ACCENT_DIM),
                    RenderHint::TimedOut => Style::default().fg(C_ERROR),
                };
                let text = if state.play_hint == RenderHint::TimedOut {
                    format!("{} ?", icon)
                } else {
                    icon.to_string()
                };
                (text, style)
            }
        }
    }
}

impl Component for Transport {
    fn id(&self) -> ComponentId {
        ComponentId::Transport
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected = self.selected.saturating_sub(1);
                vec![]
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.selected = (self.selected + 1).min(Button::ALL.len() - 1);
                vec![]
            }
            KeyCode::Enter | KeyCode::Char(' ') => vec![self.selected_button().action()],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _state: &AppState) -> Vec<Action> {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return vec![];
        }
        let inner = pane_chrome("controls", false, None).inner(area);
        let hit = Self::button_areas(inner).iter().position(|r| {
            event.column >= r.x
                && event.column < r.x + r.width
                && event.row >= r.y
                && event.row < r.y + r.height
        });
        match hit {
            Some(i) => {
                self.selected = i;
                vec![
                    Action::FocusPane(ComponentId::Transport),
                    Button::ALL[i].action(),
                ]
            }
            None => vec![Action::FocusPane(ComponentId::Transport)],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let block = pane_chrome("controls", focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let inert = state.phase != Phase::Ready;
        for (i, (button, rect)) in Button::ALL
            .iter()
            .zip(Self::button_areas(inner))
            .enumerate()
        {
            let (text, mut style) = Self::label(*button, state);
            if inert {
                style = Style::default().fg(C_MUTED);
            }
            let bg = if focused && i == self.selected {
                C_BUTTON_FOCUSED_BG
            } else {
                C_BUTTON_BG
            };
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(text, style)).centered())
                    .style(Style::default().bg(bg)),
                rect,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;
    use tube_core::MountPoint;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn arrows_select_and_enter_presses() {
        let state = AppState::new(MountPoint::default(), true);
        let mut t = Transport::new();
        t.handle_key(key(KeyCode::Left), &state);
        t.handle_key(key(KeyCode::Left), &state);
        t.handle_key(key(KeyCode::Left), &state);
        assert_eq!(t.selected_button(), Button::Rotate);
        assert_eq!(t.handle_key(key(KeyCode::Enter), &state), vec![Action::Rotate]);
        t.handle_key(key(KeyCode::Right), &state);
        assert_eq!(t.handle_key(key(KeyCode::Char(' ')), &state), vec![Action::Repeat]);
    }

    #[test]
    fn click_hits_the_button_under_the_cursor() {
        let state = AppState::new(MountPoint::default(), true);
        let mut t = Transport::new();
        // 32 wide incl. borders: inner 30 columns, 10 per button
        let area = Rect::new(0, 0, 32, 3);
        assert_eq!(
            t.handle_mouse(click(25, 1), area, &state),
            vec![
                Action::FocusPane(ComponentId::Transport),
                Action::TogglePlayPause
            ]
        );
        assert_eq!(
            t.handle_mouse(click(3, 1), area, &state),
            vec![Action::FocusPane(ComponentId::Transport), Action::Rotate]
        );
        assert_eq!(t.selected_button(), Button::Rotate);
    }

    #[test]
    fn timed_out_toggle_is_flagged() {
        let mut state = AppState::new(MountPoint::default(), true);
        state.shown_playing = true;
        state.play_hint = RenderHint::TimedOut;
        let (text, style) = Transport::label(Button::PlayPause, &state);
        assert_eq!(text, "⏸ pause ?");
        assert_eq!(style.fg, Some(C_ERROR));
    }
}
