//! PlayerPane — stands in for the mount point.  The video itself plays in the
//! mpv window; this pane shows what the controller is bound to.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tube_core::{Phase, PlayerState};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    app_state::AppState,
    theme::{C_ACCENT, C_LOADING, C_MUTED, C_PRIMARY, C_READY, C_SECONDARY},
    widgets::pane_chrome::{pane_chrome, Badge},
};

const IDLE_PROMPT: &str = "Enter a YouTube URL to preview";

pub struct PlayerPane;

impl PlayerPane {
    pub fn draw(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let badge = match state.phase {
            Phase::Idle => None,
            Phase::Loading => Some(Badge {
                text: "LOADING",
                color: C_LOADING,
            }),
            Phase::Ready => Some(Badge {
                text: "READY",
                color: C_READY,
            }),
        };
        let block = pane_chrome("player", false, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let width = inner.width.saturating_sub(2) as usize;
        let lines = match (&state.video_id, state.phase) {
            (None, _) | (_, Phase::Idle) => vec![
                Line::from(""),
                Line::from(Span::styled(fit(IDLE_PROMPT, width), Style::default().fg(C_MUTED)))
                    .centered(),
            ],
            (Some(id), Phase::Loading) => vec![
                Line::from(""),
                Line::from(Span::styled("loading player…", Style::default().fg(C_LOADING)))
                    .centered(),
                Line::from(Span::styled(id.as_str().to_string(), Style::default().fg(C_SECONDARY)))
                    .centered(),
            ],
            (Some(id), Phase::Ready) => {
                let (state_text, state_color) = match state.player_state {
                    Some(PlayerState::Playing) => ("▶ playing", C_ACCENT),
                    Some(PlayerState::Paused) => ("⏸ paused", C_SECONDARY),
                    Some(PlayerState::Other) => ("· buffering / ended", C_MUTED),
                    None => ("· waiting for player", C_MUTED),
                };
                vec![
                    row("mount", state.mount.as_str(), width),
                    row("video", id.as_str(), width),
                    row("url", &id.watch_url(), width),
                    Line::from(vec![
                        Span::styled(format!(" {:<7}", "state"), Style::default().fg(C_MUTED)),
                        Span::styled(
                            state_text,
                            Style::default().fg(state_color).add_modifier(Modifier::BOLD),
                        ),
                    ]),
                ]
            }
        };
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn row<'a>(label: &'a str, value: &str, width: usize) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {:<7}", label), Style::default().fg(C_MUTED)),
        Span::styled(fit(value, width.saturating_sub(8)), Style::default().fg(C_PRIMARY)),
    ])
}

/// Truncate to `max` display columns, ending with `…` when cut.
fn fit(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
