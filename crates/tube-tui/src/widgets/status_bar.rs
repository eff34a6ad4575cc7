//! Status bar — bottom line with library state, last log line and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::action::ComponentId;
use crate::app_state::LibraryStatus;
use crate::theme::{C_ERROR, C_LOADING, C_MUTED, C_READY, C_SECONDARY};

fn library_color(status: LibraryStatus) -> ratatui::style::Color {
    match status {
        LibraryStatus::Starting => C_LOADING,
        LibraryStatus::Ready => C_READY,
        LibraryStatus::Unavailable | LibraryStatus::Exited => C_ERROR,
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, focus: Option<ComponentId>, library: LibraryStatus) {
    let keys = match focus {
        Some(ComponentId::Transport) => {
            " ←→ select  Enter/Space press  Tab url  F1 help  F2 logs  Ctrl-C quit"
        }
        _ => " type or paste a URL  Esc clear  Enter/Tab controls  F1 help  F2 logs  Ctrl-C quit",
    };

    let line = Line::from(vec![
        Span::styled(
            " mpv ",
            Style::default().fg(C_SECONDARY).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("● {}", library.label()),
            Style::default().fg(library_color(library)),
        ),
        Span::raw(" "),
        Span::styled(keys, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the last log line (used when the log panel is closed).
pub fn draw_log_bar(frame: &mut Frame, area: Rect, last_log: Option<&str>) {
    let line = Line::from(vec![
        Span::styled(" log ", Style::default().fg(C_MUTED)),
        Span::styled(last_log.unwrap_or(""), Style::default().fg(C_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
