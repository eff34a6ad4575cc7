//! AppState — shared read-only data passed to all components during render/event.
//!
//! The App event loop is the only writer.  Everything here is a snapshot of
//! the controller plus UI bookkeeping.

use std::collections::VecDeque;

use tube_core::{MountPoint, Phase, PlaybackController, PlayerState, VideoId};

use crate::intent::RenderHint;

const MAX_LOG_LINES: usize = 200;

/// Where the player library is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryStatus {
    Starting,
    Ready,
    /// Launch failed; readiness will never resolve.
    Unavailable,
    /// Was ready, then the player process went away.
    Exited,
}

impl LibraryStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Unavailable => "unavailable",
            Self::Exited => "exited",
        }
    }
}

pub struct AppState {
    pub phase: Phase,
    pub video_id: Option<VideoId>,
    pub mount: MountPoint,
    /// The Playback Flag, as last read from the controller.
    pub is_playing: bool,
    /// Last tri-state payload from the current player.
    pub player_state: Option<PlayerState>,
    pub library: LibraryStatus,
    /// Play icon as it should be drawn (intent while a toggle is pending).
    pub shown_playing: bool,
    pub play_hint: RenderHint,
    pub show_keys_bar: bool,
    pub log_lines: VecDeque<String>,
}

impl AppState {
    pub fn new(mount: MountPoint, show_keys_bar: bool) -> Self {
        Self {
            phase: Phase::Idle,
            video_id: None,
            mount,
            is_playing: false,
            player_state: None,
            library: LibraryStatus::Starting,
            shown_playing: false,
            play_hint: RenderHint::Normal,
            show_keys_bar,
            log_lines: VecDeque::new(),
        }
    }

    /// Copy the controller's observable state.
    pub fn sync_from(&mut self, controller: &PlaybackController) {
        let phase = controller.phase();
        if phase != Phase::Ready {
            self.player_state = None;
        }
        self.phase = phase;
        self.video_id = controller.video_id().cloned();
        self.is_playing = controller.is_playing();
    }

    pub fn push_log(&mut self, line: String) {
        self.log_lines.push_back(line);
        while self.log_lines.len() > MAX_LOG_LINES {
            self.log_lines.pop_front();
        }
    }

    pub fn last_log(&self) -> Option<&str> {
        self.log_lines.back().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_capped() {
        let mut s = AppState::new(MountPoint::default(), true);
        for i in 0..(MAX_LOG_LINES + 5) {
            s.push_log(format!("line {}", i));
        }
        assert_eq!(s.log_lines.len(), MAX_LOG_LINES);
        assert_eq!(s.last_log(), Some(format!("line {}", MAX_LOG_LINES + 4).as_str()));
    }
}
