//! PlaybackController — owns the current identifier, the live player handle
//! and the local "is playing" flag.
//!
//! ```text
//!   Idle ──set id──▶ Loading ──library ready──▶ Ready
//!    ▲                 │  ▲                       │
//!    └──── cleared ────┘  └── construct failed ───┤
//!    └──────────────────── cleared ───────────────┘
//! ```
//!
//! The controller is driven from a single event loop; it never blocks and
//! holds no locks.  State-change notices travel back through an unbounded
//! channel and are tagged with the handle generation so that notices from a
//! superseded handle are dropped.
//!
//! The play/pause toggle is optimistic: it picks `pause` or `play` from the
//! local flag, which may lag the player by one notification round trip.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::player::{MountPoint, PlayerHandle, PlayerLibrary, PlayerOptions, StateNotice};
use crate::video_id::{self, VideoId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No identifier: placeholder shown, controls inert.
    Idle,
    /// Identifier known, no handle yet (library not ready or construction failed).
    Loading,
    /// Handle bound to the current identifier.
    Ready,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
        }
    }
}

pub struct PlaybackController {
    mount: MountPoint,
    options: PlayerOptions,
    notice_tx: mpsc::UnboundedSender<StateNotice>,
    library: Option<Arc<dyn PlayerLibrary>>,
    video_id: Option<VideoId>,
    handle: Option<Box<dyn PlayerHandle>>,
    /// Generation of the most recently constructed handle.
    generation: u64,
    playing: bool,
}

impl PlaybackController {
    pub fn new(
        mount: MountPoint,
        options: PlayerOptions,
        notice_tx: mpsc::UnboundedSender<StateNotice>,
    ) -> Self {
        Self {
            mount,
            options,
            notice_tx,
            library: None,
            video_id: None,
            handle: None,
            generation: 0,
            playing: false,
        }
    }

    // ── queries ──────────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        match (&self.video_id, &self.handle) {
            (None, _) => Phase::Idle,
            (Some(_), None) => Phase::Loading,
            (Some(_), Some(_)) => Phase::Ready,
        }
    }

    /// The Playback Flag.  Always false without a live handle.
    pub fn is_playing(&self) -> bool {
        self.handle.is_some() && self.playing
    }

    pub fn video_id(&self) -> Option<&VideoId> {
        self.video_id.as_ref()
    }

    pub fn mount(&self) -> &MountPoint {
        &self.mount
    }

    pub fn is_library_ready(&self) -> bool {
        self.library.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn shows_placeholder(&self) -> bool {
        self.phase() == Phase::Idle
    }

    // ── inputs ───────────────────────────────────────────────────────────────

    /// Raw text changed: re-run extraction and follow the result.
    pub fn set_input(&mut self, raw: &str) -> Phase {
        self.set_identifier(video_id::extract(raw))
    }

    pub fn set_identifier(&mut self, id: Option<VideoId>) -> Phase {
        match id {
            None => {
                if let Some(old) = self.video_id.take() {
                    info!("controller: identifier {} cleared → idle", old);
                }
                self.release_handle();
            }
            Some(id) => {
                if self.video_id.as_ref() == Some(&id) && self.handle.is_some() {
                    return self.phase();
                }
                info!("controller: identifier → {}", id);
                self.video_id = Some(id);
                self.construct_if_ready();
            }
        }
        self.phase()
    }

    /// The library finished loading.  Only the first call counts.
    pub fn on_library_ready(&mut self, library: Arc<dyn PlayerLibrary>) -> Phase {
        if self.library.is_some() {
            debug!("controller: duplicate library readiness ignored");
            return self.phase();
        }
        info!("controller: player library ready");
        self.library = Some(library);
        self.construct_if_ready();
        self.phase()
    }

    /// Apply a state-change notice.  Returns `true` if the flag changed.
    pub fn on_state_changed(&mut self, notice: StateNotice) -> bool {
        if self.handle.is_none() || notice.generation != self.generation {
            debug!(
                "controller: stale notice gen={} (current {}) dropped",
                notice.generation, self.generation
            );
            return false;
        }
        let playing = notice.state.is_playing();
        let changed = playing != self.playing;
        if changed {
            debug!("controller: playing {} → {}", self.playing, playing);
        }
        self.playing = playing;
        changed
    }

    // ── transport ────────────────────────────────────────────────────────────

    /// Seek to zero and resume.  Backs both the rotate and repeat buttons.
    /// Returns `false` when there is no handle.
    pub fn restart_from_beginning(&mut self) -> bool {
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };
        handle.seek_to_start();
        handle.play();
        true
    }

    /// Pause when the flag says playing, otherwise play.  Returns the
    /// intended playing state, or `None` when there is no handle.
    pub fn toggle_play_pause(&mut self) -> Option<bool> {
        let playing = self.playing;
        let handle = self.handle.as_mut()?;
        if playing {
            handle.pause();
        } else {
            handle.play();
        }
        Some(!playing)
    }

    /// Dispose the live handle, if any.  The identifier is kept.
    pub fn shutdown(&mut self) {
        self.release_handle();
    }

    // ── internals ────────────────────────────────────────────────────────────

    fn construct_if_ready(&mut self) {
        let (Some(library), Some(id)) = (self.library.clone(), self.video_id.clone()) else {
            return;
        };

        self.release_handle();
        self.generation += 1;
        let generation = self.generation;

        match library.construct(&self.mount, &id, &self.options) {
            Ok(mut handle) => {
                let tx = self.notice_tx.clone();
                handle.subscribe_state_changed(Box::new(move |state| {
                    let _ = tx.send(StateNotice { generation, state });
                }));
                info!(
                    "controller: player gen={} bound to {} on {}",
                    generation, id, self.mount
                );
                self.handle = Some(handle);
            }
            Err(e) => {
                warn!("controller: construction for {} failed: {}", id, e);
            }
        }
    }

    fn release_handle(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            debug!("controller: disposing player gen={}", self.generation);
            handle.dispose();
        }
        self.playing = false;
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.release_handle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_controller() -> PlaybackController {
        let (tx, _rx) = mpsc::unbounded_channel();
        PlaybackController::new(MountPoint::default(), PlayerOptions::default(), tx)
    }

    #[test]
    fn starts_idle_with_placeholder() {
        let c = idle_controller();
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.shows_placeholder());
        assert!(!c.is_playing());
        assert!(c.video_id().is_none());
    }

    #[test]
    fn transport_is_inert_while_idle() {
        let mut c = idle_controller();
        assert!(!c.restart_from_beginning());
        assert_eq!(c.toggle_play_pause(), None);
        assert_eq!(c.phase(), Phase::Idle);
        assert!(!c.is_playing());
    }

    #[test]
    fn identifier_without_library_is_loading() {
        let mut c = idle_controller();
        assert_eq!(c.set_input("https://youtu.be/dQw4w9WgXcQ"), Phase::Loading);
        assert_eq!(c.video_id().map(|v| v.as_str()), Some("dQw4w9WgXcQ"));
        assert!(!c.shows_placeholder());
        // still inert: no handle yet
        assert!(!c.restart_from_beginning());
        assert_eq!(c.toggle_play_pause(), None);
    }

    #[test]
    fn notices_without_handle_are_ignored() {
        let mut c = idle_controller();
        let changed = c.on_state_changed(StateNotice {
            generation: 0,
            state: crate::player::PlayerState::Playing,
        });
        assert!(!changed);
        assert!(!c.is_playing());
    }

    #[test]
    fn unmatched_input_returns_to_idle() {
        let mut c = idle_controller();
        c.set_input("youtu.be/abc12345678");
        assert_eq!(c.set_input("youtu.be/abc"), Phase::Idle);
        assert!(c.shows_placeholder());
    }
}
