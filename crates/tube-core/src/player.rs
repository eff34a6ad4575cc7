//! The contract the playback controller expects from an external player.
//!
//! The controller never sees a concrete player type.  A `PlayerLibrary`
//! constructs handles; a `PlayerHandle` accepts fire-and-forget transport
//! requests and reports state changes through a listener.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::video_id::VideoId;

/// Tri-state payload carried by state-change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    Playing,
    Paused,
    /// Buffering, unstarted, ended, errored, ... anything that isn't the two
    /// states above.
    Other,
}

impl PlayerState {
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Other => "idle",
        }
    }
}

/// A state change tagged with the generation of the handle that produced it.
/// Notices from superseded handles are dropped by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateNotice {
    pub generation: u64,
    pub state: PlayerState,
}

/// Callback invoked by a handle whenever its playback state changes.
pub type StateListener = Box<dyn Fn(PlayerState) + Send + Sync + 'static>;

/// Named target the player attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MountPoint(String);

impl MountPoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MountPoint {
    fn default() -> Self {
        Self::new("youtube-player")
    }
}

impl fmt::Display for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display options passed to the library on every construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerOptions {
    #[serde(default = "default_height")]
    pub height: u32,
    /// Pixel count (`"854"`) or a percentage of the screen (`"100%"`).
    #[serde(default = "default_width")]
    pub width: String,
    #[serde(default)]
    pub autoplay: bool,
    /// Show the player's own on-screen controls.
    #[serde(default = "default_true")]
    pub controls: bool,
    /// Keep the player chrome minimal (no title bar overlay).
    #[serde(default = "default_true")]
    pub modest_branding: bool,
}

fn default_height() -> u32 {
    480
}

fn default_width() -> String {
    "100%".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            height: default_height(),
            width: default_width(),
            autoplay: false,
            controls: true,
            modest_branding: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("player rejected {video_id}: {reason}")]
    Rejected { video_id: String, reason: String },
    #[error("player library unavailable: {0}")]
    Unavailable(String),
}

/// One live playback session.
///
/// All transport calls are requests: they return immediately and the
/// authoritative outcome arrives later through the state listener.
pub trait PlayerHandle: Send {
    fn seek_to_start(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    /// Register the listener for state changes.  A handle holds at most one
    /// listener; subscribing again replaces it.
    fn subscribe_state_changed(&mut self, listener: StateListener);
    /// Unsubscribe and detach from the mount point.  Called exactly once,
    /// before the controller drops the handle.
    fn dispose(&mut self);
}

/// The loaded player library.  Only available after readiness resolves.
pub trait PlayerLibrary: Send + Sync {
    fn construct(
        &self,
        mount: &MountPoint,
        video_id: &VideoId,
        options: &PlayerOptions,
    ) -> Result<Box<dyn PlayerHandle>, PlayerError>;
}
