//! Core of the SearchTube widget: identifier extraction, the player contract,
//! library readiness and the playback controller.  Nothing in here touches
//! the terminal or spawns processes.

pub mod config;
pub mod controller;
pub mod platform;
pub mod player;
pub mod ready;
pub mod video_id;

pub use controller::{Phase, PlaybackController};
pub use player::{
    MountPoint, PlayerError, PlayerHandle, PlayerLibrary, PlayerOptions, PlayerState,
    StateListener, StateNotice,
};
pub use ready::{ready_signal, ReadyResolver, ReadySignal};
pub use video_id::{extract, VideoId};
