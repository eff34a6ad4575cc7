#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tube_core::{
    MountPoint, PlayerError, PlayerHandle, PlayerLibrary, PlayerOptions, PlayerState,
    StateListener, VideoId,
};

/// Every request a fake handle receives, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Construct { mount: String, video_id: String },
    SeekToStart(String),
    Play(String),
    Pause(String),
    Dispose(String),
}

struct Slot {
    video_id: String,
    listener: Option<StateListener>,
    disposed: bool,
}

#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    slots: Vec<Slot>,
    reject: Vec<String>,
    options: Vec<PlayerOptions>,
}

/// In-memory player library.  Clones share the same recording.
#[derive(Clone, Default)]
pub struct FakeLibrary {
    shared: Arc<Mutex<Shared>>,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_library(&self) -> Arc<dyn PlayerLibrary> {
        Arc::new(self.clone())
    }

    /// Make construction fail for `video_id`.
    pub fn reject(&self, video_id: &str) {
        self.shared.lock().unwrap().reject.push(video_id.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.shared.lock().unwrap().calls.clear();
    }

    pub fn constructed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Construct { video_id, .. } => Some(video_id),
                _ => None,
            })
            .collect()
    }

    pub fn last_options(&self) -> Option<PlayerOptions> {
        self.shared.lock().unwrap().options.last().cloned()
    }

    /// Number of handles that are live and still subscribed.
    pub fn live_subscriptions(&self) -> usize {
        self.shared
            .lock()
            .unwrap()
            .slots
            .iter()
            .filter(|s| !s.disposed && s.listener.is_some())
            .count()
    }

    /// Fire a state change from the `index`-th constructed handle, even if it
    /// has been disposed (simulates a late notification).
    pub fn emit_from(&self, index: usize, state: PlayerState) {
        let shared = self.shared.lock().unwrap();
        if let Some(listener) = shared.slots.get(index).and_then(|s| s.listener.as_ref()) {
            listener(state);
        }
    }

    /// Fire a state change from the newest handle.
    pub fn emit(&self, state: PlayerState) {
        let last = self.shared.lock().unwrap().slots.len().saturating_sub(1);
        self.emit_from(last, state);
    }
}

impl PlayerLibrary for FakeLibrary {
    fn construct(
        &self,
        mount: &MountPoint,
        video_id: &VideoId,
        options: &PlayerOptions,
    ) -> Result<Box<dyn PlayerHandle>, PlayerError> {
        let mut shared = self.shared.lock().unwrap();
        shared.calls.push(Call::Construct {
            mount: mount.to_string(),
            video_id: video_id.to_string(),
        });
        if shared.reject.iter().any(|r| r == video_id.as_str()) {
            return Err(PlayerError::Rejected {
                video_id: video_id.to_string(),
                reason: "video unavailable".to_string(),
            });
        }
        shared.options.push(options.clone());
        shared.slots.push(Slot {
            video_id: video_id.to_string(),
            listener: None,
            disposed: false,
        });
        let index = shared.slots.len() - 1;
        Ok(Box::new(FakeHandle {
            shared: self.shared.clone(),
            index,
            video_id: video_id.to_string(),
        }))
    }
}

struct FakeHandle {
    shared: Arc<Mutex<Shared>>,
    index: usize,
    video_id: String,
}

impl FakeHandle {
    fn record(&self, call: Call) {
        self.shared.lock().unwrap().calls.push(call);
    }
}

impl PlayerHandle for FakeHandle {
    fn seek_to_start(&mut self) {
        self.record(Call::SeekToStart(self.video_id.clone()));
    }

    fn play(&mut self) {
        self.record(Call::Play(self.video_id.clone()));
    }

    fn pause(&mut self) {
        self.record(Call::Pause(self.video_id.clone()));
    }

    fn subscribe_state_changed(&mut self, listener: StateListener) {
        self.shared.lock().unwrap().slots[self.index].listener = Some(listener);
    }

    fn dispose(&mut self) {
        let mut shared = self.shared.lock().unwrap();
        shared.calls.push(Call::Dispose(self.video_id.clone()));
        // Keep the listener so tests can simulate a notice racing the dispose.
        shared.slots[self.index].disposed = true;
    }
}
