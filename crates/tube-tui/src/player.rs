//! mpv-backed implementation of the player contract.
//!
//! `MpvLibrary` is the loaded library: one mpv process, one IPC connection.
//! Every handle it constructs shares that process.  Transport requests from
//! all handles go through a single ordered queue so that a disposed handle's
//! `stop` can never land after its successor's `loadfile`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tube_core::config::Config;
use tube_core::{
    MountPoint, PlayerError, PlayerHandle, PlayerLibrary, PlayerOptions, PlayerState,
    StateListener, VideoId,
};

use crate::mpv::{
    MpvDriver, MpvEvent, MpvHandle, OBS_CORE_IDLE, OBS_EOF_REACHED, OBS_IDLE_ACTIVE, OBS_PAUSE,
};

#[derive(Debug)]
enum SessionCommand {
    Load { url: String, paused: bool },
    SeekToStart,
    Play,
    Pause,
    Stop,
}

pub struct MpvLibrary {
    /// The window title mpv was started with; one mpv window is one mount.
    mount: MountPoint,
    mpv: MpvHandle,
    driver: Mutex<MpvDriver>,
    events: broadcast::Sender<MpvEvent>,
    queue: mpsc::UnboundedSender<SessionCommand>,
}

impl MpvLibrary {
    /// Spawn mpv, connect, and register observations.  Returning `Ok` is the
    /// library's readiness point.
    pub async fn launch(config: &Config) -> anyhow::Result<Self> {
        let binary = tube_core::platform::find_mpv_binary(config.mpv.configured_binary())
            .ok_or_else(|| anyhow::anyhow!("mpv binary not found"))?;

        let mut args = spawn_args(&config.player.mount_point, &config.player.options);
        args.extend(config.mpv.extra_args.iter().cloned());

        let stderr_log = tube_core::platform::data_dir().join("mpv-stderr.log");
        let mut driver = MpvDriver::new(
            binary,
            args,
            Duration::from_millis(config.mpv.socket_timeout_ms),
        )
        .with_stderr_log(stderr_log);

        let (events, _) = broadcast::channel(256);
        let mpv = driver.spawn_and_connect(events.clone()).await?;
        mpv.observe_properties().await?;

        info!("mpv library ready on {}", driver.socket_name);
        Ok(Self::from_parts(
            config.player.mount_point.clone(),
            mpv,
            driver,
            events,
        ))
    }

    /// Wire a connected handle to a fresh session worker.
    fn from_parts(
        mount: MountPoint,
        mpv: MpvHandle,
        driver: MpvDriver,
        events: broadcast::Sender<MpvEvent>,
    ) -> Self {
        let (queue, queue_rx) = mpsc::unbounded_channel();
        tokio::spawn(session_worker(mpv.clone(), queue_rx));
        Self {
            mount,
            mpv,
            driver: Mutex::new(driver),
            events,
            queue,
        }
    }

    /// False once the mpv process has exited.
    pub async fn process_alive(&self) -> bool {
        self.driver.lock().await.process_alive()
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.mpv.ping().await
    }

    pub async fn shutdown(&self) {
        info!("mpv library shutting down");
        self.driver.lock().await.kill().await;
    }
}

/// Command-line arguments derived from the display options.
pub fn spawn_args(mount: &MountPoint, options: &PlayerOptions) -> Vec<String> {
    let mut args = vec![
        "--force-window=yes".to_string(),
        "--keep-open=yes".to_string(),
        "--ytdl=yes".to_string(),
        format!("--title={}", mount),
        format!("--autofit={}x{}", options.width, options.height),
        format!("--osc={}", if options.controls { "yes" } else { "no" }),
    ];
    if !options.modest_branding {
        args.push("--osd-playing-msg=${media-title}".to_string());
    }
    args
}

impl PlayerLibrary for MpvLibrary {
    fn construct(
        &self,
        mount: &MountPoint,
        video_id: &VideoId,
        options: &PlayerOptions,
    ) -> Result<Box<dyn PlayerHandle>, PlayerError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(PlayerError::Unavailable(
                "no async runtime to drive mpv".to_string(),
            ));
        }
        if *mount != self.mount {
            return Err(PlayerError::Rejected {
                video_id: video_id.to_string(),
                reason: format!("mpv window is mounted as {}, not {}", self.mount, mount),
            });
        }
        // Subscribe before queueing the load so no event is missed.
        let events = self.events.subscribe();
        let paused = !options.autoplay;
        self.queue
            .send(SessionCommand::Load {
                url: video_id.watch_url(),
                paused,
            })
            .map_err(|_| PlayerError::Unavailable("mpv session worker stopped".to_string()))?;

        debug!("mpv: constructed player for {} on {}", video_id, mount);
        Ok(Box::new(MpvPlayer {
            video_id: video_id.clone(),
            queue: self.queue.clone(),
            events: Some(events),
            initial: ObservedState::starting(paused),
            watcher: None,
            disposed: false,
        }))
    }
}

async fn session_worker(mpv: MpvHandle, mut rx: mpsc::UnboundedReceiver<SessionCommand>) {
    while let Some(cmd) = rx.recv().await {
        let result = match &cmd {
            SessionCommand::Load { url, paused } => mpv.load(url, *paused).await,
            SessionCommand::SeekToStart => mpv.seek_to_start().await,
            SessionCommand::Play => mpv.set_pause(false).await,
            SessionCommand::Pause => mpv.set_pause(true).await,
            SessionCommand::Stop => mpv.stop().await,
        };
        if let Err(e) = result {
            warn!("mpv: {:?} failed: {}", cmd, e);
        }
    }
    debug!("mpv session worker exiting");
}

// ── handle ────────────────────────────────────────────────────────────────────

pub struct MpvPlayer {
    video_id: VideoId,
    queue: mpsc::UnboundedSender<SessionCommand>,
    /// Taken by the watcher task on subscribe.
    events: Option<broadcast::Receiver<MpvEvent>>,
    initial: ObservedState,
    watcher: Option<JoinHandle<()>>,
    disposed: bool,
}

impl MpvPlayer {
    fn request(&self, cmd: SessionCommand) {
        if self.disposed {
            return;
        }
        if self.queue.send(cmd).is_err() {
            warn!("mpv: session worker gone, request for {} dropped", self.video_id);
        }
    }
}

impl PlayerHandle for MpvPlayer {
    fn seek_to_start(&mut self) {
        self.request(SessionCommand::SeekToStart);
    }

    fn play(&mut self) {
        self.request(SessionCommand::Play);
    }

    fn pause(&mut self) {
        self.request(SessionCommand::Pause);
    }

    fn subscribe_state_changed(&mut self, listener: StateListener) {
        if let Some(old) = self.watcher.take() {
            old.abort();
        }
        let Some(events) = self.events.take() else {
            warn!("mpv: {} already subscribed once; ignoring", self.video_id);
            return;
        };
        self.watcher = Some(tokio::spawn(watch_state(events, self.initial, listener)));
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(w) = self.watcher.take() {
            w.abort();
        }
        self.events = None;
        self.request(SessionCommand::Stop);
        self.disposed = true;
        debug!("mpv: disposed player for {}", self.video_id);
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        if let Some(w) = self.watcher.take() {
            w.abort();
        }
    }
}

async fn watch_state(
    mut events: broadcast::Receiver<MpvEvent>,
    mut observed: ObservedState,
    listener: StateListener,
) {
    let mut last: Option<PlayerState> = None;
    loop {
        match events.recv().await {
            Ok(evt) => {
                if !observed.apply(&evt) {
                    continue;
                }
                let state = observed.derive();
                if last != Some(state) {
                    last = Some(state);
                    listener(state);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("mpv: state watcher lagged by {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

// ── observed state ────────────────────────────────────────────────────────────

/// The subset of mpv properties that decides the tri-state payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedState {
    pub pause: bool,
    pub core_idle: Option<bool>,
    pub idle_active: bool,
    pub eof_reached: bool,
}

impl ObservedState {
    /// State right after a load was queued with `pause = paused`.
    pub fn starting(paused: bool) -> Self {
        Self {
            pause: paused,
            core_idle: None,
            idle_active: false,
            eof_reached: false,
        }
    }

    /// Fold one event in.  Returns `true` if anything relevant changed.
    pub fn apply(&mut self, evt: &MpvEvent) -> bool {
        let before = *self;
        if let Some((id, data)) = evt.as_property_change() {
            match id {
                OBS_PAUSE => self.pause = data.as_bool().unwrap_or(false),
                OBS_CORE_IDLE => self.core_idle = data.as_bool(),
                OBS_IDLE_ACTIVE => self.idle_active = data.as_bool().unwrap_or(false),
                OBS_EOF_REACHED => self.eof_reached = data.as_bool().unwrap_or(false),
                _ => {}
            }
        } else if evt.event_name() == Some("start-file") {
            self.eof_reached = false;
            self.core_idle = Some(true);
        }
        *self != before
    }

    pub fn derive(&self) -> PlayerState {
        if self.idle_active || self.eof_reached {
            PlayerState::Other
        } else if self.pause {
            PlayerState::Paused
        } else if self.core_idle == Some(false) {
            PlayerState::Playing
        } else {
            PlayerState::Other
        }
    }
}

/// Shared pointer type handed to the controller.
pub type SharedLibrary = Arc<MpvLibrary>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prop(id: u64, data: serde_json::Value) -> MpvEvent {
        MpvEvent {
            raw: json!({"event": "property-change", "id": id, "data": data}),
        }
    }

    #[test]
    fn unpaused_and_not_idle_is_playing() {
        let mut s = ObservedState::starting(false);
        assert_eq!(s.derive(), PlayerState::Other);
        assert!(s.apply(&prop(OBS_CORE_IDLE, json!(false))));
        assert_eq!(s.derive(), PlayerState::Playing);
    }

    #[test]
    fn pause_wins_over_core_idle() {
        let mut s = ObservedState::starting(false);
        s.apply(&prop(OBS_CORE_IDLE, json!(false)));
        s.apply(&prop(OBS_PAUSE, json!(true)));
        assert_eq!(s.derive(), PlayerState::Paused);
    }

    #[test]
    fn idle_or_ended_is_other() {
        let mut s = ObservedState::starting(false);
        s.apply(&prop(OBS_CORE_IDLE, json!(false)));
        s.apply(&prop(OBS_EOF_REACHED, json!(true)));
        assert_eq!(s.derive(), PlayerState::Other);

        let mut s = ObservedState::starting(true);
        s.apply(&prop(OBS_IDLE_ACTIVE, json!(true)));
        assert_eq!(s.derive(), PlayerState::Other);
    }

    #[test]
    fn start_file_clears_eof() {
        let mut s = ObservedState::starting(false);
        s.apply(&prop(OBS_EOF_REACHED, json!(true)));
        assert!(s.apply(&MpvEvent {
            raw: json!({"event": "start-file"})
        }));
        assert!(!s.eof_reached);
    }

    #[test]
    fn unrelated_events_change_nothing() {
        let mut s = ObservedState::starting(true);
        assert!(!s.apply(&prop(99, json!(1.5))));
        assert!(!s.apply(&MpvEvent {
            raw: json!({"event": "file-loaded"})
        }));
    }

    #[test]
    fn spawn_args_follow_options() {
        let mut opts = PlayerOptions::default();
        let args = spawn_args(&MountPoint::default(), &opts);
        assert!(args.contains(&"--title=youtube-player".to_string()));
        assert!(args.contains(&"--autofit=100%x480".to_string()));
        assert!(args.contains(&"--osc=yes".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--osd-playing-msg")));

        opts.controls = false;
        opts.modest_branding = false;
        let args = spawn_args(&MountPoint::new("side"), &opts);
        assert!(args.contains(&"--osc=no".to_string()));
        assert!(args.iter().any(|a| a.starts_with("--osd-playing-msg")));
    }

    #[tokio::test]
    async fn watcher_reports_changes_once() {
        let (tx, rx) = broadcast::channel(16);
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let task = tokio::spawn(watch_state(
            rx,
            ObservedState::starting(false),
            Box::new(move |s| sink.lock().unwrap().push(s)),
        ));

        tx.send(prop(OBS_CORE_IDLE, json!(false))).unwrap();
        tx.send(prop(OBS_CORE_IDLE, json!(false))).unwrap();
        tx.send(prop(OBS_PAUSE, json!(true))).unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![PlayerState::Playing, PlayerState::Paused]
        );
    }

    #[tokio::test]
    async fn disposed_player_sends_stop_then_ignores_requests() {
        let (queue, mut queue_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(4);
        let mut player = MpvPlayer {
            video_id: VideoId::parse("dQw4w9WgXcQ").unwrap(),
            queue,
            events: Some(events.subscribe()),
            initial: ObservedState::starting(true),
            watcher: None,
            disposed: false,
        };
        player.play();
        player.dispose();
        player.pause();

        assert!(matches!(queue_rx.recv().await, Some(SessionCommand::Play)));
        assert!(matches!(queue_rx.recv().await, Some(SessionCommand::Stop)));
        drop(player);
        assert!(queue_rx.recv().await.is_none());
    }

    fn library_over_pipe(mount: &str) -> (MpvLibrary, tokio::io::DuplexStream) {
        let (client, server) = tokio::io::duplex(4096);
        let (read_half, write_half) = tokio::io::split(client);
        let (events, _) = broadcast::channel(16);
        let mpv = crate::mpv::start_io_tasks(read_half, write_half, events.clone());
        let driver = MpvDriver::new("mpv".into(), Vec::new(), Duration::from_millis(10));
        (
            MpvLibrary::from_parts(MountPoint::new(mount), mpv, driver, events),
            server,
        )
    }

    #[tokio::test]
    async fn construct_for_another_mount_is_rejected() {
        let (lib, _peer) = library_over_pipe("main");
        let id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        let err = lib
            .construct(&MountPoint::new("side"), &id, &PlayerOptions::default())
            .err()
            .expect("foreign mount must be rejected");
        assert!(matches!(
            err,
            PlayerError::Rejected { ref video_id, .. } if video_id == "dQw4w9WgXcQ"
        ));

        assert!(lib
            .construct(&MountPoint::new("main"), &id, &PlayerOptions::default())
            .is_ok());
    }
}
