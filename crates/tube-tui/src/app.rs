//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components, `AppState` and the `PlaybackController`.
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks
//!   (terminal input, library readiness).
//! - Player state notices arrive on their own channel straight from the
//!   handle's listener.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - The controller is only ever touched from this loop.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tube_core::config::Config;
use tube_core::{Phase, PlaybackController, PlayerLibrary, ReadySignal, StateNotice};

use crate::{
    action::{Action, ComponentId},
    app_state::{AppState, LibraryStatus},
    component::Component,
    components::{
        header::Header,
        help_overlay::HelpOverlay,
        log_panel::{stamp, LogPanel},
        player_pane::PlayerPane,
        transport::Transport,
        url_bar::UrlBar,
    },
    focus::FocusRing,
    intent::PlayIntent,
    player::SharedLibrary,
    widgets::status_bar,
};

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    LibraryReady(SharedLibrary),
    /// The loader gave up; readiness will never resolve.
    LibraryUnavailable,
    /// Result of one liveness check against the player process.
    Heartbeat { alive: bool },
}

/// Screen areas from the last draw, for mouse hit-testing.
#[derive(Default, Clone, Copy)]
struct PaneAreas {
    url_bar: Rect,
    transport: Rect,
    log_panel: Rect,
}

const HEARTBEAT: Duration = Duration::from_secs(10);

pub struct App {
    state: AppState,
    controller: PlaybackController,
    notice_rx: mpsc::UnboundedReceiver<StateNotice>,
    library_signal: ReadySignal<SharedLibrary>,
    library: Option<SharedLibrary>,
    intent: PlayIntent,
    focus: FocusRing,
    initial_url: String,

    header: Header,
    url_bar: UrlBar,
    player_pane: PlayerPane,
    transport: Transport,
    log_panel: LogPanel,
    help_overlay: HelpOverlay,

    areas: PaneAreas,
    /// A liveness check is in flight; the next tick skips.
    heartbeat_pending: bool,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, library_signal: ReadySignal<SharedLibrary>) -> Self {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let mount = config.player.mount_point.clone();
        let controller =
            PlaybackController::new(mount.clone(), config.player.options.clone(), notice_tx);

        Self {
            state: AppState::new(mount, config.ui.show_keys_bar),
            controller,
            notice_rx,
            library_signal,
            library: None,
            intent: PlayIntent::new(),
            focus: FocusRing::new(vec![ComponentId::UrlBar, ComponentId::Transport]),
            initial_url: config.ui.initial_url.clone(),
            header: Header,
            url_bar: UrlBar::new(),
            player_pane: PlayerPane,
            transport: Transport::new(),
            log_panel: LogPanel::new(),
            help_overlay: HelpOverlay::new(),
            areas: PaneAreas::default(),
            heartbeat_pending: false,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);
        self.push_log("searchtube started".to_string());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: library readiness ────────────────────────────────
        let signal = self.library_signal.clone();
        let lib_tx = tx.clone();
        tokio::spawn(async move {
            let msg = match signal.wait().await {
                Some(lib) => AppMessage::LibraryReady(lib),
                None => AppMessage::LibraryUnavailable,
            };
            let _ = lib_tx.send(msg).await;
        });

        if !self.initial_url.is_empty() {
            let url = self.initial_url.clone();
            self.url_bar.set_value(&url);
            self.dispatch(Action::InputChanged(url));
        }

        // ── Periodic timers ───────────────────────────────────────────────────
        // Intent timeout check + pulse animation.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut heartbeat = tokio::time::interval(HEARTBEAT);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg);
                }

                Some(notice) = self.notice_rx.recv() => {
                    needs_redraw = self.on_notice(notice);
                }

                _ = ui_tick.tick() => {
                    let tick_actions: Vec<Action> = {
                        let s = &self.state;
                        let mut all = Vec::new();
                        all.extend(self.url_bar.tick(s));
                        all.extend(self.transport.tick(s));
                        all.extend(self.log_panel.tick(s));
                        all
                    };
                    for action in tick_actions {
                        self.dispatch(action);
                    }
                    let timed_out = self.intent.tick();
                    if timed_out {
                        warn!("play/pause toggle not confirmed by the player");
                        self.push_log("player did not confirm play/pause".to_string());
                    }
                    self.refresh_state();
                    needs_redraw = timed_out || self.intent.is_pending();
                }

                _ = heartbeat.tick() => {
                    if let Some(lib) = &self.library {
                        if self.state.library == LibraryStatus::Ready && !self.heartbeat_pending {
                            self.heartbeat_pending = true;
                            let lib = lib.clone();
                            spawn_heartbeat(
                                async move { lib.process_alive().await && lib.ping().await.is_ok() },
                                tx.clone(),
                            );
                        }
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.controller.shutdown();
        if let Some(lib) = &self.library {
            lib.shutdown().await;
        }
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("searchtube exiting");

        Ok(())
    }

    // ── Message handling ──────────────────────────────────────────────────────

    /// Returns `true` if the screen needs a redraw.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                for action in self.handle_key(key) {
                    self.dispatch(action);
                }
                true
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                let actions = self.handle_mouse(mouse);
                let redraw = !actions.is_empty();
                for action in actions {
                    self.dispatch(action);
                }
                redraw
            }
            AppMessage::Event(Event::Resize(w, h)) => {
                self.dispatch(Action::Resize(w, h));
                true
            }
            AppMessage::Event(_) => false,
            AppMessage::LibraryReady(lib) => {
                self.on_library_ready(lib);
                true
            }
            AppMessage::Heartbeat { alive } => {
                self.heartbeat_pending = false;
                if alive || self.state.library != LibraryStatus::Ready {
                    return false;
                }
                warn!("mpv stopped answering");
                self.state.library = LibraryStatus::Exited;
                self.push_log("mpv exited".to_string());
                true
            }
            AppMessage::LibraryUnavailable => {
                warn!("player library unavailable; videos will stay in loading");
                self.state.library = LibraryStatus::Unavailable;
                self.push_log("mpv unavailable (see log)".to_string());
                true
            }
        }
    }

    fn on_library_ready(&mut self, lib: SharedLibrary) {
        self.state.library = LibraryStatus::Ready;
        self.push_log("mpv ready".to_string());
        self.library = Some(lib.clone());

        let before = self.controller.generation();
        let phase = self.controller.on_library_ready(lib as Arc<dyn PlayerLibrary>);
        if self.controller.generation() != before {
            self.intent.reset();
            self.state.player_state = None;
        }
        if phase == Phase::Ready {
            if let Some(id) = self.controller.video_id() {
                let line = format!("player ready for {}", id);
                self.push_log(line);
            }
        }
        self.refresh_state();
    }

    fn on_notice(&mut self, notice: StateNotice) -> bool {
        let current = self.controller.phase() == Phase::Ready
            && notice.generation == self.controller.generation();
        if self.controller.on_state_changed(notice) {
            let line = format!("player {}", notice.state.label());
            self.push_log(line);
        }
        if current {
            self.state.player_state = Some(notice.state);
            self.intent.confirm(self.controller.is_playing());
        }
        self.refresh_state();
        current
    }

    // ── Input routing ─────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }

        // Global keys — always active regardless of focus
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                return vec![Action::Quit];
            }
            KeyCode::F(2) if !self.help_overlay.visible => return vec![Action::ToggleLogs],
            KeyCode::F(1) if !self.help_overlay.visible => return vec![Action::ToggleHelp],
            _ => {}
        }

        // Help overlay captures all keys when visible
        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }

        match key.code {
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            _ => {}
        }

        let s = &self.state;
        let focused: [&mut dyn Component; 3] =
            [&mut self.url_bar, &mut self.transport, &mut self.log_panel];
        match focused.into_iter().find(|c| self.focus.is_focused(c.id())) {
            Some(component) => component.handle_key(key, s),
            None => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let is_click = matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if !is_click {
            return vec![];
        }

        let s = &self.state;
        if self.help_overlay.visible {
            return self.help_overlay.handle_mouse(event, Rect::default(), s);
        }

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0
                && r.height > 0
                && col >= r.x
                && col < r.x + r.width
                && row >= r.y
                && row < r.y + r.height
        }

        let (col, row) = (event.column, event.row);
        let areas = self.areas;
        if hit(areas.url_bar, col, row) {
            return self.url_bar.handle_mouse(event, areas.url_bar, s);
        }
        if hit(areas.transport, col, row) {
            return self.transport.handle_mouse(event, areas.transport, s);
        }
        if hit(areas.log_panel, col, row) {
            return self.log_panel.handle_mouse(event, areas.log_panel, s);
        }
        vec![]
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.url_bar.on_action(&action, s));
            out.extend(self.transport.on_action(&action, s));
            out.extend(self.log_panel.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        self.apply_action(action);

        // depth-limited to 1 level
        for a in secondary {
            self.apply_action(a);
        }
        self.refresh_state();
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::InputChanged(text) => {
                let before = (self.controller.phase(), self.controller.generation());
                let phase = self.controller.set_input(&text);
                if (phase, self.controller.generation()) != before {
                    self.intent.reset();
                    self.state.player_state = None;
                    let line = match self.controller.video_id() {
                        Some(id) => format!("{} → {}", phase.label(), id),
                        None => phase.label().to_string(),
                    };
                    self.push_log(line);
                }
            }
            Action::Rotate | Action::Repeat => {
                if self.controller.restart_from_beginning() {
                    self.push_log("restart from 0:00".to_string());
                } else {
                    debug!("restart ignored: no player");
                }
            }
            Action::TogglePlayPause => {
                let confirmed = self.controller.is_playing();
                match self.controller.toggle_play_pause() {
                    Some(intended) => self.intent.press(intended, confirmed),
                    None => debug!("toggle ignored: no player"),
                }
            }
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),
            Action::ToggleLogs => self.rebuild_focus(),
            Action::ToggleHelp => {}
            Action::Quit => self.should_quit = true,
            Action::Resize(_, _) => {}
        }
    }

    /// The log panel joins the focus ring only while it is open.
    fn rebuild_focus(&mut self) {
        let current = self.focus.current();
        let mut items = vec![ComponentId::UrlBar, ComponentId::Transport];
        if self.log_panel.expanded {
            items.push(ComponentId::LogPanel);
        }
        self.focus = FocusRing::new(items);
        if let Some(id) = current {
            self.focus.set(id);
        }
    }

    fn refresh_state(&mut self) {
        self.state.sync_from(&self.controller);
        self.state.shown_playing = self.intent.shown(self.state.is_playing);
        self.state.play_hint = self.intent.hint();
    }

    fn push_log(&mut self, msg: String) {
        self.state.push_log(stamp(&msg));
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        let log_h = if self.log_panel.expanded { 10u16 } else { 1 };
        let status_h = if self.state.show_keys_bar { 1u16 } else { 0 };

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
                Constraint::Length(log_h),
                Constraint::Length(status_h),
            ])
            .split(area);

        self.header.draw(frame, outer[0], &self.state);

        let focused = self.focus.current();
        self.url_bar.draw(
            frame,
            outer[1],
            focused == Some(ComponentId::UrlBar) && !self.help_overlay.visible,
            &self.state,
        );
        self.areas.url_bar = outer[1];

        self.player_pane.draw(frame, outer[2], &self.state);

        self.transport.draw(
            frame,
            outer[3],
            focused == Some(ComponentId::Transport),
            &self.state,
        );
        self.areas.transport = outer[3];

        if self.log_panel.expanded {
            self.log_panel.draw(
                frame,
                outer[4],
                focused == Some(ComponentId::LogPanel),
                &self.state,
            );
            self.areas.log_panel = outer[4];
        } else {
            status_bar::draw_log_bar(frame, outer[4], self.state.last_log());
            self.areas.log_panel = Rect::default();
        }

        if self.state.show_keys_bar {
            status_bar::draw_keys_bar(frame, outer[5], focused, self.state.library);
        }

        // ── Help overlay (on top of everything) ──────────────────────────────
        self.help_overlay.draw(frame, area, false, &self.state);
    }
}

/// Run a liveness check off the event loop and report back.  A stalled mpv
/// can hold a ping for the full reply timeout.
fn spawn_heartbeat<F>(check: F, tx: mpsc::Sender<AppMessage>) -> JoinHandle<()>
where
    F: Future<Output = bool> + Send + 'static,
{
    tokio::spawn(async move {
        let alive = check.await;
        let _ = tx.send(AppMessage::Heartbeat { alive }).await;
    })
}
