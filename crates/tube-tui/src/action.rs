//! Action enum — all user-initiated intents and internal events.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    UrlBar,
    Transport,
    LogPanel,
    HelpOverlay,
}

/// The three transport buttons, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Rotate,
    Repeat,
    PlayPause,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Rotate, Button::Repeat, Button::PlayPause];

    pub fn action(self) -> Action {
        match self {
            Self::Rotate => Action::Rotate,
            Self::Repeat => Action::Repeat,
            Self::PlayPause => Action::TogglePlayPause,
        }
    }
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Input ────────────────────────────────────────────────────────────────
    InputChanged(String),

    // ── Transport ────────────────────────────────────────────────────────────
    Rotate,
    Repeat,
    TogglePlayPause,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleLogs,
    ToggleHelp,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Resize(u16, u16),
}
