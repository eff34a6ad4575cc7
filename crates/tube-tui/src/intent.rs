//! Pending-intent tracking for the play/pause toggle.
//!
//! The toggle acts on the local flag and the player confirms asynchronously.
//! Between the press and the confirming notification the icon shows the
//! intended state with a pulse; if no confirmation arrives within
//! `INTENT_TIMEOUT` it turns into a warning until the next notification.

use std::time::{Duration, Instant};

pub const INTENT_TIMEOUT: Duration = Duration::from_millis(3000);

/// How to render a value that may be pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderHint {
    Normal,
    /// Pending, pulse-on frame.
    PendingVisible,
    /// Pending, pulse-off frame.
    PendingHidden,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Settled,
    Pending { intended: bool, since: Instant },
    TimedOut { intended: bool },
}

#[derive(Debug, Clone)]
pub struct PlayIntent {
    stage: Stage,
}

impl PlayIntent {
    pub fn new() -> Self {
        Self {
            stage: Stage::Settled,
        }
    }

    /// Record a toggle press.  `confirmed` is the flag at the time of the press.
    pub fn press(&mut self, intended: bool, confirmed: bool) {
        self.stage = if intended == confirmed {
            Stage::Settled
        } else {
            Stage::Pending {
                intended,
                since: Instant::now(),
            }
        };
    }

    /// A notification moved the flag to `value`.
    pub fn confirm(&mut self, value: bool) {
        match self.stage {
            Stage::Pending { intended, .. } if intended != value => {}
            _ => self.stage = Stage::Settled,
        }
    }

    /// Forget any pending intent (player replaced or cleared).
    pub fn reset(&mut self) {
        self.stage = Stage::Settled;
    }

    /// Check for timeout.  Returns `true` if the stage changed.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> bool {
        if let Stage::Pending { intended, since } = self.stage {
            if now.duration_since(since) >= INTENT_TIMEOUT {
                self.stage = Stage::TimedOut { intended };
                return true;
            }
        }
        false
    }

    /// The state to draw: the intent while one is outstanding, else `confirmed`.
    pub fn shown(&self, confirmed: bool) -> bool {
        match self.stage {
            Stage::Settled => confirmed,
            Stage::Pending { intended, .. } | Stage::TimedOut { intended } => intended,
        }
    }

    pub fn hint(&self) -> RenderHint {
        match self.stage {
            Stage::Settled => RenderHint::Normal,
            Stage::Pending { since, .. } => {
                // Pulse on/off every 400ms
                if (since.elapsed().as_millis() / 400) % 2 == 0 {
                    RenderHint::PendingVisible
                } else {
                    RenderHint::PendingHidden
                }
            }
            Stage::TimedOut { .. } => RenderHint::TimedOut,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.stage, Stage::Pending { .. })
    }
}

impl Default for PlayIntent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_then_confirm_settles() {
        let mut i = PlayIntent::new();
        i.press(true, false);
        assert!(i.is_pending());
        assert!(i.shown(false));
        i.confirm(true);
        assert_eq!(i.hint(), RenderHint::Normal);
        assert!(i.shown(true));
    }

    #[test]
    fn contrary_notification_keeps_waiting() {
        let mut i = PlayIntent::new();
        i.press(true, false);
        i.confirm(false);
        assert!(i.is_pending());
    }

    #[test]
    fn times_out_without_confirmation() {
        let mut i = PlayIntent::new();
        i.press(false, true);
        assert!(!i.tick_at(Instant::now()));
        assert!(i.tick_at(Instant::now() + INTENT_TIMEOUT));
        assert_eq!(i.hint(), RenderHint::TimedOut);
        assert!(!i.shown(true));

        // any later notification settles it
        i.confirm(true);
        assert_eq!(i.hint(), RenderHint::Normal);
    }

    #[test]
    fn pressing_towards_current_value_is_settled() {
        let mut i = PlayIntent::new();
        i.press(true, true);
        assert!(!i.is_pending());
    }
}
