//! Once-resolved readiness signal for the player library.
//!
//! `ready_signal()` returns a resolver/waiter pair.  The loader keeps the
//! resolver and calls `resolve` when the library can construct players; any
//! number of waiters can `wait()` for it.  A waiter that subscribes after
//! resolution is satisfied immediately, so there is no window where the
//! signal fires before anyone listens.

use tokio::sync::watch;

/// Create a fresh, unresolved signal.
pub fn ready_signal<T: Clone>() -> (ReadyResolver<T>, ReadySignal<T>) {
    let (tx, rx) = watch::channel(None);
    (ReadyResolver { tx }, ReadySignal { rx })
}

/// Write side.  Resolves at most once.
#[derive(Debug)]
pub struct ReadyResolver<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> ReadyResolver<T> {
    /// Resolve the signal.  Returns `false` (and drops `value`) if it was
    /// already resolved.
    pub fn resolve(&self, value: T) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(value);
            true
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

/// Read side.  Cheap to clone; every clone observes the same resolution.
#[derive(Debug, Clone)]
pub struct ReadySignal<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> ReadySignal<T> {
    /// Non-blocking peek.
    pub fn get(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for resolution.  Returns immediately when already resolved and
    /// `None` if the resolver was dropped without ever resolving.
    pub async fn wait(&self) -> Option<T> {
        let mut rx = self.rx.clone();
        let result = rx.wait_for(|slot| slot.is_some()).await;
        match result {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        }
    }
}
