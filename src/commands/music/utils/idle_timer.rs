//! Deferred "leave voice" action for an idle session.
//!
//! The timer only *announces* that it elapsed by calling its callback with its
//! id. The owning session decides what firing means, and uses [`IdleTimer::claim`]
//! to tell a live firing apart from one that lost a race with `cancel`.

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

struct ActiveTimer {
    id: u64,
    handle: JoinHandle<()>,
}

/// At most one pending idle timer. Starting a new one cancels the old one.
#[derive(Default)]
pub struct IdleTimer {
    next_id: u64,
    active: Option<ActiveTimer>,
}

impl IdleTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `on_elapsed(id)` after `timeout`, replacing any active timer.
    /// Returns the id of the new timer.
    pub fn start<F>(&mut self, timeout: Duration, on_elapsed: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();

        self.next_id += 1;
        let id = self.next_id;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            on_elapsed(id);
        });
        self.active = Some(ActiveTimer { id, handle });

        debug!("Started idle timer {} ({:?})", id, timeout);
        id
    }

    /// Cancel the active timer. Returns `false` if none was active.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(timer) => {
                timer.handle.abort();
                debug!("Cancelled idle timer {}", timer.id);
                true
            }
            None => false,
        }
    }

    /// Accept a firing. Only succeeds for the currently active timer, which is
    /// then considered spent; stale ids from cancelled timers are rejected.
    pub fn claim(&mut self, id: u64) -> bool {
        match &self.active {
            Some(timer) if timer.id == id => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
