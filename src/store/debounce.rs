//! Write coalescing for the row snapshot
//!
//! Policy: every mutation schedules a write `window` after itself,
//! cancelling whatever was scheduled before. A burst of mutations therefore
//! produces one write, issued once the burst has been quiet for `window`.
//! Anything still pending at exit is flushed by the owner.

use std::time::{Duration, Instant};

pub const PERSIST_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    due: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(PERSIST_WINDOW)
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, due: None }
    }

    /// Cancel any pending write and reschedule it after `now`
    pub fn schedule(&mut self, now: Instant) {
        self.due = Some(now + self.window);
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    /// True exactly once, when a scheduled write has come due
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the pending write; used after an unconditional flush
    pub fn cancel(&mut self) {
        self.due = None;
    }
}
