//! Coalescing refresh timer.

use std::time::Duration;

use tokio::time::Instant;

/// Delay between the first trigger and the refresh it schedules.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(250);

/// Collapses bursts of triggers into one refresh per delay window.
///
/// At most one deadline is pending at a time. A trigger while one is
/// pending leaves it where it is, so a steady stream of triggers still
/// produces a refresh every `delay`. The scheduler holds no timer of its
/// own: the owner sleeps until [`UpdateScheduler::deadline`] and then calls
/// [`UpdateScheduler::take_due`].
#[derive(Debug)]
pub struct UpdateScheduler {
    delay: Duration,
    deadline: Option<Instant>,
    disposed: bool,
    cycles: u64,
}

impl UpdateScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            disposed: false,
            cycles: 0,
        }
    }

    /// Arms the deadline at `now + delay` unless one is already pending.
    ///
    /// Returns the pending deadline, or `None` once disposed.
    pub fn trigger(&mut self, now: Instant) -> Option<Instant> {
        if self.disposed {
            return None;
        }
        Some(*self.deadline.get_or_insert(now + self.delay))
    }

    /// Consumes the pending deadline if it has passed.
    ///
    /// Returns `true` when the caller should run one refresh cycle.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.cycles += 1;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels any pending deadline. Later triggers are ignored.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.deadline = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Number of refresh cycles handed out so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_DELAY)
    }
}
