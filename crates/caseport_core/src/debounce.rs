use std::time::{Duration, Instant};

/// Single-slot re-armable countdown.
///
/// At most one deadline is live at a time; arming replaces any outstanding
/// deadline wholesale. The host owns the clock: it passes `Instant`s in and
/// drives expiry by calling [`Debounce::fire`] from its tick loop, so no
/// timer can outlive the owning component.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Cancel-then-schedule: replaces any outstanding deadline with
    /// `now + delay`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true and disarms when an armed deadline has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
