use std::thread;
use std::time::{Duration, Instant};

/// Absolute point in time after which a wait gives up.
///
/// Every blocking wait in the crate takes one of these, so cancellation is a
/// value threaded through the call tree rather than ambient state.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn from_now(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// The earlier of this deadline and `now + budget`. Used to give a single
    /// candidate a short slice of a larger overall window.
    pub fn bounded(&self, budget: Duration) -> Deadline {
        let candidate = Instant::now() + budget;
        Deadline {
            at: self.at.min(candidate),
        }
    }
}

/// Probe `f` until it yields a value or the deadline passes.
///
/// The probe always runs at least once, even with an already-expired
/// deadline. Sleeps are capped at the remaining budget so the wait never
/// overshoots.
pub fn poll_until<T>(
    deadline: Deadline,
    interval: Duration,
    mut f: impl FnMut() -> Option<T>,
) -> Option<T> {
    loop {
        if let Some(value) = f() {
            return Some(value);
        }
        if deadline.expired() {
            return None;
        }
        thread::sleep(interval.min(deadline.remaining()));
    }
}
