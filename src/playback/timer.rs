use std::time::Duration;
use tokio::time::Instant;

/// Proof that a particular arming of the timer is still the live one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    generation: u64,
    deadline: Instant,
}

impl TimerHandle {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// Single-shot, cancellable deadline for hiding the controls overlay.
///
/// Arming always replaces the previous deadline, and arming or cancelling
/// invalidates every handle handed out before, so a stale expiry can never
/// hide the controls.
#[derive(Debug)]
pub struct HideTimer {
    delay: Duration,
    generation: u64,
    deadline: Option<Instant>,
}

impl HideTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            deadline: None,
        }
    }

    pub fn arm(&mut self, now: Instant) -> TimerHandle {
        self.generation += 1;
        let deadline = now + self.delay;
        self.deadline = Some(deadline);
        TimerHandle {
            generation: self.generation,
            deadline,
        }
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
        self.deadline = None;
    }

    /// Handle for the pending deadline, if any
    pub fn pending(&self) -> Option<TimerHandle> {
        self.deadline.map(|deadline| TimerHandle {
            generation: self.generation,
            deadline,
        })
    }

    /// Consume the pending deadline. Returns true only for the live handle,
    /// and only once.
    pub fn fire(&mut self, handle: TimerHandle) -> bool {
        if handle.generation != self.generation || self.deadline.is_none() {
            return false;
        }
        self.deadline = None;
        true
    }
}
