use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

/// One-second countdown for mock interviews.
///
/// The timer does not run on its own: the event loop calls [`poll`] and the
/// timer applies however many whole seconds have passed since the last tick.
///
/// [`poll`]: MockTimer::poll
#[derive(Debug, Clone)]
pub struct MockTimer {
    length_secs: u32,
    remaining: u32,
    next_tick: Option<Instant>,
}

impl MockTimer {
    pub fn new(length_secs: u32) -> Self {
        Self {
            length_secs,
            remaining: length_secs,
            next_tick: None,
        }
    }

    /// Reset to the full length and start counting down
    pub fn restart(&mut self, now: Instant) {
        self.remaining = self.length_secs;
        self.next_tick = (self.remaining > 0).then(|| now + TICK);
    }

    /// Stop without touching the remaining time
    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Apply elapsed ticks. Returns true if the display changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;

        while let Some(at) = self.next_tick {
            if now < at {
                break;
            }
            self.remaining = self.remaining.saturating_sub(1);
            changed = true;
            self.next_tick = if self.remaining == 0 {
                None
            } else {
                Some(at + TICK)
            };
        }

        changed
    }

    /// Remaining time as `MM:SS`
    pub fn display(&self) -> String {
        format_time(self.remaining)
    }
}

pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
