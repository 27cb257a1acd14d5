//! Rest timer: a whole-second countdown fed by the frame clock.

use std::time::{Duration, Instant};

pub const TICK: Duration = Duration::from_secs(1);

/// `next_tick` is the single scheduled callback; it exists only while `remaining > 0`.
#[derive(Debug, Default, Clone)]
pub struct RestTimer {
    remaining: u32,
    next_tick: Option<Instant>,
}

impl RestTimer {
    /// Replaces any running countdown.
    pub fn start(&mut self, seconds: u32, now: Instant) {
        self.remaining = seconds;
        self.next_tick = (seconds > 0).then(|| now + TICK);
    }

    pub fn stop(&mut self) {
        self.remaining = 0;
        self.next_tick = None;
    }

    /// One second elapsed. Returns false when there was nothing to count down.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            self.next_tick = None;
            return false;
        }
        self.remaining -= 1;
        self.next_tick = match (self.remaining, self.next_tick) {
            (0, _) => None,
            (_, Some(due)) => Some(due + TICK),
            (_, None) => None,
        };
        true
    }

    /// Fires every tick due at `now`; returns how many fired.
    pub fn advance(&mut self, now: Instant) -> u32 {
        let mut fired = 0;
        while let Some(due) = self.next_tick {
            if due > now {
                break;
            }
            self.tick();
            fired += 1;
        }
        fired
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn until_next_tick(&self, now: Instant) -> Option<Duration> {
        self.next_tick.map(|due| due.saturating_duration_since(now))
    }

    /// `m:ss`
    pub fn display(&self) -> String {
        format!("{}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}
