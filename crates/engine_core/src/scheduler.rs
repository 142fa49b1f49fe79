//! One-shot deferred actions advanced by the host loop.
//!
//! Entries count down in simulation time and are handed back to the caller
//! when due. There is no cancellation path: once scheduled, an action fires.

/// A pending one-shot action with a countdown and a caller-defined payload.
#[derive(Debug, Clone, Copy)]
struct TimerEntry<T> {
    remaining: f32,
    payload: T,
}

/// Queue of one-shot deferred actions.
///
/// The payload type is whatever the caller needs to act on when the timer
/// fires (an entity to despawn, a collider to re-arm, …).
#[derive(Debug)]
pub struct Scheduler<T> {
    entries: Vec<TimerEntry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Schedule `payload` to come due after `delay` seconds.
    pub fn schedule(&mut self, delay: f32, payload: T) {
        self.entries.push(TimerEntry {
            remaining: delay,
            payload,
        });
    }

    /// Advance all timers by `dt` and return the payloads that came due,
    /// in the order they were scheduled.
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        for entry in &mut self.entries {
            entry.remaining -= dt;
        }

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].remaining <= 0.0 {
                due.push(self.entries.remove(i).payload);
            } else {
                i += 1;
            }
        }
        due
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
