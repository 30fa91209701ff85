// SPDX-License-Identifier: MIT
//
// Key-edge detection.
//
// A terminal only tells us which bytes arrived; the engine wants to know
// when a key went down and when it came back up. Each tick we compare the
// keys decoded now with the keys decoded last tick:
//
//   in now, not before  → press
//   in before, not now  → release
//   in both, or neither → nothing (holding is not re-signalled)
//
// Presses come out first in the order keys appeared this tick, then
// releases in the order they appeared last tick. That ordering only exists
// so identical input always yields identical event streams.

use std::collections::VecDeque;

use crate::keys::{KeyEvent, KeySet};

// ─── EventQueue ─────────────────────────────────────────────────────────────

/// FIFO of key events for the current tick.
///
/// The engine drains it with [`next_event`](Self::next_event) until `None`.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<KeyEvent>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest pending event.
    pub fn next_event(&mut self) -> Option<KeyEvent> {
        self.events.pop_front()
    }

    pub fn push(&mut self, event: KeyEvent) {
        self.events.push_back(event);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Discard whatever the engine left behind. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.events.len();
        self.events.clear();
        dropped
    }
}

impl Iterator for EventQueue {
    type Item = KeyEvent;

    fn next(&mut self) -> Option<KeyEvent> {
        self.next_event()
    }
}

// ─── EdgeDetector ───────────────────────────────────────────────────────────

/// Remembers last tick's keys and turns the difference into events.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    previous: KeySet,
}

impl EdgeDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys considered held after the last update.
    #[must_use]
    pub const fn held(&self) -> &KeySet {
        &self.previous
    }

    /// Diff `current` against the previous tick, append the resulting
    /// events to `queue`, and remember `current` for the next tick.
    ///
    /// Returns the number of events appended.
    pub fn update(&mut self, current: KeySet, queue: &mut EventQueue) -> usize {
        let before = queue.len();

        for key in current.iter() {
            if !self.previous.contains(key) {
                queue.push(KeyEvent::press(key));
            }
        }
        for key in self.previous.iter() {
            if !current.contains(key) {
                queue.push(KeyEvent::release(key));
            }
        }

        self.previous = current;
        queue.len() - before
    }

    /// Release everything still held and forget history.
    ///
    /// Used at shutdown so the engine never sees a stuck key.
    pub fn reset(&mut self, queue: &mut EventQueue) -> usize {
        self.update(KeySet::new(), queue)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
