// SPDX-License-Identifier: MIT
//
// Keyboard input pipeline.
//
// Once per tick:
//
//   InputSource ──chunks──▶ decoder ──KeySet──▶ EdgeDetector ──▶ EventQueue
//
// Every chunk read this tick is decoded into the same key set, so a key that
// shows up in two chunks still counts as held once. The edge detector then
// turns "held this tick" into press / release events for the engine to drain.
//
// Events the engine leaves in the queue are dropped before the next poll.

use tracing::debug;

use crate::decoder;
use crate::edge::{EdgeDetector, EventQueue};
use crate::error::Result;
use crate::keys::{KeyEvent, KeySet};
use crate::reader::InputSource;

/// Source, decoder state and event queue for one keyboard.
pub struct KeyboardInput<S> {
    source: S,
    edges: EdgeDetector,
    queue: EventQueue,
}

impl<S: InputSource> KeyboardInput<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            edges: EdgeDetector::new(),
            queue: EventQueue::new(),
        }
    }

    /// Read everything available and queue this tick's key events.
    ///
    /// Returns the number of events queued.
    ///
    /// # Errors
    ///
    /// [`Error::Io`](crate::Error::Io) if the source fails.
    pub fn poll(&mut self) -> Result<usize> {
        let dropped = self.queue.clear();
        if dropped > 0 {
            debug!(dropped, "discarding undrained key events");
        }

        let chunks = self.source.poll_chunks()?;
        let mut current = KeySet::new();
        for chunk in &chunks {
            decoder::decode_into(chunk.as_slice(), &mut current);
        }

        let queued = self.edges.update(current, &mut self.queue);
        if queued > 0 {
            debug!(chunks = chunks.len(), queued, "key edges");
        }
        Ok(queued)
    }

    /// Pop the oldest pending event.
    #[inline]
    pub fn next_event(&mut self) -> Option<KeyEvent> {
        self.queue.next_event()
    }

    /// Events still waiting to be drained.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Keys held as of the last poll.
    #[must_use]
    pub const fn held(&self) -> &KeySet {
        self.edges.held()
    }

    /// Queue releases for every held key, so nothing stays stuck down.
    pub fn release_all(&mut self) -> usize {
        self.edges.reset(&mut self.queue)
    }

    /// The underlying byte source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
