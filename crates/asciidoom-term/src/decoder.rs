// SPDX-License-Identifier: MIT
//
// Escape-sequence decoder.
//
// Turns one tick's raw stdin bytes into the set of logical keys held during
// that tick. Handles:
//
// - Legacy CSI sequences (arrows, Home/End, tilde-terminated editing and
//   function keys)
// - SS3 sequences (F1-F4, plus arrows in application cursor mode)
// - A lone ESC as the Escape key
// - `\n` as Enter, every other byte as its case-folded ASCII key
//
// # Design
//
// Every step is a pure function over `&[u8]` that reports what it found and
// how many bytes it consumed. No pointer arithmetic, no reads past the end:
// running out of bytes mid-sequence is simply "no key".
//
// There is no carry-over buffer between ticks. A sequence torn across two
// reads decodes as garbage for that tick and the next one starts clean.
//
// A step that yields no key ends the scan for the chunk.

use crate::keys::{KeyCode, KeySet};

const ESC: u8 = 0x1B;

// ─── Step ───────────────────────────────────────────────────────────────────

/// Outcome of decoding one key at a cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// The key found, or `None` if the bytes form no supported key.
    pub key: Option<KeyCode>,
    /// Bytes consumed. At least 1 whenever input remains.
    pub consumed: usize,
}

impl Step {
    const fn key(key: KeyCode, consumed: usize) -> Self {
        Self {
            key: Some(key),
            consumed,
        }
    }

    const fn none(consumed: usize) -> Self {
        Self {
            key: None,
            consumed,
        }
    }
}

// ─── Chunk Decoding ─────────────────────────────────────────────────────────

/// Decode a whole chunk into a fresh key set.
#[must_use]
pub fn decode(chunk: &[u8]) -> KeySet {
    let mut keys = KeySet::with_capacity(chunk.len());
    decode_into(chunk, &mut keys);
    keys
}

/// Decode a chunk, adding its keys to `keys` with duplicate suppression.
///
/// The threaded reader may deliver several chunks per tick; each is scanned
/// independently into the same set.
pub fn decode_into(chunk: &[u8], keys: &mut KeySet) {
    let mut pos = 0;
    while pos < chunk.len() {
        let step = decode_one(&chunk[pos..]);
        let Some(key) = step.key else {
            break;
        };
        keys.insert(key);
        pos += step.consumed;
    }
}

/// Decode the key starting at `buf[0]`.
///
/// An empty slice is `Step { key: None, consumed: 0 }`.
#[must_use]
pub fn decode_one(buf: &[u8]) -> Step {
    match buf.first() {
        None => Step::none(0),
        Some(&ESC) => decode_escape(buf),
        Some(&b'\n') => Step::key(KeyCode::ENTER, 1),
        Some(&b) => Step {
            key: KeyCode::from_byte(b),
            consumed: 1,
        },
    }
}

// ── Escape sequences ────────────────────────────────────────────────────────

fn decode_escape(buf: &[u8]) -> Step {
    debug_assert_eq!(buf[0], ESC);

    match buf.get(1) {
        Some(b'[') => decode_csi(buf),
        Some(b'O') => decode_ss3(buf),
        // Nothing recognised after ESC: the Escape key itself. The next
        // byte is decoded on its own.
        _ => Step::key(KeyCode::ESCAPE, 1),
    }
}

// ── CSI (Control Sequence Introducer) ───────────────────────────────────────

fn decode_csi(buf: &[u8]) -> Step {
    debug_assert!(buf.len() >= 2 && buf[0] == ESC && buf[1] == b'[');

    let Some(&first) = buf.get(2) else {
        return Step::none(2);
    };

    let key = match first {
        b'A' => KeyCode::UP,
        b'B' => KeyCode::DOWN,
        b'C' => KeyCode::RIGHT,
        b'D' => KeyCode::LEFT,
        b'H' => KeyCode::HOME,
        b'F' => KeyCode::END,
        b'0'..=b'9' => return decode_csi_tilde(buf),
        _ => return Step::none(3),
    };

    Step::key(key, 3)
}

/// `ESC [ <digits> ~`: editing keys and F5-F12.
fn decode_csi_tilde(buf: &[u8]) -> Step {
    let (number, end) = parse_u16_at(buf, 2);

    if buf.get(end) != Some(&b'~') {
        // Unterminated, or carrying modifiers (`1;5A`): unsupported.
        return Step::none(end);
    }
    let consumed = end + 1;

    let key = match number {
        1 | 7 => KeyCode::HOME,
        2 => KeyCode::INSERT,
        3 => KeyCode::DELETE,
        4 | 8 => KeyCode::END,
        5 => KeyCode::PAGE_UP,
        6 => KeyCode::PAGE_DOWN,
        15 => KeyCode::F5,
        17 => KeyCode::F6,
        18 => KeyCode::F7,
        19 => KeyCode::F8,
        20 => KeyCode::F9,
        21 => KeyCode::F10,
        23 => KeyCode::F11,
        24 => KeyCode::F12,
        _ => return Step::none(consumed),
    };

    Step::key(key, consumed)
}

// ── SS3 (Single Shift 3) ───────────────────────────────────────────────────

fn decode_ss3(buf: &[u8]) -> Step {
    debug_assert!(buf.len() >= 2 && buf[0] == ESC && buf[1] == b'O');

    let Some(&b) = buf.get(2) else {
        return Step::none(2);
    };

    let key = match b {
        b'P' => KeyCode::F1,
        b'Q' => KeyCode::F2,
        b'R' => KeyCode::F3,
        b'S' => KeyCode::F4,
        b'A' => KeyCode::UP,
        b'B' => KeyCode::DOWN,
        b'C' => KeyCode::RIGHT,
        b'D' => KeyCode::LEFT,
        b'H' => KeyCode::HOME,
        b'F' => KeyCode::END,
        _ => return Step::none(3),
    };

    Step::key(key, 3)
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Parse a u16 from bytes starting at `start`, stopping at non-digit.
/// Returns `(value, next_position)`.
fn parse_u16_at(buf: &[u8], start: usize) -> (u16, usize) {
    let mut val: u16 = 0;
    let mut pos = start;
    while pos < buf.len() && buf[pos].is_ascii_digit() {
        val = val
            .saturating_mul(10)
            .saturating_add(u16::from(buf[pos] - b'0'));
        pos += 1;
    }
    (val, pos)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
