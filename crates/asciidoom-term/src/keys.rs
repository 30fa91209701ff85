// SPDX-License-Identifier: MIT
//
// Logical keys: what the engine sees, decoupled from the bytes that
// produced them.
//
// A key code is one byte. Printable keys are their lower-cased ASCII value,
// so `W` and `w` are the same key. Named keys (arrows, function keys,
// navigation) use the engine's own numbering, which lives above 0x7F so it
// never collides with ASCII. Code 0 means "no key" and never enters a set.
//
// Raw bytes 0x80..=0xFF pass through unchanged, so they share codes with the
// named keys: the trailing byte of UTF-8 `í` (C3 AD) reads as UP. The engine
// numbering leaves no room to tell them apart, and this is accepted.

use std::fmt;

// ─── KeyCode ────────────────────────────────────────────────────────────────

/// A logical key code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(u8);

impl KeyCode {
    pub const RIGHT: Self = Self(0xAE);
    pub const LEFT: Self = Self(0xAC);
    pub const UP: Self = Self(0xAD);
    pub const DOWN: Self = Self(0xAF);
    pub const ESCAPE: Self = Self(27);
    pub const ENTER: Self = Self(13);
    pub const TAB: Self = Self(9);
    pub const BACKSPACE: Self = Self(0x7F);

    pub const F1: Self = Self(0x80 + 0x3B);
    pub const F2: Self = Self(0x80 + 0x3C);
    pub const F3: Self = Self(0x80 + 0x3D);
    pub const F4: Self = Self(0x80 + 0x3E);
    pub const F5: Self = Self(0x80 + 0x3F);
    pub const F6: Self = Self(0x80 + 0x40);
    pub const F7: Self = Self(0x80 + 0x41);
    pub const F8: Self = Self(0x80 + 0x42);
    pub const F9: Self = Self(0x80 + 0x43);
    pub const F10: Self = Self(0x80 + 0x44);
    pub const F11: Self = Self(0x80 + 0x57);
    pub const F12: Self = Self(0x80 + 0x58);

    pub const HOME: Self = Self(0x80 + 0x47);
    pub const END: Self = Self(0x80 + 0x4F);
    pub const PAGE_UP: Self = Self(0x80 + 0x49);
    pub const PAGE_DOWN: Self = Self(0x80 + 0x51);
    pub const INSERT: Self = Self(0x80 + 0x52);
    pub const DELETE: Self = Self(0x80 + 0x53);

    /// Key code for a raw input byte, case-folded.
    ///
    /// Returns `None` for byte 0, which has no key.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        if byte == 0 {
            None
        } else {
            Some(Self(byte.to_ascii_lowercase()))
        }
    }

    /// Key code for a printable character, case-folded.
    ///
    /// Only meaningful for ASCII; other characters have no key.
    #[must_use]
    pub const fn from_char(ch: char) -> Option<Self> {
        if ch.is_ascii() {
            Self::from_byte(ch as u8)
        } else {
            None
        }
    }

    /// The raw code handed to the engine.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Human-readable name for logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RIGHT => "Right",
            Self::LEFT => "Left",
            Self::UP => "Up",
            Self::DOWN => "Down",
            Self::ESCAPE => "Escape",
            Self::ENTER => "Enter",
            Self::TAB => "Tab",
            Self::BACKSPACE => "Backspace",
            Self::HOME => "Home",
            Self::END => "End",
            Self::PAGE_UP => "PageUp",
            Self::PAGE_DOWN => "PageDown",
            Self::INSERT => "Insert",
            Self::DELETE => "Delete",
            Self::F1 => "F1",
            Self::F2 => "F2",
            Self::F3 => "F3",
            Self::F4 => "F4",
            Self::F5 => "F5",
            Self::F6 => "F6",
            Self::F7 => "F7",
            Self::F8 => "F8",
            Self::F9 => "F9",
            Self::F10 => "F10",
            Self::F11 => "F11",
            Self::F12 => "F12",
            _ => "",
        }
    }
}

impl fmt::Debug for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        if !name.is_empty() {
            f.write_str(name)
        } else if self.0.is_ascii_graphic() || self.0 == b' ' {
            write!(f, "{:?}", self.0 as char)
        } else {
            write!(f, "0x{:02X}", self.0)
        }
    }
}

// ─── KeySet ─────────────────────────────────────────────────────────────────

/// Keys held during one tick, in first-seen order, without duplicates.
///
/// Never larger than the chunk(s) it was decoded from, so a linear scan
/// beats hashing here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    keys: Vec<KeyCode>,
}

impl KeySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
        }
    }

    /// Add `key` unless it is already present. Returns `true` if added.
    pub fn insert(&mut self, key: KeyCode) -> bool {
        if self.contains(key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    #[must_use]
    pub fn contains(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys.iter().copied()
    }

    /// Empty the set, keeping its allocation.
    pub fn clear(&mut self) {
        self.keys.clear();
    }
}

impl FromIterator<KeyCode> for KeySet {
    fn from_iter<I: IntoIterator<Item = KeyCode>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

// ─── KeyEvent ───────────────────────────────────────────────────────────────

/// Press / release distinction. Holding a key is never re-signalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Press,
    Release,
}

/// One edge of a key's held state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    #[must_use]
    pub const fn press(key: KeyCode) -> Self {
        Self {
            key,
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn release(key: KeyCode) -> Self {
        Self {
            key,
            kind: KeyEventKind::Release,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_press(self) -> bool {
        matches!(self.kind, KeyEventKind::Press)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn k(ch: char) -> KeyCode {
        KeyCode::from_char(ch).unwrap()
    }

    #[test]
    fn from_byte_folds_case() {
        assert_eq!(KeyCode::from_byte(b'W'), KeyCode::from_byte(b'w'));
        assert_eq!(KeyCode::from_byte(b'W').unwrap().code(), b'w');
    }

    #[test]
    fn from_byte_zero_is_no_key() {
        assert_eq!(KeyCode::from_byte(0), None);
    }

    #[test]
    fn from_byte_keeps_non_letters() {
        assert_eq!(KeyCode::from_byte(b' ').unwrap().code(), b' ');
        assert_eq!(KeyCode::from_byte(b'1').unwrap().code(), b'1');
        assert_eq!(KeyCode::from_byte(b'\t'), Some(KeyCode::TAB));
        assert_eq!(KeyCode::from_byte(0x7F), Some(KeyCode::BACKSPACE));
    }

    #[test]
    fn high_bytes_alias_named_keys() {
        assert_eq!(KeyCode::from_byte(0xAD), Some(KeyCode::UP));
        assert_eq!(KeyCode::from_byte(0xC3).unwrap().code(), 0xC3);
    }

    #[test]
    fn from_char_rejects_non_ascii() {
        assert_eq!(KeyCode::from_char('é'), None);
    }

    #[test]
    fn named_keys_live_above_ascii() {
        for key in [
            KeyCode::UP,
            KeyCode::DOWN,
            KeyCode::LEFT,
            KeyCode::RIGHT,
            KeyCode::F1,
            KeyCode::F12,
            KeyCode::HOME,
            KeyCode::DELETE,
        ] {
            assert!(key.code() > 0x7F, "{key:?}");
        }
    }

    #[test]
    fn debug_names() {
        assert_eq!(format!("{:?}", KeyCode::UP), "Up");
        assert_eq!(format!("{:?}", k('w')), "'w'");
        assert_eq!(format!("{:?}", KeyCode::from_byte(0x01).unwrap()), "0x01");
    }

    #[test]
    fn key_set_suppresses_duplicates() {
        let mut set = KeySet::new();
        assert!(set.insert(k('a')));
        assert!(!set.insert(k('a')));
        assert!(set.insert(k('b')));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn key_set_preserves_first_seen_order() {
        let set: KeySet = [k('c'), k('a'), k('c'), k('b')].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![k('c'), k('a'), k('b')]);
    }

    #[test]
    fn key_set_clear() {
        let mut set: KeySet = [k('x')].into_iter().collect();
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(k('x')));
    }

    #[test]
    fn key_event_constructors() {
        assert!(KeyEvent::press(KeyCode::UP).is_press());
        assert!(!KeyEvent::release(KeyCode::UP).is_press());
    }
}
