// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit. This module just knows the byte-level
// encoding of the handful of terminal commands the presentation layer uses.
//
// The frame serializer sizes its buffer from the length constants here, so
// any new sequence it emits must come with a worst-case length.

use std::io::{self, Write};

/// Cursor to the top-left cell (CUP with no parameters).
pub const CURSOR_HOME: &[u8] = b"\x1b[H";

/// Reset all SGR attributes (SGR 0).
pub const RESET: &[u8] = b"\x1b[0m";

/// Longest truecolor foreground sequence: `ESC[38;2;255;255;255m`.
pub const FG_RGB_MAX_LEN: usize = b"\x1b[38;2;255;255;255m".len();

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to the top-left corner without clearing anything.
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CURSOR_HOME)
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(RESET)
}

/// Enter the alternate screen buffer (DEC Private Mode 1049).
///
/// The original shell content comes back untouched on exit.
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Exit the alternate screen buffer and restore original content.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Color ───────────────────────────────────────────────────────────────────

/// Set a 24-bit `TrueColor` foreground.
///
/// At most [`FG_RGB_MAX_LEN`] bytes.
pub fn fg_rgb(w: &mut impl Write, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[38;2;{r};{g};{b}m")
}

// ─── Window Title ────────────────────────────────────────────────────────────

/// Set the window title (OSC 2, BEL-terminated).
///
/// Control characters are dropped from `title` so it cannot terminate the
/// OSC early or smuggle in sequences of its own.
pub fn set_title(w: &mut impl Write, title: &str) -> io::Result<()> {
    w.write_all(b"\x1b]2;")?;
    for ch in title.chars().filter(|c| !c.is_control()) {
        let mut enc = [0u8; 4];
        w.write_all(ch.encode_utf8(&mut enc).as_bytes())?;
    }
    w.write_all(b"\x07")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cursor_sequences() {
        assert_eq!(emit(|w| cursor_home(w)), "\x1b[H");
        assert_eq!(emit(|w| cursor_hide(w)), "\x1b[?25l");
        assert_eq!(emit(|w| cursor_show(w)), "\x1b[?25h");
    }

    #[test]
    fn screen_sequences() {
        assert_eq!(emit(|w| reset(w)), "\x1b[0m");
        assert_eq!(emit(|w| enter_alt_screen(w)), "\x1b[?1049h");
        assert_eq!(emit(|w| exit_alt_screen(w)), "\x1b[?1049l");
    }

    #[test]
    fn fg_rgb_encoding() {
        assert_eq!(emit(|w| fg_rgb(w, 1, 22, 255)), "\x1b[38;2;1;22;255m");
    }

    #[test]
    fn fg_rgb_never_exceeds_max_len() {
        for v in [0u8, 9, 10, 99, 100, 255] {
            let s = emit(|w| fg_rgb(w, v, v, v));
            assert!(s.len() <= FG_RGB_MAX_LEN, "{s:?}");
        }
        assert_eq!(emit(|w| fg_rgb(w, 255, 255, 255)).len(), FG_RGB_MAX_LEN);
    }

    #[test]
    fn fg_rgb_max_len_value() {
        assert_eq!(FG_RGB_MAX_LEN, 19);
    }

    #[test]
    fn title_is_osc2() {
        assert_eq!(emit(|w| set_title(w, "DOOM")), "\x1b]2;DOOM\x07");
    }

    #[test]
    fn title_strips_control_characters() {
        assert_eq!(
            emit(|w| set_title(w, "a\x07b\x1b[2Jc\n")),
            "\x1b]2;ab[2Jc\x07"
        );
    }

    #[test]
    fn title_keeps_unicode() {
        assert_eq!(emit(|w| set_title(w, "héllo")), "\x1b]2;héllo\x07");
    }
}
