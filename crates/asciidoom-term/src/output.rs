// SPDX-License-Identifier: MIT
//
// Fixed-capacity frame output buffer.
//
// All bytes of a frame go into this buffer first, then reach the terminal
// in a single write() syscall. Unlike a growable Vec, the buffer is sized
// once for the worst-case frame and never reallocated: the write cursor is
// bounded by that capacity, and a write that would cross it fails instead
// of growing.
//
// Layout of a finished frame:
//
//   [prefix][body ........][0][unused ...]
//            ^ body_start   ^ cursor (always followed by NUL)
//
// The prefix holds the cursor-home sequence so that flushing `wire()` puts
// the whole frame on screen with one write.

use std::io::{self, Write};

// ─── FrameOutput ─────────────────────────────────────────────────────────────

/// Preallocated output buffer for one frame.
pub struct FrameOutput {
    buf: Box<[u8]>,
    /// Length of the fixed prefix, written once at construction.
    body_start: usize,
    /// Next byte to write. `buf[cursor]` is always the NUL sentinel.
    cursor: usize,
}

impl FrameOutput {
    /// Allocate `body_capacity` bytes of frame body after `prefix`, plus one
    /// byte for the sentinel.
    #[must_use]
    pub fn new(prefix: &[u8], body_capacity: usize) -> Self {
        let total = prefix.len() + body_capacity + 1;
        let mut buf = vec![0u8; total].into_boxed_slice();
        buf[..prefix.len()].copy_from_slice(prefix);
        Self {
            buf,
            body_start: prefix.len(),
            cursor: prefix.len(),
        }
    }

    /// Total allocated bytes, prefix and sentinel included.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes of body the buffer can hold.
    #[inline]
    #[must_use]
    pub fn body_capacity(&self) -> usize {
        self.buf.len() - self.body_start - 1
    }

    /// Number of body bytes written so far.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.cursor - self.body_start
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cursor == self.body_start
    }

    /// Frame body written so far (no prefix, no sentinel).
    #[inline]
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.buf[self.body_start..self.cursor]
    }

    /// Body followed by its NUL sentinel.
    #[inline]
    #[must_use]
    pub fn body_with_sentinel(&self) -> &[u8] {
        &self.buf[self.body_start..=self.cursor]
    }

    /// Prefix plus body: exactly the bytes that go to the terminal.
    #[inline]
    #[must_use]
    pub fn wire(&self) -> &[u8] {
        &self.buf[..self.cursor]
    }

    /// Rewind to an empty body. Keeps the allocation and prefix.
    #[inline]
    pub fn clear(&mut self) {
        self.cursor = self.body_start;
        self.buf[self.cursor] = 0;
    }

    /// Append one byte.
    ///
    /// # Errors
    ///
    /// `WriteZero` if the body is already full.
    #[inline]
    pub fn push(&mut self, byte: u8) -> io::Result<()> {
        self.put(&[byte])
    }

    /// Append a byte slice, all or nothing.
    ///
    /// # Errors
    ///
    /// `WriteZero` if the slice does not fit. Nothing is written in that case.
    pub fn put(&mut self, bytes: &[u8]) -> io::Result<()> {
        let end = self.cursor + bytes.len();
        // The last byte is reserved for the sentinel.
        if end >= self.buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "frame output buffer full",
            ));
        }
        self.buf[self.cursor..end].copy_from_slice(bytes);
        self.cursor = end;
        self.buf[self.cursor] = 0;
        Ok(())
    }

    /// Write prefix and body to `w` in one call, then flush.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_all(self.wire())?;
        w.flush()
    }
}

impl Write for FrameOutput {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.put(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Real flushing via flush_to().
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_empty_and_terminated() {
        let out = FrameOutput::new(b"\x1b[H", 8);
        assert!(out.is_empty());
        assert_eq!(out.len(), 0);
        assert_eq!(out.body_with_sentinel(), b"\0");
        assert_eq!(out.wire(), b"\x1b[H");
    }

    #[test]
    fn capacity_accounts_for_prefix_and_sentinel() {
        let out = FrameOutput::new(b"ab", 10);
        assert_eq!(out.capacity(), 13);
        assert_eq!(out.body_capacity(), 10);
    }

    #[test]
    fn write_trait() {
        let mut out = FrameOutput::new(b"", 16);
        write!(out, "hello {}", 42).unwrap();
        assert_eq!(out.body(), b"hello 42");
        assert_eq!(out.body_with_sentinel(), b"hello 42\0");
    }

    #[test]
    fn fills_exactly_to_capacity() {
        let mut out = FrameOutput::new(b"", 4);
        out.put(b"abcd").unwrap();
        assert_eq!(out.body_with_sentinel(), b"abcd\0");
    }

    #[test]
    fn overflow_is_rejected_without_partial_write() {
        let mut out = FrameOutput::new(b"", 4);
        out.put(b"ab").unwrap();
        let err = out.put(b"cde").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert_eq!(out.body_with_sentinel(), b"ab\0");
    }

    #[test]
    fn push_past_end_fails() {
        let mut out = FrameOutput::new(b"", 1);
        out.push(b'x').unwrap();
        assert!(out.push(b'y').is_err());
    }

    #[test]
    fn clear_rewinds_and_keeps_prefix() {
        let mut out = FrameOutput::new(b"P", 8);
        out.put(b"frame").unwrap();
        out.clear();
        assert!(out.is_empty());
        assert_eq!(out.wire(), b"P");
        assert_eq!(out.capacity(), 10);
    }

    #[test]
    fn flush_to_writes_prefix_and_body() {
        let mut out = FrameOutput::new(b"\x1b[H", 8);
        out.put(b"ab\n").unwrap();
        let mut dest = Vec::new();
        out.flush_to(&mut dest).unwrap();
        assert_eq!(dest, b"\x1b[Hab\n");
    }

    #[test]
    fn flush_to_does_not_send_sentinel() {
        let mut out = FrameOutput::new(b"", 8);
        out.put(b"x").unwrap();
        let mut dest = Vec::new();
        out.flush_to(&mut dest).unwrap();
        assert!(!dest.contains(&0));
    }
}
