// SPDX-License-Identifier: MIT
//
// Frame serializer — pixels in, one terminal write out.
//
// Two renderings of an ARGB pixel buffer:
//
//   Gradient  brightness picks a character from an ordered ramp. Only every
//             second row is sampled because a terminal cell is roughly twice
//             as tall as it is wide.
//
//   Color     every pixel becomes a truecolor foreground escape followed by
//             two glyphs (the doubled width squares up the cell), one row of
//             text per pixel row, and an SGR reset after the last row.
//
// Both go into a `FrameOutput` sized by `worst_case_len` at construction.
// Sizing is exact per mode, so the bounded writes never fail for pixel
// buffers of the configured dimensions. If one ever does, the frame is
// dropped whole and reported as `Error::FrameOverflow`.

use std::io::Write;

use crate::ansi;
use crate::error::{Error, Result};
use crate::output::FrameOutput;

/// Glyph pair drawn for every pixel in color mode.
pub const COLOR_GLYPHS: &[u8] = b"##";

/// Default brightness ramp, darkest first.
pub const DEFAULT_GRADIENT: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

// ─── RenderMode ──────────────────────────────────────────────────────────────

/// How pixels become text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// One ramp character per sampled pixel, every second row.
    #[default]
    Gradient,
    /// Truecolor glyph pair per pixel, every row.
    Color,
}

// ─── Gradient ────────────────────────────────────────────────────────────────

/// An ordered ramp of printable ASCII characters, darkest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gradient {
    ramp: Box<[u8]>,
}

impl Gradient {
    /// Validate and wrap a ramp.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidGradient`] if `ramp` is empty or contains anything
    /// other than printable ASCII (`0x20..=0x7E`).
    pub fn new(ramp: &str) -> Result<Self> {
        if ramp.is_empty() {
            return Err(Error::InvalidGradient("empty ramp".into()));
        }
        if let Some(bad) = ramp.chars().find(|c| !(' '..='~').contains(c)) {
            return Err(Error::InvalidGradient(format!(
                "{bad:?} is not printable ASCII"
            )));
        }
        Ok(Self {
            ramp: ramp.as_bytes().into(),
        })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ramp.len()
    }

    /// Always `false`: construction rejects empty ramps.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ramp.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.ramp
    }

    /// Ramp index for a brightness in `0..=255`.
    #[inline]
    #[must_use]
    pub fn index(&self, brightness: u8) -> usize {
        usize::from(brightness) * (self.ramp.len() - 1) / 255
    }

    /// Character for a brightness in `0..=255`.
    #[inline]
    #[must_use]
    pub fn glyph(&self, brightness: u8) -> u8 {
        self.ramp[self.index(brightness)]
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            ramp: DEFAULT_GRADIENT.as_bytes().into(),
        }
    }
}

// ─── Pixels ──────────────────────────────────────────────────────────────────

/// Split `0xAARRGGBB` into `(r, g, b)`. Alpha is ignored.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Each channel is masked to 8 bits.
pub const fn rgb(pixel: u32) -> (u8, u8, u8) {
    (
        ((pixel >> 16) & 0xFF) as u8,
        ((pixel >> 8) & 0xFF) as u8,
        (pixel & 0xFF) as u8,
    )
}

/// Unweighted channel mean.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Mean of three u8 fits in u8.
pub const fn brightness(pixel: u32) -> u8 {
    let (r, g, b) = rgb(pixel);
    ((r as u16 + g as u16 + b as u16) / 3) as u8
}

/// Ramp character for one pixel.
#[inline]
#[must_use]
pub fn pixel_to_glyph(gradient: &Gradient, pixel: u32) -> u8 {
    gradient.glyph(brightness(pixel))
}

/// Worst-case frame body size, sentinel excluded.
///
/// - Gradient: one glyph per column plus a newline, for `ceil(height / 2)`
///   sampled rows.
/// - Color: the longest color escape plus the glyph pair per pixel, a newline
///   per row, and the trailing reset.
///
/// `None` if the size does not fit in `usize`.
#[must_use]
pub fn worst_case_len(mode: RenderMode, width: usize, height: usize) -> Option<usize> {
    match mode {
        RenderMode::Gradient => width.checked_add(1)?.checked_mul(height.div_ceil(2)),
        RenderMode::Color => (ansi::FG_RGB_MAX_LEN + COLOR_GLYPHS.len())
            .checked_mul(width)?
            .checked_mul(height)?
            .checked_add(height)?
            .checked_add(ansi::RESET.len()),
    }
}

// ─── FrameSerializer ─────────────────────────────────────────────────────────

/// Packs pixel buffers of one fixed size into terminal frames.
pub struct FrameSerializer {
    width: usize,
    height: usize,
    mode: RenderMode,
    gradient: Gradient,
    out: FrameOutput,
}

impl FrameSerializer {
    /// Allocate the output buffer for `width × height` frames in `mode`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDimensions`] if either dimension is zero, or the
    /// frame buffer size would overflow `usize`.
    pub fn new(width: usize, height: usize, mode: RenderMode, gradient: Gradient) -> Result<Self> {
        let invalid = Error::InvalidDimensions { width, height };
        if width == 0 || height == 0 {
            return Err(invalid);
        }
        // Prefix and sentinel ride on top of the body.
        let body = worst_case_len(mode, width, height)
            .filter(|n| n.checked_add(ansi::CURSOR_HOME.len() + 1).is_some())
            .ok_or(invalid)?;
        let out = FrameOutput::new(ansi::CURSOR_HOME, body);
        Ok(Self {
            width,
            height,
            mode,
            gradient,
            out,
        })
    }

    #[must_use]
    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Allocated output bytes (cursor-home prefix and sentinel included).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.out.capacity()
    }

    /// Body of the last serialized frame, NUL sentinel included.
    #[must_use]
    pub fn frame(&self) -> &[u8] {
        self.out.body_with_sentinel()
    }

    /// Serialize `pixels` into the output buffer.
    ///
    /// Returns the frame body (no cursor-home prefix, no sentinel).
    ///
    /// # Errors
    ///
    /// - [`Error::PixelBufferSize`] if `pixels` is not `width × height` long.
    /// - [`Error::FrameOverflow`] if the body outgrew the buffer. The
    ///   buffer is left empty.
    pub fn serialize(&mut self, pixels: &[u32]) -> Result<&[u8]> {
        let expected = self.width * self.height;
        if pixels.len() != expected {
            return Err(Error::PixelBufferSize {
                expected,
                actual: pixels.len(),
            });
        }

        self.out.clear();
        let written = match self.mode {
            RenderMode::Gradient => self.write_gradient(pixels),
            RenderMode::Color => self.write_color(pixels),
        };
        if written.is_err() {
            self.out.clear();
            return Err(Error::FrameOverflow {
                capacity: self.out.capacity(),
            });
        }

        Ok(self.out.body())
    }

    /// Serialize `pixels` and send cursor-home plus the frame to `w` as a
    /// single write.
    ///
    /// Nothing is written if serialization fails.
    ///
    /// # Errors
    ///
    /// Serialization errors from [`serialize`](Self::serialize), or
    /// [`Error::Io`] if the write fails.
    pub fn present(&mut self, pixels: &[u32], w: &mut impl Write) -> Result<()> {
        self.serialize(pixels)?;
        self.out.flush_to(w)?;
        Ok(())
    }

    fn write_gradient(&mut self, pixels: &[u32]) -> std::io::Result<()> {
        for row in pixels.chunks_exact(self.width).step_by(2) {
            for &pixel in row {
                self.out.push(pixel_to_glyph(&self.gradient, pixel))?;
            }
            self.out.push(b'\n')?;
        }
        Ok(())
    }

    fn write_color(&mut self, pixels: &[u32]) -> std::io::Result<()> {
        for row in pixels.chunks_exact(self.width) {
            for &pixel in row {
                let (r, g, b) = rgb(pixel);
                ansi::fg_rgb(&mut self.out, r, g, b)?;
                self.out.put(COLOR_GLYPHS)?;
            }
            self.out.push(b'\n')?;
        }
        ansi::reset(&mut self.out)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
