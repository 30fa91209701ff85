// SPDX-License-Identifier: MIT
//
// Error taxonomy for the presentation layer.
//
// Three severities, one enum:
//
//   fatal      the terminal mode could not be queried or changed, or
//              stdout is gone. The caller restores what it can and exits.
//   contained  a single frame could not be packed (overflow, wrong pixel
//              count). The tick loop logs it and moves on to the next tick.
//   config     rejected at construction, before the session starts.
//
// Soft conditions (no input available, unknown escape sequence) never
// become errors at all.

use std::io;

use thiserror::Error;

/// Everything that can go wrong in `asciidoom-term`.
#[derive(Debug, Error)]
pub enum Error {
    /// Stdin is not connected to a terminal, so raw mode is meaningless.
    #[error("stdin is not a terminal")]
    NotATerminal,

    /// A termios or fcntl call failed.
    #[error("terminal mode change failed ({op}): {source}")]
    TerminalMode {
        /// The primitive that failed (`tcgetattr`, `tcsetattr`, `fcntl`).
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Writing the frame or reading stdin failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// The frame writer reached the end of its preallocated buffer.
    #[error("frame exceeded its {capacity}-byte buffer; frame dropped")]
    FrameOverflow {
        /// Allocated size of the output buffer.
        capacity: usize,
    },

    /// The engine handed over a pixel slice of the wrong length.
    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    PixelBufferSize { expected: usize, actual: usize },

    /// Gradient tables must be non-empty printable ASCII.
    #[error("invalid gradient: {0}")]
    InvalidGradient(String),

    /// Width and height must both be non-zero.
    #[error("invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
}

impl Error {
    /// Whether this error only affects the current tick.
    ///
    /// Contained errors are logged and skipped by the tick loop; everything
    /// else ends the session.
    #[must_use]
    pub const fn is_contained(&self) -> bool {
        matches!(self, Self::FrameOverflow { .. } | Self::PixelBufferSize { .. })
    }

    #[cfg_attr(not(unix), allow(dead_code))]
    pub(crate) fn mode(op: &'static str) -> Self {
        Self::TerminalMode {
            op,
            source: io::Error::last_os_error(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
