// SPDX-License-Identifier: MIT
//
// asciidoom-term — terminal presentation layer for a pixel-pushing game loop.
//
// Puts the controlling terminal into raw mode, turns stdin bytes into
// edge-triggered key events, and packs each frame of ARGB pixels into a
// single write of ASCII art (brightness gradient) or truecolor glyphs.
//
// No TUI framework underneath: termios through libc, ANSI escape sequences
// written by hand into a buffer sized once for the worst-case frame.
//
//   terminal   raw-mode session, restored on drop and on panic
//   reader     stdin chunk sources (non-blocking, or a polling thread)
//   decoder    escape sequences → logical key codes
//   edge       held-key sets → press / release events
//   frame      pixels → one frame of text
//   frontend   the per-session context the engine talks to
//   tick_loop  fixed-rate loop driving an `Engine`

pub mod ansi;
pub mod config;
pub mod decoder;
pub mod edge;
pub mod error;
pub mod frame;
pub mod frontend;
pub mod input;
pub mod keys;
pub mod output;
pub mod reader;
pub mod terminal;
pub mod tick_loop;

pub use config::{FrontendConfig, InputMode};
pub use error::{Error, Result};
pub use frame::{Gradient, RenderMode};
pub use frontend::Frontend;
pub use keys::{KeyCode, KeyEvent, KeyEventKind};
pub use terminal::Features;
pub use tick_loop::{Action, Engine, TickLoop};
