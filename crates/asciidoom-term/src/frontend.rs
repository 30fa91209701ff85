// SPDX-License-Identifier: MIT
//
// The terminal frontend: one context per session.
//
// Owns every piece of long-lived state the presentation layer has: the raw
// mode snapshot, the input pipeline, the frame buffer and the clock. The
// engine talks to the terminal only through this type.
//
// Field order matters for Drop. The input source goes first (which joins the
// reader thread, if any), and the raw-mode session last, so the terminal is
// restored only after nothing else can touch it.

use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::ansi;
use crate::config::{FrontendConfig, InputMode};
use crate::error::Result;
use crate::frame::{FrameSerializer, RenderMode};
use crate::input::KeyboardInput;
use crate::keys::KeyEvent;
use crate::reader::{InputSource, NonBlockingStdin, ThreadedStdin};
use crate::terminal::RawMode;

/// Engine-facing handle to the terminal.
pub struct Frontend {
    input: KeyboardInput<Box<dyn InputSource>>,
    serializer: FrameSerializer,
    out: Box<dyn Write>,
    started: Instant,
    session: Option<RawMode>,
}

impl Frontend {
    /// Validate `config`, enter raw mode and start reading stdin.
    ///
    /// # Errors
    ///
    /// - Configuration errors from [`FrontendConfig::validate`].
    /// - [`Error::NotATerminal`](crate::Error::NotATerminal) or
    ///   [`Error::TerminalMode`](crate::Error::TerminalMode) from
    ///   [`RawMode::enter`].
    /// - [`Error::Io`](crate::Error::Io) if the reader thread cannot start.
    pub fn new(config: &FrontendConfig) -> Result<Self> {
        config.validate()?;
        let serializer = serializer_for(config)?;

        // Raw mode before the reader: a threaded reader must never see
        // canonical-mode input.
        let session = RawMode::enter(config.features)?;
        let source: Box<dyn InputSource> = match config.input {
            InputMode::NonBlocking => Box::new(NonBlockingStdin::new()),
            InputMode::Threaded => Box::new(ThreadedStdin::spawn()?),
        };

        debug!(
            width = config.width,
            height = config.height,
            mode = ?config.mode,
            input = ?config.input,
            capacity = serializer.capacity(),
            "frontend ready"
        );
        Ok(Self {
            input: KeyboardInput::new(source),
            serializer,
            out: Box::new(io::stdout()),
            started: Instant::now(),
            session: Some(session),
        })
    }

    /// A frontend over arbitrary input and output, without touching the
    /// terminal mode.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`FrontendConfig::validate`].
    pub fn with_io(
        config: &FrontendConfig,
        source: Box<dyn InputSource>,
        out: Box<dyn Write>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            input: KeyboardInput::new(source),
            serializer: serializer_for(config)?,
            out,
            started: Instant::now(),
            session: None,
        })
    }

    // ── Input ────────────────────────────────────────────────────

    /// Read stdin and queue this tick's key events. Called once per tick.
    ///
    /// Events left over from the previous tick are discarded first.
    ///
    /// # Errors
    ///
    /// [`Error::Io`](crate::Error::Io) if stdin fails.
    pub fn poll_input(&mut self) -> Result<usize> {
        self.input.poll()
    }

    /// Next key event of this tick, oldest first.
    #[inline]
    pub fn next_event(&mut self) -> Option<KeyEvent> {
        self.input.next_event()
    }

    // ── Output ───────────────────────────────────────────────────

    /// Serialize `pixels` and put them on screen with one write.
    ///
    /// # Errors
    ///
    /// - [`Error::PixelBufferSize`](crate::Error::PixelBufferSize) or
    ///   [`Error::FrameOverflow`](crate::Error::FrameOverflow): the frame is
    ///   skipped, the session stays usable.
    /// - [`Error::Io`](crate::Error::Io) if stdout fails.
    pub fn draw_frame(&mut self, pixels: &[u32]) -> Result<()> {
        self.serializer.present(pixels, &mut self.out)
    }

    /// Set the terminal window title. Control characters are dropped.
    ///
    /// # Errors
    ///
    /// [`Error::Io`](crate::Error::Io) if stdout fails.
    pub fn set_window_title(&mut self, title: &str) -> Result<()> {
        ansi::set_title(&mut self.out, title)?;
        self.out.flush()?;
        Ok(())
    }

    #[must_use]
    pub const fn mode(&self) -> RenderMode {
        self.serializer.mode()
    }

    /// Frame `(width, height)` in pixels.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        self.serializer.dimensions()
    }

    // ── Clock ────────────────────────────────────────────────────

    /// Milliseconds since the frontend was created. Wraps after ~49 days.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Wrapping is the contract.
    pub fn ticks_elapsed_ms(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }

    /// Block the calling thread for `ms` milliseconds.
    pub fn sleep_ms(&self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }

    // ── Shutdown ─────────────────────────────────────────────────

    /// Release held keys and give the terminal back.
    ///
    /// Release events stay queued for a last drain. Idempotent.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalMode`](crate::Error::TerminalMode) if the saved mode
    /// cannot be reapplied.
    pub fn shutdown(&mut self) -> Result<()> {
        let released = self.input.release_all();
        if released > 0 {
            debug!(released, "released held keys at shutdown");
        }
        match self.session.as_mut() {
            Some(session) => session.restore(),
            None => Ok(()),
        }
    }

    /// Whether raw mode is still in effect.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.session.as_ref().is_some_and(RawMode::is_active)
    }
}

fn serializer_for(config: &FrontendConfig) -> Result<FrameSerializer> {
    FrameSerializer::new(
        config.width,
        config.height,
        config.mode,
        config.gradient.clone(),
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::keys::KeyCode;
    use crate::reader::RawChunk;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Output sink the test can inspect after handing a clone to the frontend.
    #[derive(Clone, Default)]
    pub(crate) struct SharedSink(pub(crate) Rc<RefCell<Vec<u8>>>);

    impl SharedSink {
        pub(crate) fn take(&self) -> Vec<u8> {
            std::mem::take(&mut self.0.borrow_mut())
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// One byte string per poll, then silence.
    pub(crate) struct Keystrokes(pub(crate) VecDeque<&'static [u8]>);

    impl InputSource for Keystrokes {
        fn poll_chunks(&mut self) -> io::Result<Vec<RawChunk>> {
            Ok(self
                .0
                .pop_front()
                .filter(|bytes| !bytes.is_empty())
                .map(RawChunk::from_slice)
                .into_iter()
                .collect())
        }
    }

    pub(crate) fn small_config(mode: RenderMode) -> FrontendConfig {
        FrontendConfig {
            width: 4,
            height: 2,
            mode,
            gradient: crate::frame::Gradient::new(" .:-=!*#%@&$").unwrap(),
            tick_interval_ms: 0,
            ..FrontendConfig::default()
        }
    }

    fn frontend(mode: RenderMode, keys: &[&'static [u8]]) -> (Frontend, SharedSink) {
        let sink = SharedSink::default();
        let frontend = Frontend::with_io(
            &small_config(mode),
            Box::new(Keystrokes(keys.iter().copied().collect())),
            Box::new(sink.clone()),
        )
        .unwrap();
        (frontend, sink)
    }

    #[test]
    fn draw_frame_writes_home_and_body() {
        let (mut fe, sink) = frontend(RenderMode::Gradient, &[]);
        fe.draw_frame(&[0xFFFF_FFFF; 8]).unwrap();
        assert_eq!(sink.take(), b"\x1b[H$$$$\n");
    }

    #[test]
    fn wrong_pixel_count_is_contained() {
        let (mut fe, sink) = frontend(RenderMode::Gradient, &[]);
        let err = fe.draw_frame(&[0; 3]).unwrap_err();
        assert!(err.is_contained());
        assert!(sink.take().is_empty());

        // Next frame still works.
        fe.draw_frame(&[0; 8]).unwrap();
        assert_eq!(sink.take(), b"\x1b[H    \n");
    }

    #[test]
    fn color_frame_goes_out() {
        let (mut fe, sink) = frontend(RenderMode::Color, &[]);
        fe.draw_frame(&[0x00FF_0000; 8]).unwrap();
        let out = sink.take();
        assert!(out.starts_with(b"\x1b[H\x1b[38;2;255;0;0m##"));
        assert!(out.ends_with(b"\n\x1b[0m"));
        assert_eq!(fe.mode(), RenderMode::Color);
    }

    #[test]
    fn title_is_written_and_flushed() {
        let (mut fe, sink) = frontend(RenderMode::Gradient, &[]);
        fe.set_window_title("DOOM\x07").unwrap();
        assert_eq!(sink.take(), b"\x1b]2;DOOM\x07");
    }

    #[test]
    fn events_flow_through_poll() {
        let (mut fe, _sink) = frontend(RenderMode::Gradient, &[b"\x1b[C"]);
        assert_eq!(fe.poll_input().unwrap(), 1);
        assert_eq!(fe.next_event(), Some(KeyEvent::press(KeyCode::RIGHT)));
        assert_eq!(fe.next_event(), None);
    }

    #[test]
    fn shutdown_releases_held_keys() {
        let (mut fe, _sink) = frontend(RenderMode::Gradient, &[b"q"]);
        fe.poll_input().unwrap();
        fe.next_event();

        fe.shutdown().unwrap();
        assert_eq!(
            fe.next_event(),
            Some(KeyEvent::release(KeyCode::from_char('q').unwrap()))
        );
        assert!(!fe.is_raw());
    }

    #[test]
    fn clock_is_monotonic() {
        let (fe, _sink) = frontend(RenderMode::Gradient, &[]);
        let a = fe.ticks_elapsed_ms();
        fe.sleep_ms(2);
        let b = fe.ticks_elapsed_ms();
        assert!(b >= a + 2, "{a} -> {b}");
    }

    #[test]
    fn invalid_config_rejected() {
        let config = FrontendConfig {
            height: 0,
            ..FrontendConfig::default()
        };
        let result = Frontend::with_io(
            &config,
            Box::new(Keystrokes(VecDeque::new())),
            Box::new(io::sink()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn dimensions_match_config() {
        let (fe, _sink) = frontend(RenderMode::Gradient, &[]);
        assert_eq!(fe.dimensions(), (4, 2));
    }
}
