// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Tick loop: the fixed-rate heartbeat of a session.
//
// Each iteration:
//
//   1. check the shutdown flag (SIGINT / SIGTERM)
//   2. poll stdin and queue key edges
//   3. let the engine tick (it drains events, advances its world)
//   4. update the window title if the engine changed it
//   5. serialize the engine's pixels and write the frame
//   6. sleep whatever is left of the tick interval
//
// A frame that cannot be packed (wrong pixel count, overflow) costs one
// frame, not the session: it is logged and the loop carries on. Any other
// error ends the loop, and the terminal is restored on the way out.
//
// # Signals
//
// Ctrl-C still raises SIGINT in raw mode (ISIG is left on). The handler only
// sets an `AtomicBool`; the loop sees it at the top of the next tick and
// leaves through the normal restore path instead of dying mid-frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::FrontendConfig;
use crate::error::Result;
use crate::frontend::Frontend;

// ─── Signals ─────────────────────────────────────────────────────────────────

/// Set by the SIGINT / SIGTERM handler. Checked once per tick.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Install handlers for SIGINT and SIGTERM that set [`SHUTDOWN_REQUESTED`].
///
/// Storing to an atomic is async-signal-safe.
#[cfg(unix)]
fn install_shutdown_handlers() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = shutdown_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGINT, &raw const sa, std::ptr::null_mut());
        libc::sigaction(libc::SIGTERM, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn shutdown_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_shutdown_handlers() {}

// ─── Engine Trait ────────────────────────────────────────────────────────────

/// What the engine tells the loop after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep ticking.
    Continue,
    /// Leave the loop and restore the terminal.
    Quit,
}

/// The game side of the loop.
///
/// Per tick the loop calls [`tick`](Engine::tick), then
/// [`title`](Engine::title), then [`pixels`](Engine::pixels).
pub trait Engine {
    /// Advance one tick.
    ///
    /// Drain this tick's input with [`Frontend::next_event`]; anything left
    /// in the queue is dropped before the next tick.
    fn tick(&mut self, frontend: &mut Frontend) -> Action;

    /// The current frame as `0xAARRGGBB`, row-major, `width × height` long.
    fn pixels(&self) -> &[u32];

    /// Window title. Written only when it changes.
    fn title(&self) -> Option<&str> {
        None
    }
}

// ─── TickLoop ────────────────────────────────────────────────────────────────

/// Fixed-rate loop driving an [`Engine`] against a [`Frontend`].
///
/// # Example
///
/// ```no_run
/// use asciidoom_term::config::FrontendConfig;
/// use asciidoom_term::frontend::Frontend;
/// use asciidoom_term::tick_loop::{Action, Engine, TickLoop};
///
/// struct Blank(Vec<u32>);
///
/// impl Engine for Blank {
///     fn tick(&mut self, frontend: &mut Frontend) -> Action {
///         while let Some(_event) = frontend.next_event() {}
///         Action::Continue
///     }
///
///     fn pixels(&self) -> &[u32] {
///         &self.0
///     }
/// }
///
/// let config = FrontendConfig::default();
/// let mut engine = Blank(vec![0; config.pixel_count()]);
/// TickLoop::new(&config)?.run(&mut engine)?;
/// # Ok::<(), asciidoom_term::Error>(())
/// ```
pub struct TickLoop {
    frontend: Frontend,
    interval: Duration,
    shutdown: &'static AtomicBool,
}

impl TickLoop {
    /// Open a frontend for `config` and pace ticks by its interval.
    ///
    /// # Errors
    ///
    /// Anything [`Frontend::new`] returns.
    pub fn new(config: &FrontendConfig) -> Result<Self> {
        Ok(Self::with_frontend(
            Frontend::new(config)?,
            config.tick_interval(),
        ))
    }

    /// Drive an existing frontend.
    #[must_use]
    pub fn with_frontend(frontend: Frontend, interval: Duration) -> Self {
        Self {
            frontend,
            interval,
            shutdown: &SHUTDOWN_REQUESTED,
        }
    }

    /// Watch `flag` instead of the process-wide signal flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: &'static AtomicBool) -> Self {
        self.shutdown = flag;
        self
    }

    #[must_use]
    pub const fn frontend(&self) -> &Frontend {
        &self.frontend
    }

    pub fn frontend_mut(&mut self) -> &mut Frontend {
        &mut self.frontend
    }

    /// Tick until the engine quits or a shutdown signal arrives.
    ///
    /// Returns the number of ticks run. The terminal is restored before
    /// returning, whatever the outcome.
    ///
    /// # Errors
    ///
    /// The first non-contained error from input, output or restore.
    pub fn run(&mut self, engine: &mut impl Engine) -> Result<u64> {
        install_shutdown_handlers();

        let result = self.run_inner(engine);

        // Always restore, even if the loop errored.
        let restored = self.frontend.shutdown();
        result.and_then(|ticks| restored.map(|()| ticks))
    }

    fn run_inner(&mut self, engine: &mut impl Engine) -> Result<u64> {
        let mut ticks: u64 = 0;
        let mut title: Option<String> = None;

        loop {
            if self.shutdown.swap(false, Ordering::Relaxed) {
                info!(ticks, "shutdown requested");
                return Ok(ticks);
            }
            let started = Instant::now();

            // ── Input ────────────────────────────────────────────
            self.frontend.poll_input()?;

            // ── Engine ───────────────────────────────────────────
            ticks += 1;
            if engine.tick(&mut self.frontend) == Action::Quit {
                info!(ticks, "engine quit");
                return Ok(ticks);
            }

            // ── Title ────────────────────────────────────────────
            if let Some(current) = engine.title() {
                if title.as_deref() != Some(current) {
                    self.frontend.set_window_title(current)?;
                    title = Some(current.to_owned());
                }
            }

            // ── Frame ────────────────────────────────────────────
            match self.frontend.draw_frame(engine.pixels()) {
                Ok(()) => {}
                Err(err) if err.is_contained() => warn!(%err, tick = ticks, "frame skipped"),
                Err(err) => return Err(err),
            }

            // ── Pace ─────────────────────────────────────────────
            if let Some(rest) = self.interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RenderMode;
    use crate::frontend::tests::{Keystrokes, SharedSink, small_config};
    use crate::keys::{KeyCode, KeyEvent};
    use pretty_assertions::assert_eq;

    /// Quits on `q`, otherwise records what it saw.
    struct Recorder {
        pixels: Vec<u32>,
        seen: Vec<Vec<KeyEvent>>,
        title: Option<&'static str>,
        quit_after: Option<u64>,
    }

    impl Recorder {
        fn new(pixels: usize) -> Self {
            Self {
                pixels: vec![0xFFFF_FFFF; pixels],
                seen: Vec::new(),
                title: None,
                quit_after: None,
            }
        }
    }

    impl Engine for Recorder {
        fn tick(&mut self, frontend: &mut Frontend) -> Action {
            let events: Vec<_> = std::iter::from_fn(|| frontend.next_event()).collect();
            let quit = events
                .iter()
                .any(|e| e.is_press() && e.key == KeyCode::from_char('q').unwrap());
            self.seen.push(events);
            if quit || self.quit_after == Some(self.seen.len() as u64) {
                Action::Quit
            } else {
                Action::Continue
            }
        }

        fn pixels(&self) -> &[u32] {
            &self.pixels
        }

        fn title(&self) -> Option<&str> {
            self.title
        }
    }

    fn tick_loop(keys: &[&'static [u8]]) -> (TickLoop, SharedSink) {
        static NEVER: AtomicBool = AtomicBool::new(false);
        let sink = SharedSink::default();
        let frontend = Frontend::with_io(
            &small_config(RenderMode::Gradient),
            Box::new(Keystrokes(keys.iter().copied().collect())),
            Box::new(sink.clone()),
        )
        .unwrap();
        let tl = TickLoop::with_frontend(frontend, Duration::ZERO).with_shutdown_flag(&NEVER);
        (tl, sink)
    }

    #[test]
    fn quits_on_engine_request() {
        let (mut tl, sink) = tick_loop(&[b"", b"", b"q"]);
        let mut engine = Recorder::new(8);
        assert_eq!(tl.run(&mut engine).unwrap(), 3);
        assert_eq!(engine.seen.len(), 3);
        // Two frames drawn; the quitting tick draws none.
        assert_eq!(sink.take(), b"\x1b[H$$$$\n\x1b[H$$$$\n");
    }

    #[test]
    fn engine_sees_press_then_release() {
        let (mut tl, _sink) = tick_loop(&[b"w", b""]);
        let mut engine = Recorder::new(8);
        engine.quit_after = Some(3);
        tl.run(&mut engine).unwrap();

        let w = KeyCode::from_char('w').unwrap();
        assert_eq!(
            engine.seen,
            vec![vec![KeyEvent::press(w)], vec![KeyEvent::release(w)], vec![]]
        );
    }

    #[test]
    fn bad_pixel_buffer_skips_frames_only() {
        let (mut tl, sink) = tick_loop(&[]);
        let mut engine = Recorder::new(5);
        engine.quit_after = Some(4);
        assert_eq!(tl.run(&mut engine).unwrap(), 4);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn title_written_once() {
        let (mut tl, sink) = tick_loop(&[]);
        let mut engine = Recorder::new(8);
        engine.title = Some("DOOM");
        engine.quit_after = Some(3);
        tl.run(&mut engine).unwrap();

        let out = sink.take();
        let titles = out.windows(4).filter(|w| *w == b"\x1b]2;").count();
        assert_eq!(titles, 1);
    }

    #[test]
    fn shutdown_flag_stops_before_first_tick() {
        static STOP: AtomicBool = AtomicBool::new(true);
        let (tl, _sink) = tick_loop(&[]);
        let mut tl = tl.with_shutdown_flag(&STOP);
        let mut engine = Recorder::new(8);
        assert_eq!(tl.run(&mut engine).unwrap(), 0);
        assert!(engine.seen.is_empty());
        assert!(!STOP.load(Ordering::Relaxed));
    }

    #[test]
    fn action_equality() {
        assert_eq!(Action::Continue, Action::Continue);
        assert_ne!(Action::Continue, Action::Quit);
    }
}
