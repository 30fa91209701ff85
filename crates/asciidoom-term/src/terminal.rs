// SPDX-License-Identifier: MIT
//
// Raw-mode session — non-canonical, non-echoing, non-blocking stdin with
// RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), fcntl, isatty, and raw fd writes. These are the standard POSIX
// interfaces for terminal control. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// Entering the session captures a snapshot of the terminal (termios plus
// stdin's file status flags), then turns off echo and line buffering and
// makes reads return immediately: VMIN = 0, VTIME = 0, O_NONBLOCK. Output
// processing and signals are left alone, so `\n` still moves to column 0
// and Ctrl-C still raises SIGINT.
//
// The snapshot is restored exactly once, from whichever exit path comes
// first: an explicit `restore()`, `Drop`, or the panic hook. The hook
// bypasses Rust's stdout lock and writes the restore sequence straight to
// fd 1, since a panic mid-frame may be holding that lock.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use bitflags::bitflags;
use tracing::{debug, info};

use crate::ansi;
use crate::error::{Error, Result};

bitflags! {
    /// Cosmetic terminal features toggled alongside raw mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u8 {
        /// Draw on the alternate screen; the shell comes back on exit.
        const ALT_SCREEN  = 0b0000_0001;
        /// Hide the text cursor while frames are drawn.
        const HIDE_CURSOR = 0b0000_0010;
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::ALT_SCREEN | Self::HIDE_CURSOR
    }
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Snapshot ───────────────────────────────────────────────────────────────

/// Terminal configuration captured before entering raw mode.
#[cfg(unix)]
#[derive(Clone, Copy)]
struct Snapshot {
    termios: libc::termios,
    status_flags: libc::c_int,
}

#[cfg(unix)]
impl Snapshot {
    fn capture() -> Result<Self> {
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                return Err(Error::mode("tcgetattr"));
            }
            let status_flags = libc::fcntl(libc::STDIN_FILENO, libc::F_GETFL);
            if status_flags == -1 {
                return Err(Error::mode("fcntl(F_GETFL)"));
            }
            Ok(Self {
                termios,
                status_flags,
            })
        }
    }

    /// Apply the raw configuration derived from this snapshot.
    fn apply_raw(&self) -> Result<()> {
        let mut termios = self.termios;
        termios.c_lflag &= !(libc::ECHO | libc::ICANON);
        // read() returns immediately with whatever is available.
        termios.c_cc[libc::VMIN] = 0;
        termios.c_cc[libc::VTIME] = 0;

        unsafe {
            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &raw const termios) != 0 {
                return Err(Error::mode("tcsetattr"));
            }
            if libc::fcntl(
                libc::STDIN_FILENO,
                libc::F_SETFL,
                self.status_flags | libc::O_NONBLOCK,
            ) == -1
            {
                return Err(Error::mode("fcntl(F_SETFL)"));
            }
        }
        Ok(())
    }

    fn apply_original(&self) -> Result<()> {
        unsafe {
            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &raw const self.termios) != 0 {
                return Err(Error::mode("tcsetattr"));
            }
            if libc::fcntl(libc::STDIN_FILENO, libc::F_SETFL, self.status_flags) == -1 {
                return Err(Error::mode("fcntl(F_SETFL)"));
            }
        }
        Ok(())
    }
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of the snapshot for panic recovery.
///
/// The [`RawMode`] guard owns its own copy, but the panic hook can't reach
/// it. This backup lives behind a [`Mutex`], not `static mut`.
#[cfg(unix)]
static SNAPSHOT_BACKUP: Mutex<Option<Snapshot>> = Mutex::new(None);

/// Restore the terminal from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_from_backup() {
    if let Ok(mut guard) = SNAPSHOT_BACKUP.lock() {
        if let Some(snapshot) = guard.take() {
            let _ = snapshot.apply_original();
        }
    }
}

/// Cosmetic restore sequence for emergency use: reset SGR, show cursor,
/// leave the alternate screen (last, so the shell reappears clean).
const EMERGENCY_RESTORE: &[u8] = b"\x1b[0m\x1b[?25h\x1b[?1049l";

/// Ensures the panic hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_from_backup();

            original(info);
        }));
    });
}

/// Write [`EMERGENCY_RESTORE`] directly to stdout's file descriptor.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── RawMode ────────────────────────────────────────────────────────────────

/// Raw-mode guard. The terminal is restored when it is dropped.
///
/// # Example
///
/// ```no_run
/// use asciidoom_term::terminal::{Features, RawMode};
///
/// let session = RawMode::enter(Features::default())?;
/// // ... read keys, draw frames ...
/// drop(session); // echo, line buffering and the shell screen come back
/// # Ok::<(), asciidoom_term::Error>(())
/// ```
pub struct RawMode {
    #[cfg(unix)]
    snapshot: Option<Snapshot>,
    features: Features,
}

impl RawMode {
    /// Capture the current terminal mode and switch to raw mode.
    ///
    /// # Errors
    ///
    /// - [`Error::NotATerminal`] if stdin is not a TTY.
    /// - [`Error::TerminalMode`] if querying or changing the mode fails.
    ///   The terminal is left as it was.
    /// - [`Error::Io`] if the cosmetic sequences cannot be written.
    #[cfg(unix)]
    pub fn enter(features: Features) -> Result<Self> {
        if !is_tty() {
            return Err(Error::NotATerminal);
        }

        install_panic_hook();

        let snapshot = Snapshot::capture()?;
        if let Err(err) = snapshot.apply_raw() {
            let _ = snapshot.apply_original();
            return Err(err);
        }
        if let Ok(mut guard) = SNAPSHOT_BACKUP.lock() {
            *guard = Some(snapshot);
        }

        // From here on, Drop restores even if the cosmetics fail.
        let session = Self {
            snapshot: Some(snapshot),
            features,
        };
        session.write_enter_sequences()?;

        info!(?features, "entered raw mode");
        Ok(session)
    }

    #[cfg(not(unix))]
    pub fn enter(_features: Features) -> Result<Self> {
        Err(Error::NotATerminal)
    }

    /// Whether the snapshot is still waiting to be restored.
    #[cfg(unix)]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.snapshot.is_some()
    }

    #[cfg(not(unix))]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        false
    }

    /// Reapply the captured terminal mode.
    ///
    /// Idempotent: only the first call does anything.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalMode`] if `tcsetattr` or `fcntl` fails. The
    /// snapshot is consumed either way.
    #[cfg(unix)]
    pub fn restore(&mut self) -> Result<()> {
        let Some(snapshot) = self.snapshot.take() else {
            return Ok(());
        };

        // Cosmetics first; a dead stdout must not prevent the mode restore.
        if let Err(err) = self.write_leave_sequences() {
            debug!(%err, "could not write terminal restore sequences");
        }

        let result = snapshot.apply_original();
        if let Ok(mut guard) = SNAPSHOT_BACKUP.lock() {
            *guard = None;
        }
        info!("restored terminal mode");
        result
    }

    #[cfg(not(unix))]
    pub fn restore(&mut self) -> Result<()> {
        Ok(())
    }

    #[cfg_attr(not(unix), allow(dead_code))]
    fn write_enter_sequences(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        if self.features.contains(Features::ALT_SCREEN) {
            ansi::enter_alt_screen(&mut lock)?;
        }
        if self.features.contains(Features::HIDE_CURSOR) {
            ansi::cursor_hide(&mut lock)?;
        }
        lock.flush()
    }

    #[cfg_attr(not(unix), allow(dead_code))]
    fn write_leave_sequences(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::reset(&mut lock)?;
        if self.features.contains(Features::HIDE_CURSOR) {
            ansi::cursor_show(&mut lock)?;
        }
        if self.features.contains(Features::ALT_SCREEN) {
            ansi::exit_alt_screen(&mut lock)?;
        }
        lock.flush()
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
