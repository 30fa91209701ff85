// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Stdin byte sources.
//
// Two ways to get one tick's worth of raw input:
//
//   NonBlockingStdin  read(2) on the tick thread. Raw mode sets VMIN = 0 and
//                     O_NONBLOCK, so the call returns at once with zero or
//                     more bytes. This is the default.
//
//   ThreadedStdin     a dedicated thread polls stdin and hands each chunk to
//                     the tick thread over a bounded channel. The tick thread
//                     drains every chunk that arrived since the last tick.
//
// Either way a single read is capped at `CHUNK_CAPACITY` bytes, and the
// decoder sees each chunk on its own.
//
// Shutdown of the threaded reader: the thread polls with a short timeout and
// checks an `AtomicBool` stop flag between polls, so it never sits in a
// blocking read() when asked to exit. Handoff uses `try_send`: when the tick
// thread falls behind and the channel is full, the chunk is dropped rather
// than parking the reader where it can no longer see the stop flag.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

/// Maximum bytes taken from stdin by one read.
pub const CHUNK_CAPACITY: usize = 16;

/// How often the reader thread checks the stop flag (milliseconds).
const POLL_TIMEOUT_MS: i32 = 1;

/// Chunks buffered between the reader thread and the tick thread.
const CHANNEL_DEPTH: usize = 64;

// ─── RawChunk ───────────────────────────────────────────────────────────────

/// Bytes from one read of stdin. Never longer than [`CHUNK_CAPACITY`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawChunk {
    bytes: [u8; CHUNK_CAPACITY],
    len: usize,
}

impl RawChunk {
    /// An empty chunk.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            bytes: [0; CHUNK_CAPACITY],
            len: 0,
        }
    }

    /// Copy at most [`CHUNK_CAPACITY`] bytes from `data`; the rest is dropped.
    #[must_use]
    pub fn from_slice(data: &[u8]) -> Self {
        let mut chunk = Self::empty();
        let len = data.len().min(CHUNK_CAPACITY);
        chunk.bytes[..len].copy_from_slice(&data[..len]);
        chunk.len = len;
        chunk
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for RawChunk {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for RawChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawChunk({:?})", self.as_slice().escape_ascii().to_string())
    }
}

// ─── InputSource ────────────────────────────────────────────────────────────

/// Where a tick's raw bytes come from.
pub trait InputSource {
    /// Collect every chunk available right now. Must not block.
    ///
    /// Returning an empty `Vec` means no input this tick.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin fails for a reason other than "no data".
    fn poll_chunks(&mut self) -> io::Result<Vec<RawChunk>>;
}

impl<S: InputSource + ?Sized> InputSource for Box<S> {
    fn poll_chunks(&mut self) -> io::Result<Vec<RawChunk>> {
        (**self).poll_chunks()
    }
}

// ─── NonBlockingStdin ───────────────────────────────────────────────────────

/// Synchronous non-blocking reads on the tick thread.
///
/// Relies on raw mode having made stdin non-blocking.
#[derive(Debug, Default)]
pub struct NonBlockingStdin;

impl NonBlockingStdin {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl InputSource for NonBlockingStdin {
    fn poll_chunks(&mut self) -> io::Result<Vec<RawChunk>> {
        Ok(read_chunk()?.into_iter().collect())
    }
}

/// One non-blocking read of at most [`CHUNK_CAPACITY`] bytes.
///
/// `Ok(None)` when nothing is available (`EAGAIN`, `EINTR`, or a zero-byte
/// read with VMIN = 0).
#[cfg(unix)]
fn read_chunk() -> io::Result<Option<RawChunk>> {
    let mut buf = [0u8; CHUNK_CAPACITY];
    let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };

    if n < 0 {
        let err = io::Error::last_os_error();
        return match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
            _ => Err(err),
        };
    }
    if n == 0 {
        return Ok(None);
    }

    #[allow(clippy::cast_sign_loss)] // n > 0 guaranteed above.
    Ok(Some(RawChunk::from_slice(&buf[..n as usize])))
}

#[cfg(not(unix))]
fn read_chunk() -> io::Result<Option<RawChunk>> {
    Ok(None)
}

// ─── ThreadedStdin ──────────────────────────────────────────────────────────

/// Background stdin polling thread with a channel handoff.
///
/// The thread runs until [`stop`](Self::stop) is called or the handle is
/// dropped.
pub struct ThreadedStdin {
    /// The reader thread handle. `None` after `stop()` joins it.
    handle: Option<JoinHandle<()>>,
    /// Shared flag to signal the thread to exit.
    stop: Arc<AtomicBool>,
    rx: Receiver<RawChunk>,
}

impl ThreadedStdin {
    /// Spawn the background reader thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS cannot spawn a new thread.
    pub fn spawn() -> io::Result<Self> {
        Self::spawn_with(poll_stdin)
    }

    /// Spawn the reader thread over an arbitrary read step.
    ///
    /// `read` is called in a loop until the stop flag is set. It should wait
    /// briefly when nothing is available, return `Ok(Some(_))` per chunk read
    /// and `Err` when the source is gone.
    fn spawn_with<F>(read: F) -> io::Result<Self>
    where
        F: FnMut() -> io::Result<Option<RawChunk>> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(CHANNEL_DEPTH);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || reader_loop(&tx, &stop_flag, read))?;

        debug!("spawned stdin reader thread");
        Ok(Self {
            handle: Some(handle),
            stop,
            rx,
        })
    }

    /// Signal the reader thread to stop and wait for it to exit.
    ///
    /// Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            debug!("stdin reader thread stopped");
        }
    }
}

impl InputSource for ThreadedStdin {
    fn poll_chunks(&mut self) -> io::Result<Vec<RawChunk>> {
        let mut chunks = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(chunk) => chunks.push(chunk),
                Err(TryRecvError::Empty) => return Ok(chunks),
                Err(TryRecvError::Disconnected) => {
                    if chunks.is_empty() && self.handle.is_some() {
                        return Err(io::Error::new(
                            io::ErrorKind::BrokenPipe,
                            "stdin reader thread exited",
                        ));
                    }
                    return Ok(chunks);
                }
            }
        }
    }
}

impl Drop for ThreadedStdin {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The reader thread's main loop.
///
/// Forwards each successful read as one chunk. Exits when the stop flag is
/// set, the read step fails, or the receiver is gone. Never blocks on the
/// channel.
fn reader_loop<F>(tx: &SyncSender<RawChunk>, stop: &AtomicBool, mut read: F)
where
    F: FnMut() -> io::Result<Option<RawChunk>>,
{
    let mut dropped: usize = 0;
    while !stop.load(Ordering::Relaxed) {
        match read() {
            Ok(Some(chunk)) => match tx.try_send(chunk) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => dropped += 1,
                Err(TrySendError::Disconnected(_)) => break,
            },
            Ok(None) => {}
            Err(err) => {
                debug!(%err, "stdin reader thread giving up");
                break;
            }
        }
    }
    if dropped > 0 {
        debug!(dropped, "stdin chunks dropped on a full channel");
    }
}

/// One read step over real stdin: poll with a short timeout, then read.
#[cfg(unix)]
fn poll_stdin() -> io::Result<Option<RawChunk>> {
    let ready = unsafe {
        let mut pfd = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        libc::poll(&raw mut pfd, 1, POLL_TIMEOUT_MS)
    };

    // Timeout or error: back to the loop to check the stop flag.
    if ready <= 0 {
        return Ok(None);
    }

    let chunk = read_chunk()?;
    if chunk.is_none() {
        // Spurious wakeup, or EOF with VMIN = 0.
        thread::sleep(Duration::from_millis(1));
    }
    Ok(chunk)
}

#[cfg(not(unix))]
fn poll_stdin() -> io::Result<Option<RawChunk>> {
    thread::sleep(Duration::from_millis(1));
    Ok(None)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
