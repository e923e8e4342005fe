//! Line sinks for the run log and console stream.
//!
//! # Design
//!
//! Producers (task runners, the engine, the reporter) format a complete line
//! into a local `Vec<u8>` and then call `write_all(bytes)`, which takes the
//! sink's lock only for the copy into its buffer.
//!
//! # Guarantees
//!
//! - **Whole lines**: each `write_all` holds the sink mutex for the entire
//!   batch, so lines from different threads never interleave at the byte
//!   level. Ordering between producers follows lock acquisition order.
//! - **Flush**: `flush()` pushes buffered bytes to the OS at the moment of
//!   the call. Call it after producers have been joined.
//!
//! # Errors
//!
//! Producers never see I/O errors: a buffered sink records the first
//! failure, drops every later batch, and reports the error from
//! [`OutputSink::take_error`]. `BrokenPipe` on stdout is not an error
//! (`sched-sim RR | head`). A poisoned mutex panics.

use std::fs::File;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::Path;
use std::sync::Mutex;

/// Buffer size for stdout and file sinks.
///
/// A run emits a few lines per task transition, so 16 KiB keeps syscalls
/// rare without holding much memory.
const DEFAULT_BUF_CAPACITY: usize = 16 * 1024;

// ============================================================================
// Trait
// ============================================================================

/// Thread-safe byte sink.
pub trait OutputSink: Send + Sync + 'static {
    /// Write one batch of bytes atomically with respect to other batches.
    fn write_all(&self, bytes: &[u8]);

    /// Flush buffered data to the OS.
    fn flush(&self);

    /// First I/O error since the last call, if any.
    fn take_error(&self) -> Option<io::Error> {
        None
    }
}

// ============================================================================
// Buffered writers
// ============================================================================

struct Buffered<W: Write> {
    out: BufWriter<W>,
    error: Option<io::Error>,
    /// Output closed by the reader; drop everything silently.
    closed: bool,
}

/// Shared state machine of [`StdoutSink`] and [`FileSink`].
struct BufferedSink<W: Write> {
    inner: Mutex<Buffered<W>>,
    tolerate_broken_pipe: bool,
    name: &'static str,
}

impl<W: Write> BufferedSink<W> {
    fn new(out: W, tolerate_broken_pipe: bool, name: &'static str) -> Self {
        Self {
            inner: Mutex::new(Buffered {
                out: BufWriter::with_capacity(DEFAULT_BUF_CAPACITY, out),
                error: None,
                closed: false,
            }),
            tolerate_broken_pipe,
            name,
        }
    }

    fn run(&self, op: impl FnOnce(&mut BufWriter<W>) -> io::Result<()>) {
        let mut g = self
            .inner
            .lock()
            .unwrap_or_else(|_| panic!("{} sink mutex poisoned", self.name));
        if g.closed || g.error.is_some() {
            return;
        }
        if let Err(e) = op(&mut g.out) {
            if self.tolerate_broken_pipe && e.kind() == ErrorKind::BrokenPipe {
                g.closed = true;
            } else {
                g.error = Some(e);
            }
        }
    }

    fn take_error(&self) -> Option<io::Error> {
        self.inner
            .lock()
            .unwrap_or_else(|_| panic!("{} sink mutex poisoned", self.name))
            .error
            .take()
    }
}

// ============================================================================
// StdoutSink
// ============================================================================

/// Buffered stdout behind a mutex.
pub struct StdoutSink {
    inner: BufferedSink<io::Stdout>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            inner: BufferedSink::new(io::stdout(), true, "stdout"),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for StdoutSink {
    fn write_all(&self, bytes: &[u8]) {
        self.inner.run(|out| out.write_all(bytes));
    }

    fn flush(&self) {
        self.inner.run(|out| out.flush());
    }

    fn take_error(&self) -> Option<io::Error> {
        self.inner.take_error()
    }
}

// ============================================================================
// FileSink
// ============================================================================

/// Buffered file sink (creates or truncates the file).
pub struct FileSink {
    inner: BufferedSink<File>,
}

impl FileSink {
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: BufferedSink::new(file, false, "file"),
        })
    }
}

impl OutputSink for FileSink {
    fn write_all(&self, bytes: &[u8]) {
        self.inner.run(|out| out.write_all(bytes));
    }

    fn flush(&self) {
        self.inner.run(|out| out.flush());
    }

    fn take_error(&self) -> Option<io::Error> {
        self.inner.take_error()
    }
}

// ============================================================================
// VecSink (for testing)
// ============================================================================

/// Captures all bytes in memory.
pub struct VecSink {
    buf: Mutex<Vec<u8>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self {
            buf: Mutex::new(Vec::new()),
        }
    }

    /// Extract captured bytes, leaving the buffer empty.
    pub fn take(&self) -> Vec<u8> {
        let mut g = self.buf.lock().expect("vec sink mutex poisoned");
        std::mem::take(&mut *g)
    }

    /// Captured output as lossy UTF-8 lines, without consuming it.
    pub fn lines(&self) -> Vec<String> {
        let g = self.buf.lock().expect("vec sink mutex poisoned");
        String::from_utf8_lossy(&g)
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buf.lock().expect("vec sink mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VecSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for VecSink {
    fn write_all(&self, bytes: &[u8]) {
        self.buf
            .lock()
            .expect("vec sink mutex poisoned")
            .extend_from_slice(bytes);
    }

    fn flush(&self) {}
}

// ============================================================================
// NullSink
// ============================================================================

/// Discards all output.
#[derive(Default)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl OutputSink for NullSink {
    fn write_all(&self, _bytes: &[u8]) {}

    fn flush(&self) {}
}
