#![forbid(unsafe_code)]

//! Counting writer for tracking bytes and syscalls emitted.
//!
//! Wraps any `Write` and counts bytes, write calls and flushes. Tests use it
//! to check that a frame costs one write and that output size tracks the
//! number of changed rows.
//!
//! ```
//! use weft_render::counting_writer::CountingWriter;
//! use std::io::Write;
//!
//! let mut writer = CountingWriter::new(Vec::new());
//! writer.write_all(b"Hello, world!").unwrap();
//! assert_eq!(writer.bytes_written(), 13);
//! assert_eq!(writer.write_calls(), 1);
//!
//! writer.reset_counter();
//! writer.write_all(b"Hi").unwrap();
//! assert_eq!(writer.bytes_written(), 2);
//! ```

use std::io::{self, Write};
use std::time::Duration;

/// A write wrapper that counts bytes, writes and flushes.
#[derive(Debug)]
pub struct CountingWriter<W> {
    inner: W,
    bytes_written: u64,
    write_calls: usize,
    flush_calls: usize,
}

impl<W> CountingWriter<W> {
    /// Wrap `inner`.
    #[inline]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
            write_calls: 0,
            flush_calls: 0,
        }
    }

    /// Bytes written since the last reset.
    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// `write`/`write_all` calls since the last reset.
    #[inline]
    pub fn write_calls(&self) -> usize {
        self.write_calls
    }

    /// `flush` calls since the last reset.
    #[inline]
    pub fn flush_calls(&self) -> usize {
        self.flush_calls
    }

    /// Zero every counter.
    #[inline]
    pub fn reset_counter(&mut self) {
        self.bytes_written = 0;
        self.write_calls = 0;
        self.flush_calls = 0;
    }

    /// The wrapped writer.
    #[inline]
    pub fn inner(&self) -> &W {
        &self.inner
    }

    /// Consume and return the wrapped writer.
    #[inline]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes_written += n as u64;
        self.write_calls += 1;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_calls += 1;
        self.inner.flush()
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.bytes_written += buf.len() as u64;
        self.write_calls += 1;
        Ok(())
    }
}

/// Statistics for one presented frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentStats {
    /// Bytes emitted for this frame.
    pub bytes_emitted: u64,
    /// Rows whose content was written.
    pub rows_written: usize,
    /// Rows erased because their region shrank.
    pub rows_cleared: usize,
    /// Time spent building the frame.
    pub duration: Duration,
}

impl PresentStats {
    /// Create stats with the given values.
    #[inline]
    pub fn new(
        bytes_emitted: u64,
        rows_written: usize,
        rows_cleared: usize,
        duration: Duration,
    ) -> Self {
        Self {
            bytes_emitted,
            rows_written,
            rows_cleared,
            duration,
        }
    }

    /// Average bytes per written row; 0.0 when nothing was written.
    #[inline]
    pub fn bytes_per_row(&self) -> f64 {
        let rows = self.rows_written + self.rows_cleared;
        if rows == 0 {
            0.0
        } else {
            self.bytes_emitted as f64 / rows as f64
        }
    }

    /// Log stats at debug level (requires tracing feature).
    #[cfg(feature = "tracing")]
    pub fn log(&self) {
        tracing::debug!(
            bytes = self.bytes_emitted,
            rows_written = self.rows_written,
            rows_cleared = self.rows_cleared,
            duration_us = u64::try_from(self.duration.as_micros()).unwrap_or(u64::MAX),
            "present stats"
        );
    }

    /// Log stats at debug level (no-op without tracing feature).
    #[cfg(not(feature = "tracing"))]
    pub fn log(&self) {}
}
