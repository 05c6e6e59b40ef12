#![forbid(unsafe_code)]

//! Presenter: single-write frame emission.
//!
//! The presenter turns per-region diffs into one contiguous byte buffer:
//!
//! 1. Begin synchronized output (if enabled)
//! 2. Erase the display (first frame, or after a resize)
//! 3. For each changed row: cursor to `(row, 0)`, then the full line
//! 4. For each cleared row: cursor to `(row, 0)`, then erase-line
//! 5. Reset style, end synchronized output
//!
//! The backend hands the buffer to the terminal as a single write followed
//! by one flush, so a frame is never torn across syscalls. Empty frames
//! produce no bytes and no write.

use std::time::Instant;

use crate::ansi;
use crate::counting_writer::PresentStats;
use crate::diff::RegionDiff;

/// Default capacity for the frame buffer (16KB).
const FRAME_CAPACITY: usize = 16 * 1024;

/// Frame-level emission options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentOptions {
    /// Wrap the frame in DEC 2026 synchronized output.
    pub sync_output: bool,
}

/// Accumulates one frame's output.
#[derive(Debug)]
pub struct FrameBuilder {
    buf: Vec<u8>,
    options: PresentOptions,
    clear: bool,
    rows_written: usize,
    rows_cleared: usize,
    started: Instant,
}

impl FrameBuilder {
    /// Start a frame. `clear` emits `ESC[2J` before any row.
    #[must_use]
    pub fn new(options: PresentOptions, clear: bool) -> Self {
        Self {
            buf: Vec::with_capacity(FRAME_CAPACITY),
            options,
            clear,
            rows_written: 0,
            rows_cleared: 0,
            started: Instant::now(),
        }
    }

    /// Queue one region's writes. `top` is the region's first screen row.
    pub fn region(&mut self, top: u16, lines: &[String], diff: &RegionDiff) {
        for &row in &diff.changed {
            let Some(line) = lines.get(row) else {
                continue;
            };
            let screen_row = top.saturating_add(clamp_row(row));
            // Writes into a Vec cannot fail.
            let _ = ansi::cup(&mut self.buf, screen_row, 0);
            self.buf.extend_from_slice(line.as_bytes());
            self.rows_written += 1;
        }
        for row in diff.cleared.clone() {
            let screen_row = top.saturating_add(clamp_row(row));
            let _ = ansi::cup(&mut self.buf, screen_row, 0);
            self.buf.extend_from_slice(ansi::ERASE_LINE);
            self.rows_cleared += 1;
        }
    }

    /// Rows queued so far (changed plus cleared).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows_written + self.rows_cleared
    }

    /// Close the frame and return its bytes with statistics.
    ///
    /// Returns an empty buffer when nothing changed and no clear was asked.
    #[must_use]
    pub fn finish(self) -> (Vec<u8>, PresentStats) {
        if self.row_count() == 0 && !self.clear {
            return (Vec::new(), PresentStats::default());
        }
        let mut out = Vec::with_capacity(self.buf.len() + 32);
        if self.options.sync_output {
            out.extend_from_slice(ansi::SYNC_BEGIN);
        }
        if self.clear {
            out.extend_from_slice(ansi::ERASE_DISPLAY);
        }
        out.extend_from_slice(&self.buf);
        out.extend_from_slice(ansi::SGR_RESET.as_bytes());
        if self.options.sync_output {
            out.extend_from_slice(ansi::SYNC_END);
        }
        let stats = PresentStats::new(
            out.len() as u64,
            self.rows_written,
            self.rows_cleared,
            self.started.elapsed(),
        );
        (out, stats)
    }
}

fn clamp_row(row: usize) -> u16 {
    u16::try_from(row).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::RegionCache;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn changed_rows_get_cursor_moves() {
        let new = lines(&["aa", "bb"]);
        let mut cache = RegionCache::default();
        let diff = cache.diff(&new);

        let mut frame = FrameBuilder::new(PresentOptions::default(), false);
        frame.region(3, &new, &diff);
        let (bytes, stats) = frame.finish();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "\x1b[4;1Haa\x1b[5;1Hbb\x1b[0m");
        assert_eq!(stats.rows_written, 2);
    }

    #[test]
    fn empty_frame_is_empty() {
        let frame = FrameBuilder::new(PresentOptions { sync_output: true }, false);
        let (bytes, stats) = frame.finish();
        assert!(bytes.is_empty());
        assert_eq!(stats, PresentStats::default());
    }

    #[test]
    fn clear_and_sync_wrap_frame() {
        let new = lines(&["x"]);
        let mut cache = RegionCache::default();
        let diff = cache.diff(&new);
        let mut frame = FrameBuilder::new(PresentOptions { sync_output: true }, true);
        frame.region(0, &new, &diff);
        let (bytes, _) = frame.finish();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("\x1b[?2026h\x1b[2J"));
        assert!(text.ends_with("\x1b[0m\x1b[?2026l"));
    }

    #[test]
    fn cleared_rows_are_erased() {
        let mut cache = RegionCache::default();
        cache.diff(&lines(&["a", "b"]));
        let new = lines(&["a"]);
        let diff = cache.diff(&new);
        let mut frame = FrameBuilder::new(PresentOptions::default(), false);
        frame.region(0, &new, &diff);
        let (bytes, stats) = frame.finish();
        assert_eq!(String::from_utf8(bytes).unwrap(), "\x1b[2;1H\x1b[2K\x1b[0m");
        assert_eq!(stats.rows_cleared, 1);
    }
}
