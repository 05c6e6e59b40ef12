#![forbid(unsafe_code)]

//! Terminal backend abstraction.
//!
//! The run loop talks to the terminal only through [`TerminalBackend`]:
//! size queries, mode entry/exit, non-blocking input, and one raw write per
//! frame. [`CrosstermBackend`] drives a real terminal via
//! [`TerminalSession`]; [`HeadlessBackend`] records everything in memory for
//! tests and simulations.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::Duration;

use crate::event::Event;
use crate::terminal_session::{SessionOptions, TerminalSession};

/// Everything the run loop needs from a terminal.
pub trait TerminalBackend {
    /// Current size as (columns, rows).
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Enter raw mode and the configured screen modes.
    fn enter(&mut self, options: SessionOptions) -> io::Result<()>;

    /// Restore the terminal. Must be safe to call when not entered.
    fn leave(&mut self) -> io::Result<()>;

    /// Wait up to `timeout` for input. `Ok(false)` means none is pending.
    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Read one pending event. `Ok(None)` for events weft does not route.
    fn read_event(&mut self) -> io::Result<Option<Event>>;

    /// Write one complete frame and flush it.
    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Write `frame` with one `write_all` and one flush. An empty frame touches
/// nothing.
///
/// # Errors
///
/// Propagates I/O errors from the writer.
pub fn write_frame_to<W: Write>(writer: &mut W, frame: &[u8]) -> io::Result<()> {
    if frame.is_empty() {
        return Ok(());
    }
    writer.write_all(frame)?;
    writer.flush()
}

/// Backend for a real terminal on stdout.
#[derive(Debug, Default)]
pub struct CrosstermBackend {
    session: Option<TerminalSession>,
}

impl CrosstermBackend {
    /// Create a backend. The terminal is untouched until [`TerminalBackend::enter`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TerminalBackend for CrosstermBackend {
    fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    fn enter(&mut self, options: SessionOptions) -> io::Result<()> {
        if self.session.is_none() {
            self.session = Some(TerminalSession::new(options)?);
        }
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        // Dropping the session restores every mode it enabled.
        self.session = None;
        Ok(())
    }

    fn poll_event(&mut self, timeout: Duration) -> io::Result<bool> {
        crossterm::event::poll(timeout)
    }

    fn read_event(&mut self) -> io::Result<Option<Event>> {
        let event = crossterm::event::read()?;
        Ok(Event::from_crossterm(event))
    }

    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        write_frame_to(&mut io::stdout().lock(), bytes)
    }
}

/// In-memory backend: queued input, recorded frames.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    width: u16,
    height: u16,
    entered: bool,
    options: Option<SessionOptions>,
    events: VecDeque<Event>,
    frames: Vec<Vec<u8>>,
}

impl HeadlessBackend {
    /// Create a headless terminal of the given size.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            entered: false,
            options: None,
            events: VecDeque::new(),
            frames: Vec::new(),
        }
    }

    /// Change the reported size. Callers are responsible for raising the
    /// resize flag, as a real terminal would via `SIGWINCH`.
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    /// Queue an input event.
    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    /// Queue several input events in order.
    pub fn push_events(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    /// Events still waiting to be read.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Every frame written so far.
    #[must_use]
    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    /// The most recent frame, lossily decoded.
    #[must_use]
    pub fn last_frame(&self) -> Option<String> {
        self.frames
            .last()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Number of `write_frame` calls (each is one terminal write).
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.frames.len()
    }

    /// Forget recorded frames.
    pub fn clear_frames(&mut self) {
        self.frames.clear();
    }

    /// Whether the backend is currently between `enter` and `leave`.
    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.entered
    }

    /// Options passed to the last `enter`.
    #[must_use]
    pub fn session_options(&self) -> Option<SessionOptions> {
        self.options
    }
}

impl TerminalBackend for HeadlessBackend {
    fn size(&self) -> io::Result<(u16, u16)> {
        Ok((self.width, self.height))
    }

    fn enter(&mut self, options: SessionOptions) -> io::Result<()> {
        self.entered = true;
        self.options = Some(options);
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        self.entered = false;
        Ok(())
    }

    fn poll_event(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(!self.events.is_empty())
    }

    fn read_event(&mut self) -> io::Result<Option<Event>> {
        Ok(self.events.pop_front())
    }

    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.frames.push(bytes.to_vec());
        Ok(())
    }
}
