#![forbid(unsafe_code)]

//! Terminal mode guard.
//!
//! [`TerminalSession`] owns raw mode, the alternate screen and cursor
//! visibility for the lifetime of a program run. Every mode it enables is
//! tracked by a flag and undone on drop in reverse order:
//!
//! 1. Disable bracketed paste (if enabled)
//! 2. Show cursor (always)
//! 3. Leave alternate screen (if enabled)
//! 4. Exit raw mode (always)
//! 5. Flush stdout
//!
//! A process-wide panic hook performs the same restoration on a best-effort
//! basis, since release builds abort on panic and never run `Drop`.
//!
//! Signals are not handled here. Shutdown and resize arrive as flags (see
//! [`crate::signals`]) and the run loop decides when to drop the session.
//!
//! | Feature | Enable | Disable |
//! |---------|--------|---------|
//! | Alternate screen | `CSI ? 1049 h` | `CSI ? 1049 l` |
//! | Bracketed paste | `CSI ? 2004 h` | `CSI ? 2004 l` |
//! | Cursor | `CSI ? 25 l` | `CSI ? 25 h` |

use std::io::{self, Write};
use std::sync::OnceLock;

/// Which terminal modes a session enables.
///
/// All options default to `false`; the run loop turns on what its
/// configuration asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Switch to the alternate screen buffer, preserving scrollback.
    pub alternate_screen: bool,
    /// Hide the cursor while the session is active.
    pub hide_cursor: bool,
    /// Deliver pastes as a single event.
    pub bracketed_paste: bool,
}

impl SessionOptions {
    /// Every mode on, as the panic hook assumes.
    const ALL: Self = Self {
        alternate_screen: true,
        hide_cursor: true,
        bracketed_paste: true,
    };
}

/// RAII guard for terminal modes.
///
/// ```no_run
/// use weft_core::terminal_session::{SessionOptions, TerminalSession};
///
/// let session = TerminalSession::new(SessionOptions {
///     alternate_screen: true,
///     hide_cursor: true,
///     ..Default::default()
/// })?;
/// // ... draw frames ...
/// drop(session);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct TerminalSession {
    options: SessionOptions,
    /// Modes actually switched on so far; only these are undone.
    active: SessionOptions,
}

impl TerminalSession {
    /// Enter raw mode and enable the requested modes.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode or any requested mode cannot be enabled.
    /// Modes enabled before the failure are restored when the partially
    /// built session is dropped.
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        install_panic_hook();

        crossterm::terminal::enable_raw_mode()?;
        crate::info!("terminal raw mode enabled");

        let mut session = Self {
            options,
            active: SessionOptions::default(),
        };
        let mut out = io::stdout();
        if options.alternate_screen {
            crossterm::execute!(out, crossterm::terminal::EnterAlternateScreen)?;
            session.active.alternate_screen = true;
        }
        if options.hide_cursor {
            crossterm::execute!(out, crossterm::cursor::Hide)?;
            session.active.hide_cursor = true;
        }
        if options.bracketed_paste {
            crossterm::execute!(out, crossterm::event::EnableBracketedPaste)?;
            session.active.bracketed_paste = true;
        }
        crate::info!(
            alternate_screen = options.alternate_screen,
            bracketed_paste = options.bracketed_paste,
            "terminal modes enabled"
        );
        Ok(session)
    }

    /// The options this session was created with.
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        restore(self.active);
        self.active = SessionOptions::default();
        crate::info!("terminal restored");
    }
}

/// Undo `modes` in reverse order of enabling, then leave raw mode.
/// The cursor is always shown again. Errors are ignored.
fn restore(modes: SessionOptions) {
    let mut out = io::stdout();
    if modes.bracketed_paste {
        let _ = crossterm::execute!(out, crossterm::event::DisableBracketedPaste);
    }
    let _ = crossterm::execute!(out, crossterm::cursor::Show);
    if modes.alternate_screen {
        let _ = crossterm::execute!(out, crossterm::terminal::LeaveAlternateScreen);
    }
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = out.flush();
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore(SessionOptions::ALL);
            previous(info);
        }));
    });
}
