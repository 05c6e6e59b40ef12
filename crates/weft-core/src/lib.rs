#![forbid(unsafe_code)]

//! Core: key events, terminal lifecycle, backends, and signal flags.

pub mod backend;
pub mod event;
pub mod logging;
pub mod signals;
pub mod terminal_session;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, error, info, trace, warn};

pub use backend::{CrosstermBackend, HeadlessBackend, TerminalBackend};
pub use event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use signals::{SignalFlags, SignalMapping, SignalRegistration};
pub use terminal_session::{SessionOptions, TerminalSession};
