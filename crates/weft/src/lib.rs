#![forbid(unsafe_code)]

//! weft public facade crate.
//!
//! This crate provides the stable surface area for applications. It
//! re-exports the common types from the internal crates and offers a small
//! prelude for day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use weft_core::backend::{CrosstermBackend, HeadlessBackend, TerminalBackend};
pub use weft_core::event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use weft_core::signals::{SignalFlags, SignalMapping};
pub use weft_core::terminal_session::{SessionOptions, TerminalSession};

// --- Render re-exports -----------------------------------------------------

pub use weft_render::{FrameDiffCache, OutputBuffer, Region, visible_width};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use weft_runtime::{
    AnyView, App, Body, CollaboratorError, DefaultBindings, Environment, EnvironmentKey,
    FailureKind, Fallback, FocusRequests, FocusTarget, FrameReport, HStack, Header, KeyBinding,
    Keyed, Memo, OnKey, Overlay, Program, ProgramConfig, ProgramHandle, RenderContext, Section,
    State, StatusItem, Text, VStack, View, ViewError, WithEnv, view_fn,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for weft apps.
#[derive(Debug)]
pub enum Error {
    /// I/O failure during terminal operations.
    Io(std::io::Error),
    /// Terminal or runtime error with message.
    Terminal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Terminal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Terminal(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Standard result type for weft APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Run `app` on the real terminal until it quits.
///
/// # Errors
///
/// Returns terminal setup, signal registration and write failures.
#[cfg(feature = "runtime")]
pub fn run<A: App>(app: A, config: ProgramConfig) -> Result<()> {
    let backend = CrosstermBackend::new();
    Program::new(app, backend, config).run()?;
    Ok(())
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{Error, Event, KeyCode, KeyEvent, Modifiers, OutputBuffer, Result};

    #[cfg(feature = "runtime")]
    pub use crate::{
        AnyView, App, Body, FocusTarget, HStack, Header, KeyBinding, Program, ProgramConfig,
        RenderContext, Section, StatusItem, Text, VStack, View, view_fn,
    };

    pub use crate::{core, render};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use weft_core as core;
pub use weft_render as render;
#[cfg(feature = "runtime")]
pub use weft_runtime as runtime;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_and_keep_source() {
        let err: Error = std::io::Error::other("tty gone").into();
        assert_eq!(err.to_string(), "tty gone");
        assert!(std::error::Error::source(&err).is_some());
        let terminal = Error::Terminal("not a tty".into());
        assert!(std::error::Error::source(&terminal).is_none());
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn prelude_builds_a_headless_program() {
        use crate::prelude::*;

        struct Hi;
        impl App for Hi {
            fn view(&mut self) -> AnyView {
                Box::new(Text::new("hi"))
            }
        }

        let config = ProgramConfig::default().with_signals(SignalMapping::none());
        let mut program = Program::new(Hi, HeadlessBackend::new(8, 2), config);
        program.start().unwrap();
        program.tick().unwrap();
        assert!(program.backend().last_frame().unwrap().contains("hi"));
    }
}
