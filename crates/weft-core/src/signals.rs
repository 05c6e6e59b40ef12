#![forbid(unsafe_code)]

//! Signal flags shared between OS signal delivery, timers and the run loop.
//!
//! Signal handlers may interrupt arbitrary code, so the only thing they do
//! here is store `true` into an [`AtomicBool`]. Registration goes through
//! `signal_hook::flag`, whose handlers perform exactly that single atomic
//! store. The run loop consumes the flags synchronously with
//! [`SignalFlags::take_rerender`] and [`SignalFlags::take_resized`]
//! (read-and-reset). A lost or duplicated flag costs at most one redundant or
//! one delayed frame.
//!
//! # Mapping
//!
//! | Signal | Flags set |
//! |--------|-----------|
//! | `SIGINT`, `SIGTERM` | shutdown-requested |
//! | `SIGWINCH` | rerender-requested + terminal-resized |
//!
//! The mapping is configurable through [`SignalMapping`].

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The three process-lifetime flags the run loop polls.
///
/// Cloning is cheap and shares the underlying atomics.
#[derive(Debug, Clone, Default)]
pub struct SignalFlags {
    rerender: Arc<AtomicBool>,
    resized: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
}

impl SignalFlags {
    /// Create a fresh set of cleared flags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for one more frame.
    pub fn request_rerender(&self) {
        self.rerender.store(true, Ordering::Relaxed);
    }

    /// Record a terminal resize (also requests a frame).
    pub fn notify_resized(&self) {
        self.resized.store(true, Ordering::Relaxed);
        self.rerender.store(true, Ordering::Relaxed);
    }

    /// Ask the run loop to exit after the current tick.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Consume the rerender flag.
    pub fn take_rerender(&self) -> bool {
        self.rerender.swap(false, Ordering::Relaxed)
    }

    /// Consume the resized flag.
    pub fn take_resized(&self) -> bool {
        self.resized.swap(false, Ordering::Relaxed)
    }

    /// Shutdown is sticky: once requested it stays requested.
    #[must_use]
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Handle to the rerender flag for timers and other producers.
    #[must_use]
    pub fn rerender_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.rerender)
    }

    /// Register OS signal handlers that set these flags.
    ///
    /// The returned guard unregisters the handlers when dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a signal cannot be registered (for example a
    /// forbidden signal number in the mapping).
    #[cfg(unix)]
    pub fn install(&self, mapping: &SignalMapping) -> io::Result<SignalRegistration> {
        let mut ids = Vec::with_capacity(mapping.shutdown.len() + mapping.resize.len() * 2);
        for &signal in &mapping.shutdown {
            ids.push(signal_hook::flag::register(signal, Arc::clone(&self.shutdown))?);
        }
        for &signal in &mapping.resize {
            ids.push(signal_hook::flag::register(signal, Arc::clone(&self.resized))?);
            ids.push(signal_hook::flag::register(signal, Arc::clone(&self.rerender))?);
        }
        crate::debug!(handlers = ids.len(), "signal flags installed");
        Ok(SignalRegistration { ids })
    }

    /// Signals are not available on this platform; resize arrives as an input
    /// event instead.
    #[cfg(not(unix))]
    pub fn install(&self, _mapping: &SignalMapping) -> io::Result<SignalRegistration> {
        Ok(SignalRegistration {})
    }
}

/// Which OS signals map to which flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalMapping {
    /// Signals that request shutdown.
    pub shutdown: Vec<i32>,
    /// Signals that report a terminal resize.
    pub resize: Vec<i32>,
}

impl Default for SignalMapping {
    #[cfg(unix)]
    fn default() -> Self {
        use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGWINCH};
        Self {
            shutdown: vec![SIGINT, SIGTERM],
            resize: vec![SIGWINCH],
        }
    }

    #[cfg(not(unix))]
    fn default() -> Self {
        Self::none()
    }
}

impl SignalMapping {
    /// A mapping that installs no handlers.
    #[must_use]
    pub fn none() -> Self {
        Self {
            shutdown: Vec::new(),
            resize: Vec::new(),
        }
    }
}

/// Guard for installed signal handlers.
#[derive(Debug)]
pub struct SignalRegistration {
    #[cfg(unix)]
    ids: Vec<signal_hook::SigId>,
}

#[cfg(unix)]
impl Drop for SignalRegistration {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}
