#![forbid(unsafe_code)]

//! Cloneable "needs render" flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Request a frame from anywhere: views, state handles, background threads.
///
/// The run loop consumes the flag once per tick.
#[derive(Debug, Clone, Default)]
pub struct DirtyHandle {
    flag: Arc<AtomicBool>,
}

impl DirtyHandle {
    /// A fresh, clean flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the UI dirty.
    pub fn mark(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether a render is pending (does not consume).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Consume the flag.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::Relaxed)
    }
}
