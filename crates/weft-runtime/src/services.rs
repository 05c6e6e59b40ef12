#![forbid(unsafe_code)]

//! Per-frame registries and the subsystems views talk to.
//!
//! [`FrameServices`] is owned by the renderer and lent to every
//! [`crate::view::RenderContext`] of a pass. Registries (key handlers,
//! header, status items, errors, focus sections) are rebuilt on every pass;
//! the state store and memo cache are swept once per frame.

use std::collections::HashMap;
use std::fmt;

use weft_render::OutputBuffer;

use crate::dirty::DirtyHandle;
use crate::error::ViewError;
use crate::focus::FocusManager;
use crate::identity::IdentityPath;
use crate::state::StateStore;
use crate::status::StatusItem;
use crate::theme::Theme;
use crate::view::KeyHandler;

struct MemoEntry {
    deps: u64,
    width: usize,
    height: usize,
    buffer: OutputBuffer,
    seen: bool,
}

/// Subsystems shared by all views of a frame.
pub struct FrameServices {
    pub(crate) focus: FocusManager,
    pub(crate) state: StateStore,
    pub(crate) key_handlers: Vec<KeyHandler>,
    pub(crate) header: Option<OutputBuffer>,
    pub(crate) status: Vec<StatusItem>,
    pub(crate) errors: Vec<ViewError>,
    pub(crate) theme: Theme,
    memo: HashMap<IdentityPath, MemoEntry>,
    dirty: DirtyHandle,
}

impl fmt::Debug for FrameServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameServices")
            .field("focus", &self.focus)
            .field("state", &self.state)
            .field("key_handlers", &self.key_handlers.len())
            .field("header", &self.header.as_ref().map(OutputBuffer::height))
            .field("status", &self.status)
            .field("errors", &self.errors)
            .field("memo", &self.memo.len())
            .finish()
    }
}

impl FrameServices {
    /// Fresh services whose state handles mark `dirty`.
    #[must_use]
    pub fn new(dirty: DirtyHandle) -> Self {
        Self {
            focus: FocusManager::new(),
            state: StateStore::new(dirty.clone()),
            key_handlers: Vec::new(),
            header: None,
            status: Vec::new(),
            errors: Vec::new(),
            theme: Theme::default(),
            memo: HashMap::new(),
            dirty,
        }
    }

    /// Start a frame: clear the seen marks of everything swept at its end.
    pub fn begin_frame(&mut self) {
        self.state.begin_frame();
        for entry in self.memo.values_mut() {
            entry.seen = false;
        }
    }

    /// Start a pass: drop every per-pass registration.
    pub fn begin_pass(&mut self) {
        self.focus.begin_pass();
        self.key_handlers.clear();
        self.header = None;
        self.status.clear();
        self.errors.clear();
    }

    /// Finish a frame: expire unseen state, hooks and memo entries.
    pub fn end_frame(&mut self) -> usize {
        self.memo.retain(|_, entry| entry.seen);
        self.state.end_frame()
    }

    /// Drop every memoized render.
    pub fn purge_memo(&mut self) {
        if !self.memo.is_empty() {
            tracing::debug!(entries = self.memo.len(), "memo cache purged");
        }
        self.memo.clear();
    }

    pub(crate) fn memo_lookup(
        &mut self,
        path: &IdentityPath,
        deps: u64,
        width: usize,
        height: usize,
    ) -> Option<OutputBuffer> {
        let entry = self.memo.get_mut(path)?;
        if entry.deps != deps || entry.width != width || entry.height != height {
            return None;
        }
        entry.seen = true;
        Some(entry.buffer.clone())
    }

    pub(crate) fn memo_store(
        &mut self,
        path: &IdentityPath,
        deps: u64,
        width: usize,
        height: usize,
        buffer: OutputBuffer,
    ) {
        self.memo.insert(
            path.clone(),
            MemoEntry {
                deps,
                width,
                height,
                buffer,
                seen: true,
            },
        );
    }

    /// Number of memoized renders.
    #[must_use]
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Focus manager.
    #[must_use]
    pub fn focus(&self) -> &FocusManager {
        &self.focus
    }

    /// Focus manager, mutably.
    pub fn focus_mut(&mut self) -> &mut FocusManager {
        &mut self.focus
    }

    /// Path-keyed state store.
    #[must_use]
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Palette and appearance.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Palette and appearance, mutably.
    pub fn theme_mut(&mut self) -> &mut Theme {
        &mut self.theme
    }

    /// Key handlers registered by the last pass, oldest first.
    #[must_use]
    pub fn key_handlers(&self) -> &[KeyHandler] {
        &self.key_handlers
    }

    /// Status items registered by the last pass.
    #[must_use]
    pub fn status_items(&self) -> &[StatusItem] {
        &self.status
    }

    /// Header set by the last pass.
    #[must_use]
    pub fn header(&self) -> Option<&OutputBuffer> {
        self.header.as_ref()
    }

    /// Errors recorded by the last pass.
    #[must_use]
    pub fn errors(&self) -> &[ViewError] {
        &self.errors
    }

    /// Handle for requesting another frame.
    #[must_use]
    pub fn dirty(&self) -> DirtyHandle {
        self.dirty.clone()
    }

    /// Forget focus, state and memoized renders (teardown).
    pub fn clear(&mut self) {
        self.begin_pass();
        self.focus.clear();
        self.state.clear();
        self.memo.clear();
    }
}
