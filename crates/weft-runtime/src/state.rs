#![forbid(unsafe_code)]

//! Path-keyed view state and lifecycle hooks.
//!
//! Views are rebuilt every frame, so anything that must outlive a frame
//! lives here, keyed by the view's [`IdentityPath`]. Each frame:
//!
//! 1. [`StateStore::begin_frame`] clears every "seen" mark.
//! 2. Views touching their state (or registering a disappear hook) mark
//!    their entries seen.
//! 3. [`StateStore::end_frame`] drops unseen entries and runs the disappear
//!    hooks of paths that were not seen.
//!
//! Writing through a [`State`] handle marks the UI dirty.

use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::dirty::DirtyHandle;
use crate::identity::IdentityPath;

/// Shared handle to one piece of view state.
pub struct State<T> {
    cell: Rc<RefCell<T>>,
    dirty: DirtyHandle,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            dirty: self.dirty.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("State").field(&self.cell.borrow()).finish()
    }
}

impl<T> State<T> {
    /// A detached handle (not stored anywhere), mainly for tests and for
    /// state owned by the application itself.
    pub fn detached(value: T, dirty: DirtyHandle) -> Self {
        Self {
            cell: Rc::new(RefCell::new(value)),
            dirty,
        }
    }

    /// Borrow the value.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.cell.borrow()
    }

    /// Read through a closure.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.borrow())
    }

    /// Replace the value and mark dirty.
    pub fn set(&self, value: T) {
        *self.cell.borrow_mut() = value;
        self.dirty.mark();
    }

    /// Mutate in place and mark dirty.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let out = f(&mut self.cell.borrow_mut());
        self.dirty.mark();
        out
    }

    /// Whether two handles share storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: Clone> State<T> {
    /// Clone the current value out.
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.borrow().clone()
    }
}

struct Entry {
    value: Rc<dyn Any>,
    seen: bool,
}

struct Hook {
    callback: Box<dyn FnOnce()>,
    seen: bool,
}

/// Store of path-keyed state and disappear hooks.
pub struct StateStore {
    entries: HashMap<(IdentityPath, TypeId), Entry>,
    hooks: HashMap<IdentityPath, Hook>,
    dirty: DirtyHandle,
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("entries", &self.entries.len())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl StateStore {
    /// An empty store whose handles mark `dirty` on write.
    #[must_use]
    pub fn new(dirty: DirtyHandle) -> Self {
        Self {
            entries: HashMap::new(),
            hooks: HashMap::new(),
            dirty,
        }
    }

    /// Clear all seen marks.
    pub fn begin_frame(&mut self) {
        for entry in self.entries.values_mut() {
            entry.seen = false;
        }
        for hook in self.hooks.values_mut() {
            hook.seen = false;
        }
    }

    /// The state of type `T` at `path`, created with `init` on first use.
    pub fn state<T: 'static>(&mut self, path: &IdentityPath, init: impl FnOnce() -> T) -> State<T> {
        let key = (path.clone(), TypeId::of::<T>());
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.seen = true;
            if let Ok(cell) = Rc::clone(&entry.value).downcast::<RefCell<T>>() {
                return State {
                    cell,
                    dirty: self.dirty.clone(),
                };
            }
        }
        let cell = Rc::new(RefCell::new(init()));
        let value: Rc<dyn Any> = cell.clone();
        self.entries.insert(key, Entry { value, seen: true });
        State {
            cell,
            dirty: self.dirty.clone(),
        }
    }

    /// Run `callback` once when no view at `path` is seen in some later
    /// frame. Re-registering replaces the previous callback.
    pub fn on_disappear(&mut self, path: &IdentityPath, callback: impl FnOnce() + 'static) {
        self.hooks.insert(
            path.clone(),
            Hook {
                callback: Box::new(callback),
                seen: true,
            },
        );
    }

    /// Keep the entries and hooks at or below `path` alive this frame
    /// without touching them (memoized sub-trees skip evaluation).
    pub fn retain(&mut self, path: &IdentityPath) {
        for ((entry_path, _), entry) in &mut self.entries {
            if entry_path.starts_with(path) {
                entry.seen = true;
            }
        }
        for (hook_path, hook) in &mut self.hooks {
            if hook_path.starts_with(path) {
                hook.seen = true;
            }
        }
    }

    /// Drop unseen entries and fire unseen hooks. Returns the number of
    /// entries and hooks expired.
    pub fn end_frame(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.seen);
        let mut expired = before - self.entries.len();

        let gone: Vec<IdentityPath> = self
            .hooks
            .iter()
            .filter(|(_, hook)| !hook.seen)
            .map(|(path, _)| path.clone())
            .collect();
        for path in gone {
            if let Some(hook) = self.hooks.remove(&path) {
                tracing::debug!(%path, "view disappeared");
                (hook.callback)();
                expired += 1;
            }
        }
        expired
    }

    /// Forget everything without firing hooks (teardown).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hooks.clear();
    }

    /// Number of live state entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No live state entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of registered disappear hooks.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn store() -> StateStore {
        StateStore::new(DirtyHandle::new())
    }

    #[test]
    fn state_survives_frames_when_seen() {
        let mut store = store();
        let path = IdentityPath::root().child("counter");

        store.begin_frame();
        store.state(&path, || 0u32).set(5);
        store.end_frame();

        store.begin_frame();
        assert_eq!(store.state(&path, || 0u32).get(), 5);
        assert_eq!(store.end_frame(), 0);
    }

    #[test]
    fn unseen_state_expires() {
        let mut store = store();
        let path = IdentityPath::root().child("gone");

        store.begin_frame();
        store.state(&path, || String::from("x"));
        store.end_frame();

        store.begin_frame();
        assert_eq!(store.end_frame(), 1);
        assert!(store.is_empty());

        store.begin_frame();
        assert_eq!(store.state(&path, || String::from("fresh")).get(), "fresh");
    }

    #[test]
    fn types_at_same_path_are_separate() {
        let mut store = store();
        let path = IdentityPath::root();
        store.state(&path, || 1u8);
        store.state(&path, || "s");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn disappear_hook_fires_once() {
        let mut store = store();
        let path = IdentityPath::root().child(3usize);
        let fired = Rc::new(Cell::new(0));

        store.begin_frame();
        let counter = Rc::clone(&fired);
        store.on_disappear(&path, move || counter.set(counter.get() + 1));
        store.end_frame();
        assert_eq!(fired.get(), 0);

        store.begin_frame();
        store.end_frame();
        assert_eq!(fired.get(), 1);

        store.begin_frame();
        store.end_frame();
        assert_eq!(fired.get(), 1);
        assert_eq!(store.hook_count(), 0);
    }

    #[test]
    fn retain_keeps_entries_without_access() {
        let mut store = store();
        let path = IdentityPath::root().child("memo");
        store.begin_frame();
        store.state(&path, || 1i32);
        store.end_frame();

        store.begin_frame();
        store.retain(&path);
        assert_eq!(store.end_frame(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn retain_covers_descendants_only() {
        let mut store = store();
        let memo = IdentityPath::root().child("memo");
        let inner = memo.child(0usize);
        let sibling = IdentityPath::root().child("other");
        store.state(&inner, || 1i32);
        store.state(&sibling, || 2i32);

        store.begin_frame();
        store.retain(&memo);
        assert_eq!(store.end_frame(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn writes_mark_dirty() {
        let dirty = DirtyHandle::new();
        let mut store = StateStore::new(dirty.clone());
        let state = store.state(&IdentityPath::root(), || 0);
        assert!(!dirty.is_dirty());
        state.update(|v| *v += 1);
        assert!(dirty.take());
        assert_eq!(state.get(), 1);
    }

    #[test]
    fn clear_does_not_fire_hooks() {
        let mut store = store();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        store.on_disappear(&IdentityPath::root(), move || flag.set(true));
        store.clear();
        assert!(!fired.get());
        assert_eq!(store.hook_count(), 0);
    }
}
