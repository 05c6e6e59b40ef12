#![forbid(unsafe_code)]

//! Focus sections and keyboard focus.
//!
//! Targets register into named sections every frame; the registry is
//! rebuilt from scratch each time. Only two scalars persist between frames:
//! the active section id and the focused target id. Because targets are
//! matched by id, a target that re-registers with the same id keeps focus
//! even though it is a brand new object.
//!
//! # State machine
//!
//! - Registration creates sections on demand. The first section created
//!   becomes active when none is. While nothing is focused, a focusable
//!   target registering into the active section takes focus.
//! - Tab / Shift+Tab cycle sections (wrapping) when there are several, and
//!   cycle targets of the single section otherwise.
//! - Arrow keys cycle targets in the active section when the focused target
//!   does not consume them.
//! - Activating a section focuses its first focusable target (lost fires on
//!   the old target before gained on the new one).
//! - End-of-frame validation repairs a missing active section (first
//!   registered section) and a missing or unfocusable focused target (first
//!   focusable target of the active section, which is notified).
//!
//! Targets cannot reach the manager while it dispatches to them. They queue
//! moves on a [`FocusRequests`] handle instead; the manager applies the queue
//! after each key dispatch and before end-of-frame validation.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use weft_core::event::{KeyCode, KeyEvent};

/// Something that can own keyboard focus.
///
/// State belongs to the target (or to a [`crate::state::State`] it holds),
/// never to the focus manager; the manager only remembers ids.
pub trait FocusTarget {
    /// Stable identity across frames.
    fn focus_id(&self) -> &str;

    /// Whether the target may receive focus right now.
    fn can_focus(&self) -> bool {
        true
    }

    /// Called when the target becomes focused.
    fn focus_gained(&self) {}

    /// Called when the target stops being focused.
    fn focus_lost(&self) {}

    /// Handle a key while focused. Return `true` when consumed.
    fn handle_key(&self, _key: &KeyEvent) -> bool {
        false
    }

    /// Free-text editors get first refusal on every key while focused.
    fn is_text_input(&self) -> bool {
        false
    }
}

/// A named, ordered collection of targets, rebuilt every frame.
pub struct FocusSection {
    id: Rc<str>,
    targets: Vec<Rc<dyn FocusTarget>>,
}

impl FocusSection {
    /// Section id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Registered targets, in registration order.
    #[must_use]
    pub fn targets(&self) -> &[Rc<dyn FocusTarget>] {
        &self.targets
    }

    fn find(&self, id: &str) -> Option<&Rc<dyn FocusTarget>> {
        self.targets.iter().find(|t| t.focus_id() == id)
    }

    fn first_focusable(&self) -> Option<&Rc<dyn FocusTarget>> {
        self.targets.iter().find(|t| t.can_focus())
    }
}

impl fmt::Debug for FocusSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.targets.iter().map(|t| t.focus_id()).collect();
        f.debug_struct("FocusSection")
            .field("id", &self.id)
            .field("targets", &ids)
            .finish()
    }
}

/// Persisted focus scalars, for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FocusSnapshot {
    /// Active section id.
    pub active_section: Option<Rc<str>>,
    /// Focused target id.
    pub focused: Option<Rc<str>>,
}

/// A queued focus move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusRequest {
    /// Tab (`true`) or Shift+Tab (`false`) navigation.
    Tab(bool),
    /// Focus the target with this id.
    Focus(Rc<str>),
}

/// Cloneable queue of [`FocusRequest`]s shared with the manager.
#[derive(Debug, Clone, Default)]
pub struct FocusRequests {
    queue: Rc<RefCell<Vec<FocusRequest>>>,
}

impl FocusRequests {
    /// Queue Tab (`forward`) or Shift+Tab navigation.
    pub fn tab(&self, forward: bool) {
        self.queue.borrow_mut().push(FocusRequest::Tab(forward));
    }

    /// Queue focusing `id`.
    pub fn focus(&self, id: &str) {
        self.queue.borrow_mut().push(FocusRequest::Focus(Rc::from(id)));
    }

    /// Number of queued requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    fn take(&self) -> Vec<FocusRequest> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}

/// Tracks sections and the focused target across frames.
#[derive(Debug, Default)]
pub struct FocusManager {
    sections: Vec<FocusSection>,
    active_section: Option<Rc<str>>,
    focused: Option<Rc<str>>,
    requests: FocusRequests,
}

impl FocusManager {
    /// An empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop this frame's registrations. The persisted scalars stay.
    pub fn begin_pass(&mut self) {
        self.sections.clear();
    }

    /// Register `target` into `section`, creating the section on demand.
    pub fn register(&mut self, section: &str, target: Rc<dyn FocusTarget>) {
        let index = match self.sections.iter().position(|s| &*s.id == section) {
            Some(index) => index,
            None => {
                self.sections.push(FocusSection {
                    id: Rc::from(section),
                    targets: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        if self.active_section.is_none() {
            self.active_section = Some(Rc::clone(&self.sections[index].id));
        }

        let slot = &mut self.sections[index];
        match slot
            .targets
            .iter()
            .position(|t| t.focus_id() == target.focus_id())
        {
            Some(existing) => slot.targets[existing] = Rc::clone(&target),
            None => slot.targets.push(Rc::clone(&target)),
        }

        let in_active = self.active_section.as_deref() == Some(section);
        if in_active && self.focused.is_none() && target.can_focus() {
            self.focused = Some(Rc::from(target.focus_id()));
            tracing::debug!(id = target.focus_id(), section, "auto-focused");
            target.focus_gained();
        }
    }

    /// Registered sections, in creation order.
    #[must_use]
    pub fn sections(&self) -> &[FocusSection] {
        &self.sections
    }

    /// Active section id.
    #[must_use]
    pub fn active_section(&self) -> Option<&str> {
        self.active_section.as_deref()
    }

    /// Focused target id.
    #[must_use]
    pub fn focused_id(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Current scalars.
    #[must_use]
    pub fn snapshot(&self) -> FocusSnapshot {
        FocusSnapshot {
            active_section: self.active_section.clone(),
            focused: self.focused.clone(),
        }
    }

    /// Whether `id` is the focused target.
    #[must_use]
    pub fn is_focused(&self, id: &str) -> bool {
        self.focused.as_deref() == Some(id)
    }

    /// The focused target, if it registered this frame in the active section.
    #[must_use]
    pub fn focused_target(&self) -> Option<Rc<dyn FocusTarget>> {
        let focused = self.focused.as_deref()?;
        self.active()?.find(focused).cloned()
    }

    fn active(&self) -> Option<&FocusSection> {
        let active = self.active_section.as_deref()?;
        self.sections.iter().find(|s| &*s.id == active)
    }

    fn active_index(&self) -> Option<usize> {
        let active = self.active_section.as_deref()?;
        self.sections.iter().position(|s| &*s.id == active)
    }

    /// Make `section` active and focus its first focusable target.
    ///
    /// Returns `false` when no such section registered this frame.
    pub fn activate_section(&mut self, section: &str) -> bool {
        let Some(index) = self.sections.iter().position(|s| &*s.id == section) else {
            return false;
        };
        if let Some(old) = self.focused_target() {
            old.focus_lost();
        }
        let next = &self.sections[index];
        self.active_section = Some(Rc::clone(&next.id));
        let first = next.first_focusable().cloned();
        self.focused = first.as_ref().map(|t| Rc::from(t.focus_id()));
        tracing::debug!(section, focused = ?self.focused, "section activated");
        if let Some(target) = first {
            target.focus_gained();
        }
        true
    }

    /// Move to the next (or previous) section, wrapping.
    pub fn cycle_section(&mut self, forward: bool) -> bool {
        let count = self.sections.len();
        if count == 0 {
            return false;
        }
        let next = match self.active_index() {
            Some(current) => step(current, count, forward),
            None => 0,
        };
        let id = Rc::clone(&self.sections[next].id);
        self.activate_section(&id)
    }

    /// Move focus to the next (or previous) focusable target of the active
    /// section, wrapping. Returns `false` when there is nothing to focus.
    pub fn cycle_target(&mut self, forward: bool) -> bool {
        let Some(section) = self.active() else {
            return false;
        };
        let focusable: Vec<Rc<dyn FocusTarget>> = section
            .targets
            .iter()
            .filter(|t| t.can_focus())
            .cloned()
            .collect();
        if focusable.is_empty() {
            return false;
        }
        let current = self
            .focused
            .as_deref()
            .and_then(|id| focusable.iter().position(|t| t.focus_id() == id));
        let next = match current {
            Some(current) => step(current, focusable.len(), forward),
            None if forward => 0,
            None => focusable.len() - 1,
        };
        if current == Some(next) {
            return true;
        }
        self.move_focus(&focusable[next]);
        true
    }

    /// Focus `id` wherever it registered, activating its section.
    pub fn focus(&mut self, id: &str) -> bool {
        let found = self.sections.iter().find_map(|section| {
            section
                .find(id)
                .filter(|t| t.can_focus())
                .map(|t| (Rc::clone(&section.id), Rc::clone(t)))
        });
        let Some((section, target)) = found else {
            return false;
        };
        if self.is_focused(id) && self.active_section.as_deref() == Some(&*section) {
            return true;
        }
        self.active_section = Some(section);
        self.move_focus(&target);
        true
    }

    fn move_focus(&mut self, target: &Rc<dyn FocusTarget>) {
        if let Some(old) = self.focused_target() {
            old.focus_lost();
        }
        self.focused = Some(Rc::from(target.focus_id()));
        tracing::debug!(id = target.focus_id(), "focus moved");
        target.focus_gained();
    }

    /// End-of-frame validation.
    pub fn finish_frame(&mut self) {
        if self.sections.is_empty() {
            return;
        }
        if self.active().is_none() {
            self.active_section = Some(Rc::clone(&self.sections[0].id));
            tracing::debug!(section = ?self.active_section, "active section fell back");
        }
        let valid = self
            .focused_target()
            .is_some_and(|target| target.can_focus());
        if valid {
            return;
        }
        let first = self.active().and_then(|s| s.first_focusable()).cloned();
        self.focused = first.as_ref().map(|t| Rc::from(t.focus_id()));
        tracing::debug!(focused = ?self.focused, "focus fell back");
        if let Some(target) = first {
            target.focus_gained();
        }
    }

    /// Offer `key` to the focused target, then apply navigation fallbacks.
    pub fn dispatch_key(&mut self, key: &KeyEvent) -> bool {
        if let Some(target) = self.focused_target()
            && target.handle_key(key)
        {
            return true;
        }
        self.navigate(key)
    }

    /// Tab / Shift+Tab and arrow navigation only.
    pub fn navigate(&mut self, key: &KeyEvent) -> bool {
        if let Some(forward) = key.tab_direction() {
            return self.tab(forward);
        }
        if !key.modifiers.is_empty() {
            return false;
        }
        match key.code {
            KeyCode::Down | KeyCode::Right => self.cycle_target(true),
            KeyCode::Up | KeyCode::Left => self.cycle_target(false),
            _ => false,
        }
    }

    /// Sections when there are several, targets of the single one otherwise.
    fn tab(&mut self, forward: bool) -> bool {
        if self.sections.len() > 1 {
            self.cycle_section(forward)
        } else {
            self.cycle_target(forward)
        }
    }

    /// Handle for queueing focus moves.
    #[must_use]
    pub fn requests(&self) -> FocusRequests {
        self.requests.clone()
    }

    /// Apply queued requests in order. Returns `true` when any of them
    /// found something to focus.
    pub fn apply_requests(&mut self) -> bool {
        let mut applied = false;
        for request in self.requests.take() {
            let done = match &request {
                FocusRequest::Tab(forward) => self.tab(*forward),
                FocusRequest::Focus(id) => self.focus(id),
            };
            if !done {
                tracing::debug!(?request, "focus request dropped");
            }
            applied |= done;
        }
        applied
    }

    /// Forget everything (teardown).
    pub fn clear(&mut self) {
        self.sections.clear();
        self.active_section = None;
        self.focused = None;
        self.requests.take();
    }
}

fn step(current: usize, count: usize, forward: bool) -> usize {
    if forward {
        (current + 1) % count
    } else {
        (current + count - 1) % count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use weft_core::event::Modifiers;

    struct Stub {
        id: &'static str,
        focusable: bool,
        gained: Cell<u32>,
        lost: Cell<u32>,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Stub {
        fn new(id: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Rc<Self> {
            Rc::new(Self {
                id,
                focusable: true,
                gained: Cell::new(0),
                lost: Cell::new(0),
                log: Rc::clone(log),
            })
        }

        fn disabled(id: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Rc<Self> {
            Rc::new(Self {
                focusable: false,
                ..Rc::into_inner(Self::new(id, log)).unwrap()
            })
        }
    }

    impl FocusTarget for Stub {
        fn focus_id(&self) -> &str {
            self.id
        }
        fn can_focus(&self) -> bool {
            self.focusable
        }
        fn focus_gained(&self) {
            self.gained.set(self.gained.get() + 1);
            self.log.borrow_mut().push(format!("+{}", self.id));
        }
        fn focus_lost(&self) {
            self.lost.set(self.lost.get() + 1);
            self.log.borrow_mut().push(format!("-{}", self.id));
        }
        fn handle_key(&self, key: &KeyEvent) -> bool {
            key.is_char('x')
        }
    }

    fn log() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn first_section_becomes_active_and_first_target_focused() {
        let log = log();
        let mut focus = FocusManager::new();
        let a = Stub::new("a", &log);
        focus.register("main", a.clone());
        focus.register("main", Stub::new("b", &log));
        focus.register("side", Stub::new("c", &log));

        assert_eq!(focus.active_section(), Some("main"));
        assert_eq!(focus.focused_id(), Some("a"));
        assert_eq!(a.gained.get(), 1);
    }

    #[test]
    fn unfocusable_target_is_skipped_by_auto_focus() {
        let log = log();
        let mut focus = FocusManager::new();
        focus.register("main", Stub::disabled("label", &log));
        assert_eq!(focus.focused_id(), None);
        focus.register("main", Stub::new("field", &log));
        assert_eq!(focus.focused_id(), Some("field"));
    }

    #[test]
    fn focus_survives_rebuild_by_id() {
        let log = log();
        let mut focus = FocusManager::new();
        focus.register("main", Stub::new("a", &log));
        focus.register("main", Stub::new("x", &log));
        assert!(focus.focus("x"));
        focus.finish_frame();

        focus.begin_pass();
        let a = Stub::new("a", &log);
        let x = Stub::new("x", &log);
        focus.register("main", a.clone());
        focus.register("main", x.clone());
        focus.finish_frame();

        assert_eq!(focus.focused_id(), Some("x"));
        assert_eq!(a.gained.get(), 0);
        assert_eq!(x.gained.get(), 0);
    }

    #[test]
    fn missing_focused_target_falls_back_and_notifies() {
        let log = log();
        let mut focus = FocusManager::new();
        focus.register("main", Stub::new("a", &log));
        focus.register("main", Stub::new("gone", &log));
        focus.focus("gone");
        focus.finish_frame();

        focus.begin_pass();
        let a = Stub::new("a", &log);
        focus.register("main", a.clone());
        focus.finish_frame();

        assert_eq!(focus.focused_id(), Some("a"));
        assert_eq!(a.gained.get(), 1);
    }

    #[test]
    fn missing_active_section_falls_back_to_first() {
        let log = log();
        let mut focus = FocusManager::new();
        focus.register("one", Stub::new("a", &log));
        focus.register("two", Stub::new("b", &log));
        focus.activate_section("two");
        focus.finish_frame();

        focus.begin_pass();
        let a = Stub::new("a", &log);
        focus.register("one", a.clone());
        focus.finish_frame();
        assert_eq!(focus.active_section(), Some("one"));
        assert_eq!(focus.focused_id(), Some("a"));
        assert_eq!(a.gained.get(), 1);
    }

    #[test]
    fn unfocusable_focused_target_is_treated_as_absent() {
        let log = log();
        let mut focus = FocusManager::new();
        focus.register("main", Stub::new("a", &log));
        focus.register("main", Stub::new("b", &log));
        focus.focus("b");
        focus.finish_frame();

        focus.begin_pass();
        focus.register("main", Stub::new("a", &log));
        focus.register("main", Stub::disabled("b", &log));
        focus.finish_frame();
        assert_eq!(focus.focused_id(), Some("a"));
    }

    #[test]
    fn section_cycling_wraps() {
        let log = log();
        let mut focus = FocusManager::new();
        for (section, id) in [("A", "a"), ("B", "b"), ("C", "c")] {
            focus.register(section, Stub::new(id, &log));
        }
        assert_eq!(focus.active_section(), Some("A"));

        focus.cycle_section(true);
        assert_eq!(focus.active_section(), Some("B"));
        assert_eq!(focus.focused_id(), Some("b"));

        focus.cycle_section(true);
        focus.cycle_section(true);
        assert_eq!(focus.active_section(), Some("A"));

        focus.cycle_section(false);
        assert_eq!(focus.active_section(), Some("C"));
    }

    #[test]
    fn activation_fires_lost_before_gained() {
        let log = log();
        let mut focus = FocusManager::new();
        focus.register("A", Stub::new("a", &log));
        focus.register("B", Stub::new("b", &log));
        log.borrow_mut().clear();

        focus.activate_section("B");
        assert_eq!(*log.borrow(), ["-a", "+b"]);
    }

    #[test]
    fn tab_cycles_targets_with_single_section() {
        let log = log();
        let mut focus = FocusManager::new();
        for id in ["a", "b", "c"] {
            focus.register("only", Stub::new(id, &log));
        }
        let tab = KeyEvent::new(KeyCode::Tab);
        let back = KeyEvent::new(KeyCode::BackTab);

        assert!(focus.dispatch_key(&tab));
        assert_eq!(focus.focused_id(), Some("b"));
        assert!(focus.dispatch_key(&tab));
        assert!(focus.dispatch_key(&tab));
        assert_eq!(focus.focused_id(), Some("a"));
        assert!(focus.dispatch_key(&back));
        assert_eq!(focus.focused_id(), Some("c"));
    }

    #[test]
    fn tab_cycles_sections_when_several() {
        let log = log();
        let mut focus = FocusManager::new();
        focus.register("A", Stub::new("a1", &log));
        focus.register("A", Stub::new("a2", &log));
        focus.register("B", Stub::new("b1", &log));

        let shift_tab = KeyEvent::new(KeyCode::Tab).with_modifiers(Modifiers::SHIFT);
        assert!(focus.dispatch_key(&shift_tab));
        assert_eq!(focus.active_section(), Some("B"));
        assert_eq!(focus.focused_id(), Some("b1"));
    }

    #[test]
    fn arrows_cycle_targets_as_fallback() {
        let log = log();
        let mut focus = FocusManager::new();
        focus.register("A", Stub::new("a1", &log));
        focus.register("A", Stub::new("a2", &log));
        focus.register("B", Stub::new("b1", &log));

        assert!(focus.dispatch_key(&KeyEvent::new(KeyCode::Down)));
        assert_eq!(focus.focused_id(), Some("a2"));
        assert!(focus.dispatch_key(&KeyEvent::new(KeyCode::Right)));
        assert_eq!(focus.focused_id(), Some("a1"));
        assert!(focus.dispatch_key(&KeyEvent::new(KeyCode::Up)));
        assert_eq!(focus.focused_id(), Some("a2"));
        assert_eq!(focus.active_section(), Some("A"));
    }

    #[test]
    fn focused_target_consumes_first() {
        let log = log();
        let mut focus = FocusManager::new();
        focus.register("A", Stub::new("a", &log));
        assert!(focus.dispatch_key(&KeyEvent::char('x')));
        assert!(!focus.dispatch_key(&KeyEvent::char('y')));
    }

    #[test]
    fn queued_requests_apply_in_order() {
        let log = log();
        let mut focus = FocusManager::new();
        focus.register("A", Stub::new("a", &log));
        focus.register("B", Stub::new("b1", &log));
        focus.register("B", Stub::new("b2", &log));
        let requests = focus.requests();

        requests.tab(true);
        requests.focus("b2");
        requests.focus("missing");
        assert_eq!(requests.len(), 3);
        assert_eq!(focus.focused_id(), Some("a"));

        assert!(focus.apply_requests());
        assert!(requests.is_empty());
        assert_eq!(focus.active_section(), Some("B"));
        assert_eq!(focus.focused_id(), Some("b2"));
        assert!(!focus.apply_requests());
    }

    #[test]
    fn clear_forgets_scalars() {
        let log = log();
        let mut focus = FocusManager::new();
        focus.register("A", Stub::new("a", &log));
        focus.requests().tab(true);
        focus.clear();
        assert_eq!(focus.snapshot(), FocusSnapshot::default());
        assert!(focus.sections().is_empty());
        assert!(focus.requests().is_empty());
    }
}
