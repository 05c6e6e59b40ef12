#![forbid(unsafe_code)]

//! Input dispatch chain.
//!
//! Every key press walks a fixed priority order and stops at the first layer
//! that consumes it:
//!
//! | Layer | Consumer |
//! |-------|----------|
//! | 0 | Focused free-text editor (first refusal) |
//! | 1 | Status line items bound to an action |
//! | 2 | Per-frame key handlers, newest first |
//! | 3 | Focus manager: focused target, then Tab / arrow navigation |
//! | 4 | Built-in bindings: quit, cycle palette, toggle appearance |
//!
//! When layer 0 ran, layer 3 is skipped entirely: a key the editor declines
//! goes on to the built-in bindings. An editor that wants Tab to leave the
//! field queues the move on [`crate::focus::FocusRequests`] and consumes it.
//!
//! Release events are ignored. Queued focus requests are applied once the
//! walk is done. Any consumed key, or applied request, marks the UI dirty.

use weft_core::event::{KeyCode, KeyEvent, KeyEventKind};
use weft_core::signals::SignalFlags;

use crate::config::DefaultBindings;
use crate::services::FrameServices;

/// Which layer consumed a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Focused free-text editor.
    TextInput,
    /// Status line action.
    StatusLine,
    /// Ad hoc key handler.
    KeyHandler,
    /// Focus manager (target or navigation).
    Focus,
    /// Built-in binding.
    Default(DefaultAction),
}

/// Built-in actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultAction {
    /// Shutdown requested.
    Quit,
    /// Next palette.
    CyclePalette,
    /// Dark/light flipped.
    ToggleAppearance,
}

/// Result of dispatching one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Consumed by a layer.
    Consumed(Layer),
    /// No layer wanted it.
    Ignored,
}

impl DispatchOutcome {
    /// Whether a layer consumed the key.
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        matches!(self, Self::Consumed(_))
    }
}

/// Run `key` through the chain.
pub fn dispatch_key(
    services: &mut FrameServices,
    flags: &SignalFlags,
    bindings: DefaultBindings,
    key: &KeyEvent,
) -> DispatchOutcome {
    if key.kind == KeyEventKind::Release {
        return DispatchOutcome::Ignored;
    }
    let _span = tracing::trace_span!("weft.dispatch", key = ?key.code).entered();

    let outcome = walk(services, flags, bindings, key);
    let moved = services.focus.apply_requests();
    match outcome {
        DispatchOutcome::Consumed(layer) => tracing::trace!(?layer, "key consumed"),
        DispatchOutcome::Ignored => tracing::trace!("key ignored"),
    }
    if outcome.is_consumed() || moved {
        services.dirty().mark();
    }
    outcome
}

fn walk(
    services: &mut FrameServices,
    flags: &SignalFlags,
    bindings: DefaultBindings,
    key: &KeyEvent,
) -> DispatchOutcome {
    let text_input = services
        .focus
        .focused_target()
        .filter(|target| target.is_text_input());
    let offered_to_text_input = text_input.is_some();
    if let Some(target) = text_input
        && target.handle_key(key)
    {
        return DispatchOutcome::Consumed(Layer::TextInput);
    }

    let status = services.status.clone();
    if status.iter().any(|item| item.trigger(key)) {
        return DispatchOutcome::Consumed(Layer::StatusLine);
    }

    let handlers = services.key_handlers.clone();
    if handlers.iter().rev().any(|handler| handler(key)) {
        return DispatchOutcome::Consumed(Layer::KeyHandler);
    }

    if !offered_to_text_input && services.focus.dispatch_key(key) {
        return DispatchOutcome::Consumed(Layer::Focus);
    }

    match default_action(bindings, key) {
        Some(action) => {
            match action {
                DefaultAction::Quit => flags.request_shutdown(),
                DefaultAction::CyclePalette => services.theme.cycle_palette(),
                DefaultAction::ToggleAppearance => services.theme.toggle_appearance(),
            }
            DispatchOutcome::Consumed(Layer::Default(action))
        }
        None => DispatchOutcome::Ignored,
    }
}

fn default_action(bindings: DefaultBindings, key: &KeyEvent) -> Option<DefaultAction> {
    let KeyCode::Char(c) = key.code else {
        return None;
    };
    if key.ctrl() {
        return (bindings.quit && c == 'c').then_some(DefaultAction::Quit);
    }
    if !key.modifiers.is_empty() && !key.shift() {
        return None;
    }
    match c {
        'q' if bindings.quit => Some(DefaultAction::Quit),
        't' if bindings.cycle_palette => Some(DefaultAction::CyclePalette),
        'a' if bindings.cycle_appearance => Some(DefaultAction::ToggleAppearance),
        _ => None,
    }
}
