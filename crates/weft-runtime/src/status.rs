#![forbid(unsafe_code)]

//! Status line items.
//!
//! Views contribute items while they render; the frame renderer lays them
//! out on the bottom row and the input chain offers keys to the ones that
//! carry a binding and an action (layer 1).

use std::fmt;
use std::rc::Rc;

use weft_core::event::{KeyCode, KeyEvent, Modifiers};

/// A key plus the exact modifiers it must be pressed with.
///
/// Shift is ignored for character keys: terminals report `?` or `A` with
/// Shift held, and the character already says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    /// Key identity.
    pub code: KeyCode,
    /// Required modifiers.
    pub modifiers: Modifiers,
}

impl KeyBinding {
    /// Binding with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    /// Plain character binding.
    #[must_use]
    pub const fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c))
    }

    /// Ctrl + character.
    #[must_use]
    pub const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: Modifiers::CTRL,
        }
    }

    /// Whether `key` triggers this binding.
    #[must_use]
    pub fn matches(&self, key: &KeyEvent) -> bool {
        if key.code != self.code {
            return false;
        }
        match self.code {
            KeyCode::Char(_) => {
                key.modifiers.difference(Modifiers::SHIFT)
                    == self.modifiers.difference(Modifiers::SHIFT)
            }
            _ => key.modifiers == self.modifiers,
        }
    }

    /// Short label such as `q`, `^s` or `Enter`.
    #[must_use]
    pub fn label(&self) -> String {
        let key = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Escape => "Esc".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        };
        if self.modifiers.contains(Modifiers::CTRL) {
            format!("^{key}")
        } else {
            key
        }
    }
}

/// One entry on the status line.
#[derive(Clone)]
pub struct StatusItem {
    label: String,
    key: Option<KeyBinding>,
    action: Option<Rc<dyn Fn()>>,
}

impl fmt::Debug for StatusItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusItem")
            .field("label", &self.label)
            .field("key", &self.key)
            .field("action", &self.action.is_some())
            .finish()
    }
}

impl StatusItem {
    /// A plain label.
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: None,
            action: None,
        }
    }

    /// A key hint that runs `action` when the key is pressed.
    pub fn action(label: impl Into<String>, key: KeyBinding, action: impl Fn() + 'static) -> Self {
        Self {
            label: label.into(),
            key: Some(key),
            action: Some(Rc::new(action)),
        }
    }

    /// A key hint with no action (handled elsewhere).
    pub fn hint(label: impl Into<String>, key: KeyBinding) -> Self {
        Self {
            label: label.into(),
            key: Some(key),
            action: None,
        }
    }

    /// Displayed text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.label
    }

    /// Bound key.
    #[must_use]
    pub fn key(&self) -> Option<KeyBinding> {
        self.key
    }

    /// Run the action if `key` matches. Returns `true` when consumed.
    pub fn trigger(&self, key: &KeyEvent) -> bool {
        match (&self.key, &self.action) {
            (Some(binding), Some(action)) if binding.matches(key) => {
                action();
                true
            }
            _ => false,
        }
    }
}

/// Render items as one unstyled line, e.g. ` [q] Quit  [t] Theme`.
#[must_use]
pub fn render_line(items: &[StatusItem]) -> String {
    let mut line = String::new();
    for item in items {
        line.push(' ');
        if let Some(key) = item.key {
            line.push('[');
            line.push_str(&key.label());
            line.push_str("] ");
        }
        line.push_str(&item.label);
        line.push(' ');
    }
    line
}
