#![forbid(unsafe_code)]

//! Canonical input event types.
//!
//! Key events are immutable values: a logical key identity plus modifier
//! flags. The terminal reader produces them, the input dispatch chain
//! consumes them. Crossterm events are mapped at the backend boundary so the
//! rest of the engine never sees crossterm types.

use bitflags::bitflags;
use crossterm::event as cte;

/// Input event delivered by a terminal backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// Terminal was resized.
    Resize {
        /// New terminal width in columns.
        width: u16,
        /// New terminal height in rows.
        height: u16,
    },

    /// Bracketed paste payload.
    Paste(String),

    /// Terminal focus gained (`true`) or lost (`false`).
    Focus(bool),
}

impl Event {
    /// Convert a crossterm event into a weft [`Event`].
    ///
    /// Returns `None` for events the engine does not route (mouse input,
    /// unsupported key codes).
    #[must_use]
    pub fn from_crossterm(event: cte::Event) -> Option<Self> {
        match event {
            cte::Event::Key(key) => map_key_event(key).map(Event::Key),
            cte::Event::Resize(width, height) => Some(Event::Resize { width, height }),
            cte::Event::Paste(text) => Some(Event::Paste(text)),
            cte::Event::FocusGained => Some(Event::Focus(true)),
            cte::Event::FocusLost => Some(Event::Focus(false)),
            cte::Event::Mouse(_) => None,
        }
    }

    /// The key event, if this is one.
    #[must_use]
    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            Event::Key(key) => Some(key),
            _ => None,
        }
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// Press, repeat or release.
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a key press with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Shorthand for a plain character press.
    #[must_use]
    pub const fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c))
    }

    /// Return a copy with the given modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Return a copy with the given kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Check if Ctrl is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Shift is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Tab or Shift+Tab, normalized: `Some(true)` forward, `Some(false)` backward.
    ///
    /// Terminals report Shift+Tab either as `BackTab` or as `Tab` with the
    /// shift modifier; both map to backward.
    #[must_use]
    pub fn tab_direction(&self) -> Option<bool> {
        match self.code {
            KeyCode::Tab if self.shift() => Some(false),
            KeyCode::Tab => Some(true),
            KeyCode::BackTab => Some(false),
            _ => None,
        }
    }

    /// Whether this is a printable character without Ctrl.
    #[must_use]
    pub fn is_printable(&self) -> bool {
        matches!(self.code, KeyCode::Char(c) if !c.is_control()) && !self.ctrl()
    }
}

/// Logical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character or symbol key.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    /// Shift+Tab as reported by terminals that distinguish it.
    BackTab,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    /// Function key (F1-F24).
    F(u8),
    /// Ctrl+Space / Ctrl+@.
    Null,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,
    /// Key is being held.
    Repeat,
    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

fn map_key_event(event: cte::KeyEvent) -> Option<KeyEvent> {
    let code = map_key_code(event.code)?;
    let kind = match event.kind {
        cte::KeyEventKind::Press => KeyEventKind::Press,
        cte::KeyEventKind::Repeat => KeyEventKind::Repeat,
        cte::KeyEventKind::Release => KeyEventKind::Release,
    };
    Some(KeyEvent {
        code,
        modifiers: map_modifiers(event.modifiers),
        kind,
    })
}

fn map_key_code(code: cte::KeyCode) -> Option<KeyCode> {
    Some(match code {
        cte::KeyCode::Backspace => KeyCode::Backspace,
        cte::KeyCode::Enter => KeyCode::Enter,
        cte::KeyCode::Left => KeyCode::Left,
        cte::KeyCode::Right => KeyCode::Right,
        cte::KeyCode::Up => KeyCode::Up,
        cte::KeyCode::Down => KeyCode::Down,
        cte::KeyCode::Home => KeyCode::Home,
        cte::KeyCode::End => KeyCode::End,
        cte::KeyCode::PageUp => KeyCode::PageUp,
        cte::KeyCode::PageDown => KeyCode::PageDown,
        cte::KeyCode::Tab => KeyCode::Tab,
        cte::KeyCode::BackTab => KeyCode::BackTab,
        cte::KeyCode::Delete => KeyCode::Delete,
        cte::KeyCode::Insert => KeyCode::Insert,
        cte::KeyCode::F(n) => KeyCode::F(n),
        cte::KeyCode::Char(c) => KeyCode::Char(c),
        cte::KeyCode::Null => KeyCode::Null,
        cte::KeyCode::Esc => KeyCode::Escape,
        _ => return None,
    })
}

fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.intersects(
        cte::KeyModifiers::SUPER | cte::KeyModifiers::HYPER | cte::KeyModifiers::META,
    ) {
        mapped |= Modifiers::SUPER;
    }
    mapped
}
