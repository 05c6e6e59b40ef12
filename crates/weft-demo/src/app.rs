#![forbid(unsafe_code)]

//! The demo application: a name field, two buttons and a checklist in three
//! focus sections, a live header and a status line.
//!
//! Tab cycles the sections. Inside a section the arrow keys move between
//! targets. The name field keeps every key; it moves focus on Tab itself.

use std::rc::Rc;

use weft::runtime::environment::{AnimationTicksKey, AppearanceKey, PaletteKey};
use weft::{
    AnyView, App, Body, Environment, EnvironmentKey, FocusRequests, FocusTarget, Header,
    KeyBinding, KeyCode, KeyEvent, OutputBuffer, RenderContext, Section, State, StatusItem, Text,
    VStack, View,
};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Checklist entries.
pub const ITEMS: [&str; 4] = ["Buffers", "Diffing", "Focus", "Signals"];

/// Root of the demo.
#[derive(Debug)]
pub struct DemoApp {
    title: String,
}

impl Default for DemoApp {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoApp {
    /// A demo with the default title.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: "weft demo".to_string(),
        }
    }

    /// Replace the header title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl App for DemoApp {
    fn view(&mut self) -> AnyView {
        Box::new(Workspace {
            title: self.title.clone(),
        })
    }

    fn environment(&self, env: Environment) -> Environment {
        env.with::<GreetingPrefixKey>("Hello".to_string())
    }
}

/// Word the greet action starts with. Default: "Hi".
#[derive(Debug)]
pub struct GreetingPrefixKey;

impl EnvironmentKey for GreetingPrefixKey {
    type Value = String;
    fn default_value() -> String {
        "Hi".to_string()
    }
}

/// Owns the form state shared by the entry and actions sections.
struct Workspace {
    title: String,
}

impl View for Workspace {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let form = cx.state(FormState::default);
        let prefix = cx.get::<GreetingPrefixKey>();
        Body::view(
            VStack::new()
                .child(Header::new(TitleBar {
                    title: self.title.clone(),
                }))
                .child(Section::new(
                    "entry",
                    EntryView {
                        form: form.clone(),
                        prefix: prefix.clone(),
                    },
                ))
                .child(Text::new(""))
                .child(Section::new("actions", ActionsView { form, prefix }))
                .child(Text::new(""))
                .child(Section::new("checklist", ChecklistView))
                .child(StatusLine),
        )
    }
}

struct TitleBar {
    title: String,
}

impl View for TitleBar {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let palette = cx.get::<PaletteKey>();
        let appearance = cx.get::<AppearanceKey>();
        let ticks = cx.get::<AnimationTicksKey>();
        let spinner = SPINNER[(ticks.fast % SPINNER.len() as u64) as usize];
        Body::Buffer(OutputBuffer::from_lines([
            format!("{spinner} {}", self.title),
            format!("  palette: {} ({appearance})", palette.name),
        ]))
    }
}

/// Persistent form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    /// Text typed into the name field.
    pub name: String,
    /// Last greeting produced by the button.
    pub greeting: Option<String>,
}

/// A single-line text input bound to [`FormState::name`]. Enter submits,
/// Tab and Shift+Tab leave.
struct NameField {
    form: State<FormState>,
    prefix: String,
    focus: FocusRequests,
}

impl FocusTarget for NameField {
    fn focus_id(&self) -> &str {
        "name"
    }

    fn is_text_input(&self) -> bool {
        true
    }

    fn handle_key(&self, key: &KeyEvent) -> bool {
        if let Some(forward) = key.tab_direction() {
            self.focus.tab(forward);
            return true;
        }
        match key.code {
            KeyCode::Char(c) if key.is_printable() => {
                self.form.update(|form| form.name.push(c));
                true
            }
            KeyCode::Backspace => {
                self.form.update(|form| form.name.pop());
                true
            }
            KeyCode::Enter => {
                greet(&self.form, &self.prefix);
                true
            }
            _ => false,
        }
    }
}

/// A button that runs its action on Enter or Space.
struct Button {
    id: &'static str,
    enabled: bool,
    action: Rc<dyn Fn()>,
}

impl FocusTarget for Button {
    fn focus_id(&self) -> &str {
        self.id
    }

    fn can_focus(&self) -> bool {
        self.enabled
    }

    fn handle_key(&self, key: &KeyEvent) -> bool {
        if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
            (self.action)();
            return true;
        }
        false
    }
}

fn greet(form: &State<FormState>, prefix: &str) {
    form.update(|form| {
        let name = form.name.trim();
        let name = if name.is_empty() { "stranger" } else { name };
        form.greeting = Some(format!("{prefix}, {name}!"));
    });
}

fn marker(cx: &RenderContext<'_>, id: &str) -> char {
    if cx.is_focused(id) { '>' } else { ' ' }
}

struct EntryView {
    form: State<FormState>,
    prefix: String,
}

impl View for EntryView {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let snapshot = self.form.get();
        let focus = cx.focus_requests();
        cx.register_focus(Rc::new(NameField {
            form: self.form.clone(),
            prefix: self.prefix.clone(),
            focus,
        }));

        let cursor = if cx.is_focused("name") { "_" } else { "" };
        let mut lines = vec![format!("{} Name: [{}{cursor}]", marker(cx, "name"), snapshot.name)];
        if let Some(greeting) = &snapshot.greeting {
            lines.push(format!("  {greeting}"));
        }
        Body::Buffer(OutputBuffer::from_lines(lines))
    }
}

/// Greet and Clear.
struct ActionsView {
    form: State<FormState>,
    prefix: String,
}

impl View for ActionsView {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let form = self.form.clone();
        let snapshot = form.get();

        let greet_form = form.clone();
        let prefix = self.prefix.clone();
        cx.register_focus(Rc::new(Button {
            id: "greet",
            enabled: true,
            action: Rc::new(move || greet(&greet_form, &prefix)),
        }));
        let clear_form = form.clone();
        cx.register_focus(Rc::new(Button {
            id: "clear",
            enabled: snapshot != FormState::default(),
            action: Rc::new(move || clear_form.set(FormState::default())),
        }));
        cx.status_item(StatusItem::action("Reset", KeyBinding::ctrl('r'), move || {
            form.set(FormState::default());
        }));

        Body::Buffer(OutputBuffer::text(&format!(
            "{} [ Greet ]   {} [ Clear ]",
            marker(cx, "greet"),
            marker(cx, "clear")
        )))
    }
}

struct ChecklistView;

impl View for ChecklistView {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let checked = cx.state(|| [false; ITEMS.len()]);
        let mut lines = Vec::with_capacity(ITEMS.len());
        for (index, item) in ITEMS.iter().enumerate() {
            let toggled = checked.clone();
            cx.register_focus(Rc::new(Button {
                id: *item,
                enabled: true,
                action: Rc::new(move || toggled.update(|checked| checked[index] = !checked[index])),
            }));
            let mark = if checked.with(|checked| checked[index]) { 'x' } else { ' ' };
            lines.push(format!("{} [{mark}] {item}", marker(cx, item)));
        }
        let done = checked.with(|checked| checked.iter().filter(|c| **c).count());
        lines.push(format!("  {done}/{} done", ITEMS.len()));
        Body::Buffer(OutputBuffer::from_lines(lines))
    }
}

struct StatusLine;

impl View for StatusLine {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        cx.status_item(StatusItem::hint("Quit", KeyBinding::char('q')));
        cx.status_item(StatusItem::hint("Section", KeyBinding::new(KeyCode::Tab)));
        cx.status_item(StatusItem::hint("Palette", KeyBinding::char('t')));
        cx.status_item(StatusItem::hint("Light/Dark", KeyBinding::char('a')));
        Body::empty()
    }
}
