#![forbid(unsafe_code)]

//! Built-in views: text, stacks, overlays and structural modifiers.
//!
//! Widgets live outside the engine; these are the pieces they are composed
//! from.

use std::fmt;
use std::rc::Rc;

use weft_core::event::KeyEvent;
use weft_render::OutputBuffer;
use weft_render::ansi::{SGR_BOLD, SGR_DIM, SGR_RESET};
use weft_render::width::truncate_to_width;

use crate::environment::{Environment, EnvironmentKey};
use crate::identity::PathSegment;
use crate::view::{AnyView, Body, FallbackRender, KeyHandler, RenderContext, View};

/// Lines of text, clipped to the available area.
#[derive(Debug, Clone, Default)]
pub struct Text {
    content: String,
    style: Option<String>,
}

impl Text {
    /// Unstyled text. Embedded newlines start new lines.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            style: None,
        }
    }

    /// Prefix every line with an SGR sequence (reset at line end).
    #[must_use]
    pub fn styled(mut self, sgr: impl Into<String>) -> Self {
        self.style = Some(sgr.into());
        self
    }

    /// Bold text.
    #[must_use]
    pub fn bold(self) -> Self {
        self.styled(SGR_BOLD)
    }

    /// Dim text.
    #[must_use]
    pub fn dim(self) -> Self {
        self.styled(SGR_DIM)
    }
}

impl View for Text {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let width = cx.width();
        let lines = OutputBuffer::text(&self.content)
            .clipped_to_height(cx.height())
            .into_lines()
            .into_iter()
            .map(|line| {
                let line = truncate_to_width(&line, width);
                match &self.style {
                    Some(style) => format!("{style}{line}{SGR_RESET}"),
                    None => line,
                }
            });
        Body::Buffer(OutputBuffer::from_lines(lines))
    }
}

/// Renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Empty;

impl View for Empty {
    fn body(&self, _cx: &mut RenderContext<'_>) -> Body {
        Body::empty()
    }
}

/// Children stacked top to bottom.
///
/// Each child gets the full width and whatever height earlier children left.
#[derive(Default)]
pub struct VStack {
    children: Vec<AnyView>,
    spacing: usize,
}

impl VStack {
    /// An empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, view: impl View + 'static) -> Self {
        self.children.push(Box::new(view));
        self
    }

    /// Append an already boxed child.
    #[must_use]
    pub fn boxed(mut self, view: AnyView) -> Self {
        self.children.push(view);
        self
    }

    /// Blank rows between children.
    #[must_use]
    pub fn spacing(mut self, rows: usize) -> Self {
        self.spacing = rows;
        self
    }
}

impl fmt::Debug for VStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VStack")
            .field("children", &self.children.len())
            .field("spacing", &self.spacing)
            .finish()
    }
}

impl View for VStack {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let (width, height) = (cx.width(), cx.height());
        let mut remaining = height;
        let mut parts = Vec::with_capacity(self.children.len());
        for (index, view) in self.children.iter().enumerate() {
            let part = cx.child(index).sized(width, remaining).render(view.as_ref());
            remaining = remaining.saturating_sub(part.height() + self.spacing);
            parts.push(part);
        }
        Body::Buffer(OutputBuffer::vstack_all(&parts, self.spacing).clipped_to_height(height))
    }
}

/// Children placed left to right.
///
/// Each child gets the full height and whatever width earlier children left.
#[derive(Default)]
pub struct HStack {
    children: Vec<AnyView>,
    spacing: usize,
}

impl HStack {
    /// An empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, view: impl View + 'static) -> Self {
        self.children.push(Box::new(view));
        self
    }

    /// Append an already boxed child.
    #[must_use]
    pub fn boxed(mut self, view: AnyView) -> Self {
        self.children.push(view);
        self
    }

    /// Blank columns between children.
    #[must_use]
    pub fn spacing(mut self, columns: usize) -> Self {
        self.spacing = columns;
        self
    }
}

impl fmt::Debug for HStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HStack")
            .field("children", &self.children.len())
            .field("spacing", &self.spacing)
            .finish()
    }
}

impl View for HStack {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let (width, height) = (cx.width(), cx.height());
        let mut remaining = width;
        let mut parts = Vec::with_capacity(self.children.len());
        for (index, view) in self.children.iter().enumerate() {
            let part = cx.child(index).sized(remaining, height).render(view.as_ref());
            remaining = remaining.saturating_sub(part.width() + self.spacing);
            parts.push(part);
        }
        Body::Buffer(OutputBuffer::hstack_all(&parts, self.spacing))
    }
}

/// `top` drawn over `base` at a column/row offset.
pub struct Overlay {
    base: AnyView,
    top: AnyView,
    x: usize,
    y: usize,
}

impl Overlay {
    /// Overlay `top` on `base` at `(x, y)`.
    pub fn new(base: impl View + 'static, top: impl View + 'static, x: usize, y: usize) -> Self {
        Self {
            base: Box::new(base),
            top: Box::new(top),
            x,
            y,
        }
    }
}

impl View for Overlay {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let (width, height) = (cx.width(), cx.height());
        let base = cx.child(0usize).render(self.base.as_ref());
        let top = cx
            .child(1usize)
            .sized(width.saturating_sub(self.x), height.saturating_sub(self.y))
            .render(self.top.as_ref());
        Body::Buffer(base.overlay(&top, self.x, self.y))
    }
}

/// Gives a child an explicit identity, stable across reordering.
pub struct Keyed {
    key: PathSegment,
    view: AnyView,
}

impl Keyed {
    /// Key `view` by `key`.
    pub fn new(key: impl Into<PathSegment>, view: impl View + 'static) -> Self {
        Self {
            key: key.into(),
            view: Box::new(view),
        }
    }
}

impl View for Keyed {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        Body::Buffer(cx.child(self.key.clone()).render(self.view.as_ref()))
    }
}

/// A named focus section. Targets registered below it belong to `id`.
pub struct Section {
    id: Rc<str>,
    view: AnyView,
}

impl Section {
    /// Wrap `view` in section `id`.
    pub fn new(id: &str, view: impl View + 'static) -> Self {
        Self {
            id: Rc::from(id),
            view: Box::new(view),
        }
    }
}

impl View for Section {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let segment = PathSegment::from(self.id.to_string());
        Body::Buffer(
            cx.child(segment)
                .in_section(Rc::clone(&self.id))
                .render(self.view.as_ref()),
        )
    }
}

/// Renders its child into the header region instead of in place.
pub struct Header {
    view: AnyView,
}

impl Header {
    /// Put `view` in the header.
    pub fn new(view: impl View + 'static) -> Self {
        Self {
            view: Box::new(view),
        }
    }
}

impl View for Header {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let buffer = cx.child("header").render(self.view.as_ref());
        cx.set_header(buffer);
        Body::empty()
    }
}

/// Registers a key handler for this frame, then renders its child.
pub struct OnKey {
    handler: KeyHandler,
    view: AnyView,
}

impl OnKey {
    /// Handle keys with `handler` while `view` is in the tree.
    pub fn new(view: impl View + 'static, handler: impl Fn(&KeyEvent) -> bool + 'static) -> Self {
        Self {
            handler: Rc::new(handler),
            view: Box::new(view),
        }
    }
}

impl View for OnKey {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        cx.on_key_shared(Rc::clone(&self.handler));
        Body::Buffer(cx.scoped().render(self.view.as_ref()))
    }
}

/// Reuses last frame's render while `deps` and the area are unchanged.
///
/// The cache is purged when the palette or appearance changes. Only wrap
/// passive sub-trees: a cache hit skips evaluation, so focus targets, key
/// handlers, header and status items inside would not register.
pub struct Memo {
    deps: u64,
    view: AnyView,
}

impl Memo {
    /// Memoize `view` on `deps`.
    pub fn new(deps: u64, view: impl View + 'static) -> Self {
        Self {
            deps,
            view: Box::new(view),
        }
    }
}

impl View for Memo {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let view = self.view.as_ref();
        Body::Buffer(cx.memoized(self.deps, |cx| cx.render(view)))
    }
}

/// Overrides one environment key for its descendants.
pub struct WithEnv {
    apply: Box<dyn Fn(&Environment) -> Environment>,
    view: AnyView,
}

impl WithEnv {
    /// Render `view` with `K` set to `value`.
    pub fn new<K: EnvironmentKey>(value: K::Value, view: impl View + 'static) -> Self {
        Self {
            apply: Box::new(move |env: &Environment| env.with::<K>(value.clone())),
            view: Box::new(view),
        }
    }
}

impl View for WithEnv {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        let env = (self.apply)(cx.env());
        Body::Buffer(cx.scoped().with_env(env).render(self.view.as_ref()))
    }
}

/// Renders collaborator failures below it with a custom fallback.
pub struct Fallback {
    render: FallbackRender,
    view: AnyView,
}

impl Fallback {
    /// Render failures under `view` with `render`.
    pub fn new(
        view: impl View + 'static,
        render: impl Fn(&crate::error::CollaboratorError, usize) -> OutputBuffer + 'static,
    ) -> Self {
        Self {
            render: Rc::new(render),
            view: Box::new(view),
        }
    }
}

impl View for Fallback {
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        Body::Buffer(
            cx.scoped()
                .with_fallback(Rc::clone(&self.render))
                .render(self.view.as_ref()),
        )
    }
}
