#![forbid(unsafe_code)]

//! View dispatch.
//!
//! A [`View`] describes part of the UI. Every frame the tree is evaluated
//! from the root: a view's [`View::body`] either renders directly
//! ([`Body::Buffer`]), expands into another view ([`Body::View`]) that is
//! evaluated in turn, or reports a collaborator failure ([`Body::Failed`])
//! that is replaced by a fallback render.
//!
//! # Bounds
//!
//! Expansion must terminate. A chain of more than [`MAX_BODY_EXPANSIONS`]
//! bodies, or nested [`RenderContext::render`] calls deeper than
//! [`MAX_VIEW_DEPTH`], is reported as [`ViewError::DepthExceeded`] and
//! renders as an empty buffer. Neither aborts the frame.
//!
//! # Contexts
//!
//! A [`RenderContext`] carries the constraints of one call site: width,
//! height, environment snapshot and identity path. Containers derive child
//! contexts with [`RenderContext::child`] instead of mutating their own.

use std::fmt;
use std::rc::Rc;

use weft_core::event::KeyEvent;
use weft_render::OutputBuffer;
use weft_render::ansi::{SGR_DIM, SGR_RESET};
use weft_render::width::truncate_to_width;

use crate::dirty::DirtyHandle;
use crate::environment::{Environment, EnvironmentKey};
use crate::error::{CollaboratorError, ViewError};
use crate::focus::{FocusRequests, FocusTarget};
use crate::identity::{IdentityPath, PathSegment};
use crate::services::FrameServices;
use crate::state::State;
use crate::status::StatusItem;

/// Longest chain of body expansions for a single view.
pub const MAX_BODY_EXPANSIONS: usize = 64;

/// Deepest nesting of render calls.
pub const MAX_VIEW_DEPTH: usize = 256;

/// Section used by targets registered outside any [`crate::primitives::Section`].
pub const DEFAULT_SECTION: &str = "main";

/// A node of the UI tree.
pub trait View {
    /// Render directly or expand into a sub-tree.
    fn body(&self, cx: &mut RenderContext<'_>) -> Body;

    /// Name used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Owned, type-erased view.
pub type AnyView = Box<dyn View>;

/// Renders a substitute for a failed sub-tree, given the failure and the
/// available width.
pub type FallbackRender = Rc<dyn Fn(&CollaboratorError, usize) -> OutputBuffer>;

/// Ad hoc key handler registered during a frame.
pub type KeyHandler = Rc<dyn Fn(&KeyEvent) -> bool>;

/// Result of evaluating a view's body.
pub enum Body {
    /// Rendered output.
    Buffer(OutputBuffer),
    /// A further decomposition, evaluated in the same context.
    View(AnyView),
    /// An external collaborator failed; a fallback is rendered instead.
    Failed(CollaboratorError),
}

impl Body {
    /// Expand into `view`.
    pub fn view(view: impl View + 'static) -> Self {
        Self::View(Box::new(view))
    }

    /// An empty render.
    #[must_use]
    pub fn empty() -> Self {
        Self::Buffer(OutputBuffer::empty())
    }
}

impl From<OutputBuffer> for Body {
    fn from(buffer: OutputBuffer) -> Self {
        Self::Buffer(buffer)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(buffer) => f.debug_tuple("Buffer").field(buffer).finish(),
            Self::View(view) => f.debug_tuple("View").field(&view.type_name()).finish(),
            Self::Failed(error) => f.debug_tuple("Failed").field(error).finish(),
        }
    }
}

/// A view built from a closure.
pub struct ViewFn<F> {
    f: F,
}

/// Wrap a closure as a view.
pub fn view_fn<F>(f: F) -> ViewFn<F>
where
    F: Fn(&mut RenderContext<'_>) -> Body,
{
    ViewFn { f }
}

impl<F> View for ViewFn<F>
where
    F: Fn(&mut RenderContext<'_>) -> Body,
{
    fn body(&self, cx: &mut RenderContext<'_>) -> Body {
        (self.f)(cx)
    }
}

/// Constraints and services for one call site.
pub struct RenderContext<'a> {
    width: usize,
    height: usize,
    env: Environment,
    path: IdentityPath,
    depth: usize,
    section: Option<Rc<str>>,
    fallback: Option<FallbackRender>,
    services: &'a mut FrameServices,
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("path", &self.path)
            .field("depth", &self.depth)
            .field("section", &self.section)
            .finish()
    }
}

impl<'a> RenderContext<'a> {
    /// Root context for a pass.
    pub fn new(
        services: &'a mut FrameServices,
        width: usize,
        height: usize,
        env: Environment,
    ) -> Self {
        Self {
            width,
            height,
            env,
            path: IdentityPath::root(),
            depth: 0,
            section: None,
            fallback: None,
            services,
        }
    }

    /// Available columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Available rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Environment snapshot for this call site.
    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Read one environment key.
    #[must_use]
    pub fn get<K: EnvironmentKey>(&self) -> K::Value {
        self.env.get::<K>()
    }

    /// Identity path of this call site.
    #[must_use]
    pub fn path(&self) -> &IdentityPath {
        &self.path
    }

    /// Current render nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Focus section targets registered here land in.
    #[must_use]
    pub fn section(&self) -> &str {
        self.section.as_deref().unwrap_or(DEFAULT_SECTION)
    }

    /// A context with the same constraints and path.
    pub fn scoped(&mut self) -> RenderContext<'_> {
        RenderContext {
            width: self.width,
            height: self.height,
            env: self.env.clone(),
            path: self.path.clone(),
            depth: self.depth,
            section: self.section.clone(),
            fallback: self.fallback.clone(),
            services: &mut *self.services,
        }
    }

    /// A context for a child at `segment`.
    pub fn child(&mut self, segment: impl Into<PathSegment>) -> RenderContext<'_> {
        let mut child = self.scoped();
        child.path = child.path.child(segment);
        child
    }

    /// Narrow the available area.
    #[must_use]
    pub fn sized(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Replace the environment snapshot.
    #[must_use]
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Register focus targets into `section` from here down.
    #[must_use]
    pub fn in_section(mut self, section: Rc<str>) -> Self {
        self.section = Some(section);
        self
    }

    /// Render failures from here down with `fallback`.
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackRender) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Evaluate `view` to an output buffer.
    pub fn render(&mut self, view: &dyn View) -> OutputBuffer {
        if self.depth >= MAX_VIEW_DEPTH {
            return self.exceeded(view.type_name(), MAX_VIEW_DEPTH);
        }
        self.depth += 1;
        let buffer = self.expand(view);
        self.depth -= 1;
        buffer
    }

    fn expand(&mut self, view: &dyn View) -> OutputBuffer {
        let mut expanded: Option<AnyView> = None;
        for _ in 0..=MAX_BODY_EXPANSIONS {
            let current: &dyn View = match &expanded {
                Some(next) => next.as_ref(),
                None => view,
            };
            match current.body(self) {
                Body::Buffer(buffer) => return buffer,
                Body::Failed(error) => return self.substitute(error),
                Body::View(next) => expanded = Some(next),
            }
        }
        let name = expanded
            .as_ref()
            .map_or_else(|| view.type_name(), |next| next.type_name());
        self.exceeded(name, MAX_BODY_EXPANSIONS)
    }

    fn exceeded(&mut self, view: &'static str, limit: usize) -> OutputBuffer {
        tracing::error!(view, path = %self.path, limit, "view expansion bound exceeded");
        self.services.errors.push(ViewError::DepthExceeded {
            view,
            path: self.path.to_string(),
            limit,
        });
        OutputBuffer::empty()
    }

    fn substitute(&mut self, error: CollaboratorError) -> OutputBuffer {
        tracing::warn!(path = %self.path, %error, "rendering fallback");
        let buffer = match &self.fallback {
            Some(fallback) => fallback(&error, self.width),
            None => {
                let line = format!("{SGR_DIM}[unavailable: {error}]{SGR_RESET}");
                OutputBuffer::text(&truncate_to_width(&line, self.width))
            }
        };
        self.services.errors.push(ViewError::Collaborator {
            path: self.path.to_string(),
            error,
        });
        buffer
    }

    /// Register a focus target in this context's section.
    pub fn register_focus(&mut self, target: Rc<dyn FocusTarget>) {
        let section = self.section.as_deref().unwrap_or(DEFAULT_SECTION);
        self.services.focus.register(section, target);
    }

    /// Whether `id` currently owns focus.
    #[must_use]
    pub fn is_focused(&self, id: &str) -> bool {
        self.services.focus.is_focused(id)
    }

    /// Handle for moving focus from key handlers and focus targets.
    #[must_use]
    pub fn focus_requests(&self) -> FocusRequests {
        self.services.focus.requests()
    }

    /// Add a key handler for this frame (consulted newest first).
    pub fn on_key(&mut self, handler: impl Fn(&KeyEvent) -> bool + 'static) {
        self.services.key_handlers.push(Rc::new(handler));
    }

    /// Register an already shared key handler.
    pub fn on_key_shared(&mut self, handler: KeyHandler) {
        self.services.key_handlers.push(handler);
    }

    /// Set the header region's content for this frame. The last call wins.
    pub fn set_header(&mut self, header: OutputBuffer) {
        self.services.header = Some(header);
    }

    /// Append a status line item.
    pub fn status_item(&mut self, item: StatusItem) {
        self.services.status.push(item);
    }

    /// State of type `T` owned by this call site's path.
    pub fn state<T: 'static>(&mut self, init: impl FnOnce() -> T) -> State<T> {
        self.services.state.state(&self.path, init)
    }

    /// Run `callback` once after a frame in which this path is not rendered.
    pub fn on_disappear(&mut self, callback: impl FnOnce() + 'static) {
        self.services.state.on_disappear(&self.path, callback);
    }

    /// Handle for requesting another frame.
    #[must_use]
    pub fn dirty(&self) -> DirtyHandle {
        self.services.dirty()
    }

    /// Reuse the buffer rendered here last time if `deps` and the size are
    /// unchanged; otherwise render with `f` and remember the result.
    ///
    /// A hit skips evaluation entirely, so the sub-tree must be passive: no
    /// focus targets, key handlers, header or status items.
    pub fn memoized(
        &mut self,
        deps: u64,
        f: impl FnOnce(&mut RenderContext<'_>) -> OutputBuffer,
    ) -> OutputBuffer {
        if let Some(buffer) = self
            .services
            .memo_lookup(&self.path, deps, self.width, self.height)
        {
            self.services.state.retain(&self.path);
            return buffer;
        }
        let buffer = f(self);
        self.services
            .memo_store(&self.path, deps, self.width, self.height, buffer.clone());
        buffer
    }
}
