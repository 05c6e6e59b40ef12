#![forbid(unsafe_code)]

//! Runtime: view evaluation, focus, input dispatch, and the frame and run
//! loops.
//!
//! # Role in weft
//! `weft-runtime` turns a tree of [`View`]s into terminal output frame after
//! frame. It owns the [`Program`] loop (signals, pacing, input draining), the
//! [`Renderer`] (environment assembly, geometry correction, diffing, single
//! write), the [`FocusManager`] and the input dispatch chain.
//!
//! # How it fits in the system
//! Terminal access and key events come from `weft-core`; line buffers, width
//! measurement, diffing and frame emission come from `weft-render`. The
//! `weft` facade re-exports the pieces applications use.

pub mod config;
pub mod dirty;
pub mod environment;
pub mod error;
pub mod focus;
pub mod frame;
pub mod identity;
pub mod input;
pub mod primitives;
pub mod program;
pub mod services;
pub mod state;
pub mod status;
pub mod theme;
pub mod timers;
pub mod view;

pub use config::{AnimationConfig, DefaultBindings, ProgramConfig};
pub use dirty::DirtyHandle;
pub use environment::{Environment, EnvironmentKey};
pub use error::{CollaboratorError, FailureKind, ViewError};
pub use focus::{FocusManager, FocusRequests, FocusTarget};
pub use frame::{FrameReport, Geometry, Renderer, RendererOptions};
pub use identity::{IdentityPath, PathSegment};
pub use input::{DefaultAction, DispatchOutcome, Layer};
pub use primitives::{
    Empty, Fallback, HStack, Header, Keyed, Memo, OnKey, Overlay, Section, Text, VStack, WithEnv,
};
pub use program::{App, Program, ProgramHandle, TickOutcome};
pub use services::FrameServices;
pub use state::{State, StateStore};
pub use status::{KeyBinding, StatusItem};
pub use theme::{Appearance, Palette, Theme};
pub use timers::AnimationClock;
pub use view::{AnyView, Body, RenderContext, View, view_fn};
