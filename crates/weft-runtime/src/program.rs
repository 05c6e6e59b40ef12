#![forbid(unsafe_code)]

//! Application run loop.
//!
//! [`Program`] owns the process-lifetime pieces: the terminal backend, the
//! signal flags, the animation clock and the renderer. Each tick:
//!
//! 1. Shutdown requested → leave the loop.
//! 2. Terminal resized (consumed) → invalidate the diff cache.
//! 3. Rerender requested (consumed) or UI dirty (consumed) → render a frame.
//! 4. Drain at most `max_events_per_tick` pending input events through the
//!    dispatch chain, in arrival order. The rest wait for the next tick.
//! 5. Sleep `frame_interval` (in [`Program::run`]).
//!
//! Teardown restores the terminal and clears focus and view state. It runs
//! whenever [`Program::run`] returns, including on errors.

use std::io;
use std::thread;
use std::time::Duration;

use weft_core::backend::TerminalBackend;
use weft_core::event::{Event, KeyEvent};
use weft_core::signals::SignalFlags;

use crate::config::ProgramConfig;
use crate::dirty::DirtyHandle;
use crate::environment::{AnimationTicksKey, Environment};
use crate::frame::{FrameReport, Renderer, RendererOptions};
use crate::input::{self, DispatchOutcome};
use crate::timers::AnimationClock;
use crate::view::AnyView;

/// The application driven by a [`Program`].
pub trait App {
    /// Build this frame's root view.
    fn view(&mut self) -> AnyView;

    /// Adjust the root environment before each frame.
    fn environment(&self, env: Environment) -> Environment {
        env
    }
}

/// Cloneable handle for requesting renders or shutdown from anywhere,
/// including other threads.
#[derive(Debug, Clone)]
pub struct ProgramHandle {
    flags: SignalFlags,
    dirty: DirtyHandle,
}

impl ProgramHandle {
    /// Render on the next tick.
    pub fn request_render(&self) {
        self.dirty.mark();
    }

    /// Leave the run loop on the next tick.
    pub fn quit(&self) {
        self.flags.request_shutdown();
    }

    /// The dirty flag shared with state handles.
    #[must_use]
    pub fn dirty(&self) -> DirtyHandle {
        self.dirty.clone()
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep going.
    Continue {
        /// A frame was rendered.
        rendered: bool,
        /// Input events drained.
        events: usize,
    },
    /// Shutdown was requested.
    Exit,
}

/// Run loop over an [`App`] and a [`TerminalBackend`].
pub struct Program<A: App, B: TerminalBackend> {
    app: A,
    backend: B,
    config: ProgramConfig,
    renderer: Renderer,
    flags: SignalFlags,
    dirty: DirtyHandle,
    clock: AnimationClock,
    running: bool,
    last_report: Option<FrameReport>,
}

impl<A: App, B: TerminalBackend> std::fmt::Debug for Program<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("config", &self.config)
            .field("renderer", &self.renderer)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl<A: App, B: TerminalBackend> Program<A, B> {
    /// Create a program. Nothing touches the terminal until [`Self::start`]
    /// or [`Self::run`].
    pub fn new(app: A, backend: B, config: ProgramConfig) -> Self {
        let dirty = DirtyHandle::new();
        let renderer = Renderer::new(
            RendererOptions {
                sync_output: config.sync_output,
                header_height_estimate: config.header_height_estimate,
            },
            dirty.clone(),
        );
        Self {
            app,
            backend,
            config,
            renderer,
            flags: SignalFlags::new(),
            dirty,
            clock: AnimationClock::idle(),
            running: false,
            last_report: None,
        }
    }

    /// A handle for requesting renders or shutdown.
    #[must_use]
    pub fn handle(&self) -> ProgramHandle {
        ProgramHandle {
            flags: self.flags.clone(),
            dirty: self.dirty.clone(),
        }
    }

    /// Install signal handlers, run until shutdown, then tear down.
    ///
    /// # Errors
    ///
    /// Returns the first terminal or signal-registration error. Teardown
    /// still runs; its own error is returned only when the loop succeeded.
    pub fn run(&mut self) -> io::Result<()> {
        let registration = self.flags.install(&self.config.signals)?;
        let result = self.start().and_then(|()| self.run_loop());
        let teardown = self.teardown();
        drop(registration);
        result.and(teardown)
    }

    fn run_loop(&mut self) -> io::Result<()> {
        loop {
            match self.tick()? {
                TickOutcome::Exit => return Ok(()),
                TickOutcome::Continue { .. } => thread::sleep(self.config.frame_interval),
            }
        }
    }

    /// Enter terminal modes, start the animation timers and schedule the
    /// first frame.
    ///
    /// # Errors
    ///
    /// Fails when the terminal cannot be set up or a timer thread cannot be
    /// spawned.
    pub fn start(&mut self) -> io::Result<()> {
        self.backend.enter(self.config.session_options())?;
        self.running = true;
        self.clock = AnimationClock::start(&self.config.animation, self.flags.rerender_handle())?;
        self.flags.request_rerender();
        tracing::info!(
            frame_interval_ms = self.config.frame_interval_ms(),
            max_events = self.config.max_events_per_tick,
            "program started"
        );
        Ok(())
    }

    /// One iteration of the loop, without the sleep.
    ///
    /// # Errors
    ///
    /// Propagates backend failures from rendering or reading input.
    pub fn tick(&mut self) -> io::Result<TickOutcome> {
        let _span = tracing::trace_span!("weft.tick").entered();
        if self.flags.shutdown_requested() {
            tracing::debug!("shutdown requested");
            return Ok(TickOutcome::Exit);
        }
        if self.flags.take_resized() {
            tracing::debug!("terminal resized");
            self.renderer.invalidate();
        }
        let rerender = self.flags.take_rerender();
        let dirty = self.dirty.take();
        let rendered = rerender || dirty;
        if rendered {
            self.render()?;
        }
        let events = self.drain_input()?;
        Ok(TickOutcome::Continue { rendered, events })
    }

    /// Render one frame now.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub fn render(&mut self) -> io::Result<&FrameReport> {
        let root = self.app.view();
        let mut env = Environment::new();
        env.set::<AnimationTicksKey>(self.clock.ticks());
        let env = self.app.environment(env);
        let report = self
            .renderer
            .render_frame(root.as_ref(), &env, &mut self.backend)?;
        Ok(&*self.last_report.insert(report))
    }

    fn drain_input(&mut self) -> io::Result<usize> {
        let mut drained = 0;
        while drained < self.config.max_events_per_tick {
            if !self.backend.poll_event(Duration::ZERO)? {
                break;
            }
            drained += 1;
            if let Some(event) = self.backend.read_event()? {
                self.handle_event(event);
            }
        }
        Ok(drained)
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                input::dispatch_key(
                    self.renderer.services_mut(),
                    &self.flags,
                    self.config.bindings,
                    &key,
                );
            }
            Event::Resize { width, height } => {
                tracing::debug!(width, height, "resize event");
                self.flags.notify_resized();
            }
            Event::Paste(text) => self.paste(&text),
            Event::Focus(_) => self.flags.request_rerender(),
        }
    }

    /// Feed pasted text to a focused text input as character keys.
    fn paste(&mut self, text: &str) {
        let Some(target) = self
            .renderer
            .services()
            .focus()
            .focused_target()
            .filter(|target| target.is_text_input())
        else {
            tracing::debug!(len = text.len(), "paste ignored without a text input");
            return;
        };
        for c in text.chars().filter(|c| !c.is_control()) {
            target.handle_key(&KeyEvent::char(c));
        }
        self.dirty.mark();
    }

    /// Dispatch one key immediately, as if read from the terminal.
    pub fn send_key(&mut self, key: KeyEvent) -> DispatchOutcome {
        input::dispatch_key(
            self.renderer.services_mut(),
            &self.flags,
            self.config.bindings,
            &key,
        )
    }

    /// Stop timers, clear focus and view state, restore the terminal.
    ///
    /// # Errors
    ///
    /// Propagates the backend's restore error.
    pub fn teardown(&mut self) -> io::Result<()> {
        self.clock.stop();
        self.renderer.reset();
        if !self.running {
            return Ok(());
        }
        self.running = false;
        tracing::info!(frames = self.renderer.frame_count(), "program stopped");
        self.backend.leave()
    }

    /// The backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The application.
    #[must_use]
    pub fn app(&self) -> &A {
        &self.app
    }

    /// The application, mutably.
    pub fn app_mut(&mut self) -> &mut A {
        &mut self.app
    }

    /// The renderer.
    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Report of the last rendered frame.
    #[must_use]
    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    /// Signal flags.
    #[must_use]
    pub fn flags(&self) -> &SignalFlags {
        &self.flags
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    /// Whether [`Self::start`] ran and teardown has not.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::Text;
    use weft_core::backend::HeadlessBackend;
    use weft_core::event::KeyCode;
    use weft_core::signals::SignalMapping;
    use weft_render::Region;

    struct Hello;

    impl App for Hello {
        fn view(&mut self) -> AnyView {
            Box::new(Text::new("hello"))
        }
    }

    fn program() -> Program<Hello, HeadlessBackend> {
        let config = ProgramConfig::default().with_signals(SignalMapping::none());
        Program::new(Hello, HeadlessBackend::new(20, 4), config)
    }

    #[test]
    fn start_renders_first_tick_then_idles() {
        let mut program = program();
        program.start().unwrap();
        assert!(program.backend().is_entered());

        let first = program.tick().unwrap();
        assert_eq!(first, TickOutcome::Continue { rendered: true, events: 0 });
        let second = program.tick().unwrap();
        assert!(matches!(second, TickOutcome::Continue { .. }));
        assert_eq!(program.backend().write_count(), 1);
    }

    #[test]
    fn quit_key_exits_on_next_tick() {
        let mut program = program();
        program.start().unwrap();
        program.backend_mut().push_event(Event::Key(KeyEvent::char('q')));
        assert!(matches!(program.tick().unwrap(), TickOutcome::Continue { events: 1, .. }));
        assert_eq!(program.tick().unwrap(), TickOutcome::Exit);

        program.teardown().unwrap();
        assert!(!program.backend().is_entered());
        assert!(!program.is_running());
    }

    #[test]
    fn resize_event_rewrites_everything() {
        let mut program = program();
        program.start().unwrap();
        program.tick().unwrap();

        program.backend_mut().set_size(20, 6);
        program.backend_mut().push_event(Event::Resize { width: 20, height: 6 });
        program.tick().unwrap();
        program.tick().unwrap();

        let report = program.last_report().unwrap();
        assert!(report.cleared);
        assert_eq!(report.writes(Region::Content), 6);
    }

    #[test]
    fn handle_quits_from_elsewhere() {
        let mut program = program();
        program.start().unwrap();
        let handle = program.handle();
        std::thread::spawn(move || handle.quit()).join().unwrap();
        assert_eq!(program.tick().unwrap(), TickOutcome::Exit);
    }

    #[test]
    fn unrouted_keys_do_not_render() {
        let mut program = program();
        program.start().unwrap();
        program.tick().unwrap();
        program.tick().unwrap();
        let writes = program.backend().write_count();
        program.send_key(KeyEvent::new(KeyCode::F(5)));
        program.tick().unwrap();
        assert_eq!(program.backend().write_count(), writes);
    }

    #[test]
    fn run_exits_and_restores_terminal() {
        let mut program = program();
        program.backend_mut().push_event(Event::Key(KeyEvent::char('q')));
        program.run().unwrap();
        assert!(!program.backend().is_entered());
        assert!(program.backend().write_count() >= 1);
    }
}
