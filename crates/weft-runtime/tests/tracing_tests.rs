#![forbid(unsafe_code)]

//! Tracing integration tests.
//!
//! These tests verify that the run loop, the frame pipeline and the input
//! chain emit the spans and events operators rely on when a frame goes
//! wrong.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt;
use weft_core::backend::HeadlessBackend;
use weft_core::event::{Event, KeyEvent};
use weft_core::signals::SignalMapping;
use weft_render::OutputBuffer;
use weft_runtime::{
    AnyView, App, Body, DirtyHandle, Environment, Program, ProgramConfig, Renderer,
    RendererOptions, Text, view_fn,
};

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
}

/// A layer that records span names and event messages.
#[derive(Default, Clone)]
struct Capture {
    spans: Arc<Mutex<Vec<String>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl Capture {
    fn spans(&self) -> Vec<String> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn has_event(&self, level: tracing::Level, message: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.level == level && e.message == message)
    }
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Capture {
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        self.spans
            .lock()
            .unwrap()
            .push(attrs.metadata().name().to_string());
    }

    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.0,
        });
    }
}

fn captured<F: FnOnce()>(f: F) -> Capture {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

struct Hello;

impl App for Hello {
    fn view(&mut self) -> AnyView {
        Box::new(Text::new("hello"))
    }
}

#[test]
fn run_loop_emits_tick_frame_and_dispatch_spans() {
    let capture = captured(|| {
        let config = ProgramConfig::default().with_signals(SignalMapping::none());
        let mut program = Program::new(Hello, HeadlessBackend::new(20, 3), config);
        program.backend_mut().push_event(Event::Key(KeyEvent::char('q')));
        program.run().unwrap();
    });

    let spans = capture.spans();
    for name in ["weft.tick", "weft.frame", "weft.dispatch"] {
        assert!(spans.iter().any(|s| s == name), "missing span {name}: {spans:?}");
    }
    assert!(capture.has_event(tracing::Level::INFO, "program started"));
    assert!(capture.has_event(tracing::Level::INFO, "program stopped"));
}

#[test]
fn unstable_header_logs_a_warning() {
    let capture = captured(|| {
        let mut renderer = Renderer::new(RendererOptions::default(), DirtyHandle::new());
        let mut backend = HeadlessBackend::new(20, 10);
        let passes = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&passes);
        let root = view_fn(move |cx| {
            counter.set(counter.get() + 1);
            let rows = counter.get() % 3 + 1;
            cx.set_header(OutputBuffer::text(&vec!["h"; rows].join("\n")));
            Body::empty()
        });
        for _ in 0..3 {
            renderer
                .render_frame(&root, &Environment::new(), &mut backend)
                .unwrap();
        }
    });
    assert!(capture.has_event(tracing::Level::WARN, "geometry unstable after correction"));
}

#[test]
fn quiet_frames_emit_no_warnings() {
    let capture = captured(|| {
        let mut renderer = Renderer::new(RendererOptions::default(), DirtyHandle::new());
        let mut backend = HeadlessBackend::new(20, 4);
        let root = Text::new("steady");
        for _ in 0..3 {
            renderer
                .render_frame(&root, &Environment::new(), &mut backend)
                .unwrap();
        }
    });
    let noisy: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.level <= tracing::Level::WARN)
        .collect();
    assert!(noisy.is_empty(), "unexpected warnings: {noisy:?}");
}
