#![forbid(unsafe_code)]

//! Frame orchestration.
//!
//! [`Renderer::render_frame`] runs one complete frame on the calling thread:
//!
//! 1. Start the frame: clear seen marks; each pass clears the per-pass
//!    registries (key handlers, focus sections, header, status items).
//! 2. Assemble the environment from theme, focus and terminal size; purge
//!    memoized renders when the palette/appearance fingerprint changed.
//! 3. First frame only: a measuring pass at the estimated header height,
//!    never written or diffed.
//! 4. Render at content height = terminal height − header − status line.
//! 5. If the header or status line came out a different height than
//!    assumed, invalidate the content cache and render once more. A second
//!    mismatch is logged and the last pass is used as is.
//! 6. Validate focus.
//! 7. Style-wrap, diff and queue header, status line and content into one
//!    buffer, then write it once.
//! 8. Expire state, hooks and memo entries not seen this frame.

use std::io;
use std::rc::Rc;

use weft_core::backend::TerminalBackend;
use weft_render::ansi::SGR_RESET;
use weft_render::counting_writer::PresentStats;
use weft_render::width::{pad_to_width, truncate_to_width};
use weft_render::{FrameBuilder, FrameDiffCache, OutputBuffer, PresentOptions, Region};

use crate::dirty::DirtyHandle;
use crate::environment::{
    ActiveSectionKey, AppearanceKey, EnvFingerprint, Environment, FocusedIdKey, FrameIndexKey,
    PaletteKey, TerminalSizeKey,
};
use crate::error::ViewError;
use crate::services::FrameServices;
use crate::status::{StatusItem, render_line};
use crate::view::{RenderContext, View};

/// Renderer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererOptions {
    /// Wrap frames in synchronized output.
    pub sync_output: bool,
    /// Header rows assumed by the measuring pass.
    pub header_height_estimate: u16,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            sync_output: false,
            header_height_estimate: 1,
        }
    }
}

/// Rows taken by the header and the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geometry {
    /// Header rows.
    pub header: usize,
    /// Status line rows (0 or 1).
    pub status: usize,
}

impl Geometry {
    fn content(self, height: usize) -> usize {
        height.saturating_sub(self.header + self.status)
    }
}

/// What one frame did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Index of this frame (0 for the first).
    pub frame_index: u64,
    /// Terminal columns.
    pub width: u16,
    /// Terminal rows.
    pub height: u16,
    /// Final header/status geometry.
    pub geometry: Geometry,
    /// Content rows.
    pub content_rows: usize,
    /// Rows written per region, in [`Region::ALL`] order.
    pub region_writes: [usize; 3],
    /// Rows erased per region, in [`Region::ALL`] order.
    pub region_clears: [usize; 3],
    /// Bytes handed to the terminal (0 when nothing changed).
    pub bytes: usize,
    /// The first-frame measuring pass ran.
    pub measured: bool,
    /// The geometry correction pass ran.
    pub corrected: bool,
    /// The screen was erased before drawing.
    pub cleared: bool,
    /// Errors recorded by the final pass.
    pub errors: Vec<ViewError>,
    /// Presenter statistics.
    pub stats: PresentStats,
}

impl FrameReport {
    /// Rows written in `region`.
    #[must_use]
    pub fn writes(&self, region: Region) -> usize {
        self.region_writes[region_index(region)]
    }

    /// Whether anything reached the terminal.
    #[must_use]
    pub fn wrote(&self) -> bool {
        self.bytes > 0
    }
}

fn region_index(region: Region) -> usize {
    match region {
        Region::Header => 0,
        Region::Content => 1,
        Region::StatusLine => 2,
    }
}

struct Pass {
    content: OutputBuffer,
    header: Option<OutputBuffer>,
    status: Vec<StatusItem>,
}

impl Pass {
    fn geometry(&self, height: usize) -> Geometry {
        let header = self.header.as_ref().map_or(0, OutputBuffer::height).min(height);
        let status = usize::from(!self.status.is_empty()).min(height - header);
        Geometry { header, status }
    }
}

/// Drives frames: owns the services views use and the diff cache.
#[derive(Debug)]
pub struct Renderer {
    services: FrameServices,
    diff: FrameDiffCache,
    options: RendererOptions,
    fingerprint: Option<EnvFingerprint>,
    geometry: Option<Geometry>,
    size: Option<(u16, u16)>,
    frame_index: u64,
    needs_clear: bool,
}

impl Renderer {
    /// A renderer whose state handles mark `dirty`.
    #[must_use]
    pub fn new(options: RendererOptions, dirty: DirtyHandle) -> Self {
        Self {
            services: FrameServices::new(dirty),
            diff: FrameDiffCache::new(),
            options,
            fingerprint: None,
            geometry: None,
            size: None,
            frame_index: 0,
            needs_clear: true,
        }
    }

    /// Services shared with views and the input chain.
    #[must_use]
    pub fn services(&self) -> &FrameServices {
        &self.services
    }

    /// Services, mutably.
    pub fn services_mut(&mut self) -> &mut FrameServices {
        &mut self.services
    }

    /// The diff cache.
    #[must_use]
    pub fn diff_cache(&self) -> &FrameDiffCache {
        &self.diff
    }

    /// Frames rendered so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_index
    }

    /// Forget the previous frame: the next one erases the screen and
    /// rewrites every row of every region.
    pub fn invalidate(&mut self) {
        tracing::debug!("diff cache invalidated");
        self.diff.invalidate_all();
        self.needs_clear = true;
    }

    /// Drop focus, state and memoized renders (teardown).
    pub fn reset(&mut self) {
        self.services.clear();
        self.diff.invalidate_all();
        self.fingerprint = None;
        self.geometry = None;
        self.size = None;
        self.needs_clear = true;
    }

    /// Render `root` and write the changes to `backend` in one write.
    ///
    /// # Errors
    ///
    /// Propagates size query and write failures from the backend. View
    /// failures never fail the frame; they are listed in the report.
    pub fn render_frame<B: TerminalBackend + ?Sized>(
        &mut self,
        root: &dyn View,
        base: &Environment,
        backend: &mut B,
    ) -> io::Result<FrameReport> {
        let (cols, rows) = backend.size()?;
        let span = tracing::debug_span!("weft.frame", frame = self.frame_index, cols, rows);
        let _entered = span.enter();

        if self.size.is_some_and(|size| size != (cols, rows)) {
            self.invalidate();
        }
        self.size = Some((cols, rows));
        let (width, height) = (usize::from(cols), usize::from(rows));

        let env = self.environment(base, cols, rows);
        let fingerprint = env.fingerprint();
        if self.fingerprint.is_some_and(|previous| previous != fingerprint) {
            self.services.purge_memo();
        }
        self.fingerprint = Some(fingerprint);

        let focus_before = self.services.focus.snapshot();
        self.services.begin_frame();

        let mut report = FrameReport {
            frame_index: self.frame_index,
            width: cols,
            height: rows,
            ..FrameReport::default()
        };

        let assumed = match self.geometry {
            Some(geometry) => geometry,
            None => {
                let estimate = Geometry {
                    header: usize::from(self.options.header_height_estimate).min(height),
                    status: usize::from(height > 0),
                };
                let trial = self.pass(root, &env, width, estimate.content(height));
                report.measured = true;
                let measured = trial.geometry(height);
                tracing::debug!(
                    header = measured.header,
                    status = measured.status,
                    "measured geometry"
                );
                measured
            }
        };

        let mut pass = self.pass(root, &env, width, assumed.content(height));
        let mut geometry = pass.geometry(height);
        if geometry != assumed {
            tracing::debug!(
                assumed_header = assumed.header,
                actual_header = geometry.header,
                "geometry corrected"
            );
            report.corrected = true;
            self.diff.invalidate(Region::Content);
            let corrected = geometry;
            pass = self.pass(root, &env, width, corrected.content(height));
            geometry = pass.geometry(height);
            if geometry != corrected {
                tracing::warn!(
                    expected_header = corrected.header,
                    actual_header = geometry.header,
                    "geometry unstable after correction"
                );
            }
        }
        let previous = self.geometry.replace(geometry);
        self.services.focus.apply_requests();
        self.services.focus.finish_frame();

        let content_rows = geometry.content(height);
        let header_lines = self.region_lines(
            &env,
            Region::Header,
            pass.header.as_ref(),
            width,
            geometry.header,
        );
        let status_buffer =
            (geometry.status > 0).then(|| OutputBuffer::text(&render_line(&pass.status)));
        let status_lines = self.region_lines(
            &env,
            Region::StatusLine,
            status_buffer.as_ref(),
            width,
            geometry.status,
        );
        let content_lines =
            self.region_lines(&env, Region::Content, Some(&pass.content), width, content_rows);
        // A vanished status line is erased where it used to be.
        let status_rows = previous.map_or(geometry.status, |p| p.status.max(geometry.status));

        let mut builder = FrameBuilder::new(
            PresentOptions {
                sync_output: self.options.sync_output,
            },
            self.needs_clear,
        );
        let regions = [
            (Region::Header, 0, &header_lines),
            (Region::StatusLine, height.saturating_sub(status_rows), &status_lines),
            (Region::Content, geometry.header, &content_lines),
        ];
        for (region, top, lines) in regions {
            let diff = self.diff.diff(region, lines);
            report.region_writes[region_index(region)] = diff.changed.len();
            report.region_clears[region_index(region)] = diff.cleared.len();
            builder.region(to_row(top), lines, &diff);
        }
        let (bytes, stats) = builder.finish();
        if !bytes.is_empty() {
            backend.write_frame(&bytes)?;
        }
        stats.log();
        report.cleared = self.needs_clear;
        self.needs_clear = false;

        report.geometry = geometry;
        report.content_rows = content_rows;
        report.bytes = bytes.len();
        report.stats = stats;
        report.errors = self.services.errors.clone();

        let expired = self.services.end_frame();
        if expired > 0 {
            tracing::debug!(expired, "expired view state");
        }
        if self.services.focus.snapshot() != focus_before {
            self.services.dirty().mark();
        }
        self.frame_index += 1;
        Ok(report)
    }

    fn environment(&self, base: &Environment, cols: u16, rows: u16) -> Environment {
        let mut env = base.clone();
        let theme = &self.services.theme;
        if !env.contains::<PaletteKey>() {
            env.set::<PaletteKey>(theme.palette().clone());
        }
        if !env.contains::<AppearanceKey>() {
            env.set::<AppearanceKey>(theme.appearance());
        }
        let focus = self.services.focus.snapshot();
        env.set::<FocusedIdKey>(focus.focused);
        env.set::<ActiveSectionKey>(focus.active_section);
        env.set::<TerminalSizeKey>((cols, rows));
        env.set::<FrameIndexKey>(self.frame_index);
        env
    }

    fn pass(&mut self, root: &dyn View, env: &Environment, width: usize, height: usize) -> Pass {
        self.services.begin_pass();
        let content =
            RenderContext::new(&mut self.services, width, height, env.clone()).render(root);
        Pass {
            content,
            header: self.services.header.clone(),
            status: self.services.status.clone(),
        }
    }

    /// Fit `buffer` to `rows` × `width` and apply the region's colors.
    ///
    /// Resets inside a line re-apply the background so it does not bleed
    /// out, and every line ends with a reset.
    fn region_lines(
        &self,
        env: &Environment,
        region: Region,
        buffer: Option<&OutputBuffer>,
        width: usize,
        rows: usize,
    ) -> Vec<String> {
        let palette = env.get::<PaletteKey>();
        let appearance = env.get::<AppearanceKey>();
        let prefix: Rc<str> = Rc::from(format!(
            "{}{}",
            palette.background(region, appearance).bg(),
            palette.swatch(appearance).text.fg()
        ));
        let restyle = format!("{SGR_RESET}{prefix}");
        (0..rows)
            .map(|row| {
                let line = buffer.and_then(|b| b.line(row)).unwrap_or("");
                let fitted = pad_to_width(&truncate_to_width(line, width), width);
                format!("{prefix}{}{SGR_RESET}", fitted.replace(SGR_RESET, &restyle))
            })
            .collect()
    }
}

fn to_row(row: usize) -> u16 {
    u16::try_from(row).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Header, Text, VStack};
    use crate::status::KeyBinding;
    use crate::view::{Body, view_fn};
    use std::cell::Cell;
    use weft_core::backend::HeadlessBackend;
    use weft_render::ansi::strip_ansi;

    fn renderer() -> Renderer {
        Renderer::new(RendererOptions::default(), DirtyHandle::new())
    }

    #[test]
    fn first_frame_measures_and_clears() {
        let mut renderer = renderer();
        let mut backend = HeadlessBackend::new(20, 5);
        let root = Text::new("hello");
        let report = renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();

        assert!(report.measured);
        assert!(!report.corrected);
        assert!(report.cleared);
        assert_eq!(report.geometry, Geometry::default());
        assert_eq!(report.content_rows, 5);
        assert_eq!(report.writes(Region::Content), 5);
        assert_eq!(backend.write_count(), 1);
        let frame = backend.last_frame().unwrap();
        assert!(frame.contains("\x1b[2J"));
        assert!(frame.contains("\x1b[1;1H"));
    }

    #[test]
    fn unchanged_frame_writes_nothing() {
        let mut renderer = renderer();
        let mut backend = HeadlessBackend::new(20, 5);
        let root = Text::new("static");
        renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        let report = renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        assert!(!report.wrote());
        assert!(!report.measured);
        assert_eq!(backend.write_count(), 1);
    }

    #[test]
    fn header_and_status_take_rows() {
        let mut renderer = renderer();
        let mut backend = HeadlessBackend::new(30, 6);
        let root = VStack::new()
            .child(Header::new(Text::new("Title\nSubtitle")))
            .child(view_fn(|cx| {
                cx.status_item(StatusItem::hint("Quit", KeyBinding::char('q')));
                Body::Buffer(OutputBuffer::text(&format!("rows={}", cx.height())))
            }));
        let report = renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        assert_eq!(report.geometry, Geometry { header: 2, status: 1 });
        assert_eq!(report.content_rows, 3);
        assert!(!report.corrected);

        let cached = renderer.diff_cache().region(Region::Content).lines();
        assert!(strip_ansi(&cached[0]).starts_with("rows=3"));
        let status = renderer.diff_cache().region(Region::StatusLine).lines();
        assert!(strip_ansi(&status[0]).starts_with(" [q] Quit"));
        assert!(backend.last_frame().unwrap().contains("\x1b[6;1H"));
    }

    #[test]
    fn vanished_status_line_is_erased_on_screen() {
        let mut renderer = renderer();
        let mut backend = HeadlessBackend::new(20, 4);
        let shown = Rc::new(Cell::new(true));
        let flag = Rc::clone(&shown);
        let root = view_fn(move |cx| {
            if flag.get() {
                cx.status_item(StatusItem::hint("Quit", KeyBinding::char('q')));
            }
            Body::Buffer(OutputBuffer::text("body"))
        });
        renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();

        shown.set(false);
        let report = renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        assert_eq!(report.geometry, Geometry::default());
        assert_eq!(report.region_clears[region_index(Region::StatusLine)], 1);
        let frame = backend.last_frame().unwrap();
        assert!(!frame.contains("\x1b[5;1H"));
        assert!(frame.contains("\x1b[4;1H\x1b[2K"));
    }

    #[test]
    fn header_growth_triggers_one_correction() {
        let mut renderer = renderer();
        let mut backend = HeadlessBackend::new(20, 6);
        let tall = Rc::new(Cell::new(false));
        let flag = Rc::clone(&tall);
        let root = view_fn(move |cx| {
            let header = if flag.get() { "a\nb\nc" } else { "a" };
            cx.set_header(OutputBuffer::text(header));
            Body::Buffer(OutputBuffer::text(&format!("{}", cx.height())))
        });
        renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();

        tall.set(true);
        let report = renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        assert!(report.corrected);
        assert_eq!(report.geometry.header, 3);
        assert_eq!(report.writes(Region::Content), 3);
        let cached = renderer.diff_cache().region(Region::Content).lines();
        assert!(strip_ansi(&cached[0]).starts_with('3'));
    }

    #[test]
    fn unstable_geometry_is_bounded() {
        let mut renderer = renderer();
        let mut backend = HeadlessBackend::new(20, 10);
        let passes = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&passes);
        let root = view_fn(move |cx| {
            counter.set(counter.get() + 1);
            let rows = counter.get() % 4 + 1;
            cx.set_header(OutputBuffer::text(&vec!["h"; rows].join("\n")));
            Body::empty()
        });
        renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        let before = passes.get();
        let report = renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        assert!(report.corrected);
        assert_eq!(passes.get() - before, 2);
    }

    #[test]
    fn background_wraps_every_line() {
        let mut renderer = renderer();
        let mut backend = HeadlessBackend::new(8, 2);
        let root = Text::new("x\x1b[0my");
        renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        let theme = renderer.services().theme().clone();
        let bg = theme.region_background(Region::Content);
        let lines = renderer.diff_cache().region(Region::Content).lines();
        assert!(lines[0].starts_with(&bg));
        assert!(lines[0].ends_with(SGR_RESET));
        assert!(lines[0].contains(&format!("\x1b[0m{bg}")));
        assert_eq!(weft_render::visible_width(&lines[0]), 8);
    }

    #[test]
    fn palette_change_purges_memo_and_rewrites() {
        let mut renderer = renderer();
        let mut backend = HeadlessBackend::new(10, 2);
        let root = crate::primitives::Memo::new(0, Text::new("m"));
        renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        assert_eq!(renderer.services().memo_len(), 1);

        renderer.services_mut().theme_mut().cycle_palette();
        let report = renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        assert_eq!(report.writes(Region::Content), 2);
    }

    #[test]
    fn focus_change_during_frame_requests_another() {
        struct Target;
        impl crate::focus::FocusTarget for Target {
            fn focus_id(&self) -> &str {
                "t"
            }
        }
        let dirty = DirtyHandle::new();
        let mut renderer = Renderer::new(RendererOptions::default(), dirty.clone());
        let mut backend = HeadlessBackend::new(10, 2);
        let root = view_fn(|cx| {
            cx.register_focus(Rc::new(Target));
            Body::empty()
        });
        renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        assert!(dirty.take());
        renderer.render_frame(&root, &Environment::new(), &mut backend).unwrap();
        assert!(!dirty.take());
    }
}
