#![forbid(unsafe_code)]

//! Program configuration.
//!
//! Defaults reproduce the reference cadence: 28 ms between ticks (about 35
//! frames per second at most) and at most 128 input events per tick.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `WEFT_FRAME_INTERVAL_MS` | Tick interval in milliseconds (≥ 1) |
//! | `WEFT_MAX_EVENTS_PER_TICK` | Input drain cap (≥ 1) |
//! | `WEFT_SYNC_OUTPUT` | `1`/`true` wraps frames in synchronized output |
//! | `WEFT_ALT_SCREEN` | `0`/`false` renders on the main screen |
//!
//! Malformed values are ignored (with a warning) and the default stays.

use std::time::Duration;

use weft_core::signals::SignalMapping;
use weft_core::terminal_session::SessionOptions;

/// Default tick interval.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(28);

/// Default input drain cap per tick.
pub const DEFAULT_MAX_EVENTS_PER_TICK: usize = 128;

/// Built-in key bindings, each independently enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultBindings {
    /// `q` and Ctrl+C request shutdown.
    pub quit: bool,
    /// `t` cycles the palette.
    pub cycle_palette: bool,
    /// `a` toggles dark/light appearance.
    pub cycle_appearance: bool,
}

impl Default for DefaultBindings {
    fn default() -> Self {
        Self {
            quit: true,
            cycle_palette: true,
            cycle_appearance: true,
        }
    }
}

impl DefaultBindings {
    /// Every default binding off.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            quit: false,
            cycle_palette: false,
            cycle_appearance: false,
        }
    }
}

/// Intervals of the two animation timers. `None` disables a timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationConfig {
    /// Fast cadence (spinners, cursors).
    pub fast: Option<Duration>,
    /// Slow cadence (clocks, pulses).
    pub slow: Option<Duration>,
}

impl AnimationConfig {
    /// Both timers on, at 100 ms and 1 s.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            fast: Some(Duration::from_millis(100)),
            slow: Some(Duration::from_secs(1)),
        }
    }

    /// Whether any timer is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.fast.is_some() || self.slow.is_some()
    }
}

/// Run loop configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramConfig {
    /// Sleep between ticks; caps the frame rate.
    pub frame_interval: Duration,
    /// Input events dispatched per tick at most.
    pub max_events_per_tick: usize,
    /// Which signals request shutdown and which report a resize.
    pub signals: SignalMapping,
    /// Render on the alternate screen.
    pub alternate_screen: bool,
    /// Hide the cursor while running.
    pub hide_cursor: bool,
    /// Enable bracketed paste.
    pub bracketed_paste: bool,
    /// Wrap each frame in DEC 2026 synchronized output.
    pub sync_output: bool,
    /// Built-in bindings.
    pub bindings: DefaultBindings,
    /// Header height assumed by the first frame's measuring pass.
    pub header_height_estimate: u16,
    /// Animation timers.
    pub animation: AnimationConfig,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
            max_events_per_tick: DEFAULT_MAX_EVENTS_PER_TICK,
            signals: SignalMapping::default(),
            alternate_screen: true,
            hide_cursor: true,
            bracketed_paste: true,
            sync_output: false,
            bindings: DefaultBindings::default(),
            header_height_estimate: 1,
            animation: AnimationConfig::default(),
        }
    }
}

impl ProgramConfig {
    /// Defaults overridden by `WEFT_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `WEFT_*`
    /// keys.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(ms) = parse_var(&lookup, "WEFT_FRAME_INTERVAL_MS", |v| {
            v.parse::<u64>().ok().filter(|ms| *ms > 0)
        }) {
            config.frame_interval = Duration::from_millis(ms);
        }
        if let Some(cap) = parse_var(&lookup, "WEFT_MAX_EVENTS_PER_TICK", |v| {
            v.parse::<usize>().ok().filter(|cap| *cap > 0)
        }) {
            config.max_events_per_tick = cap;
        }
        if let Some(sync) = parse_var(&lookup, "WEFT_SYNC_OUTPUT", parse_bool) {
            config.sync_output = sync;
        }
        if let Some(alt) = parse_var(&lookup, "WEFT_ALT_SCREEN", parse_bool) {
            config.alternate_screen = alt;
        }
        config
    }

    /// Set the tick interval.
    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Set the input drain cap (clamped to at least 1).
    #[must_use]
    pub fn with_max_events_per_tick(mut self, cap: usize) -> Self {
        self.max_events_per_tick = cap.max(1);
        self
    }

    /// Set the signal mapping.
    #[must_use]
    pub fn with_signals(mut self, signals: SignalMapping) -> Self {
        self.signals = signals;
        self
    }

    /// Use or avoid the alternate screen.
    #[must_use]
    pub fn with_alternate_screen(mut self, enabled: bool) -> Self {
        self.alternate_screen = enabled;
        self
    }

    /// Enable synchronized output.
    #[must_use]
    pub fn with_sync_output(mut self, enabled: bool) -> Self {
        self.sync_output = enabled;
        self
    }

    /// Set the built-in bindings.
    #[must_use]
    pub fn with_bindings(mut self, bindings: DefaultBindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Set the first-frame header estimate.
    #[must_use]
    pub fn with_header_height_estimate(mut self, rows: u16) -> Self {
        self.header_height_estimate = rows;
        self
    }

    /// Set the animation timers.
    #[must_use]
    pub fn with_animation(mut self, animation: AnimationConfig) -> Self {
        self.animation = animation;
        self
    }

    /// Tick interval in whole milliseconds, saturating at `u64::MAX`.
    #[must_use]
    pub fn frame_interval_ms(&self) -> u64 {
        u64::try_from(self.frame_interval.as_millis()).unwrap_or(u64::MAX)
    }

    /// Terminal modes to enter.
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            alternate_screen: self.alternate_screen,
            hide_cursor: self.hide_cursor,
            bracketed_paste: self.bracketed_paste,
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = lookup(key)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        tracing::warn!(key, value = %raw, "ignoring malformed configuration value");
    }
    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_cadence() {
        let config = ProgramConfig::default();
        assert_eq!(config.frame_interval, Duration::from_millis(28));
        assert_eq!(config.max_events_per_tick, 128);
        assert!(config.alternate_screen);
        assert_eq!(config.bindings, DefaultBindings::default());
        assert!(!config.animation.is_enabled());
    }

    #[test]
    fn lookup_overrides() {
        let config = ProgramConfig::from_lookup(lookup(&[
            ("WEFT_FRAME_INTERVAL_MS", "16"),
            ("WEFT_MAX_EVENTS_PER_TICK", " 64 "),
            ("WEFT_SYNC_OUTPUT", "true"),
            ("WEFT_ALT_SCREEN", "0"),
        ]));
        assert_eq!(config.frame_interval, Duration::from_millis(16));
        assert_eq!(config.max_events_per_tick, 64);
        assert!(config.sync_output);
        assert!(!config.alternate_screen);
        assert!(!config.session_options().alternate_screen);
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let config = ProgramConfig::from_lookup(lookup(&[
            ("WEFT_FRAME_INTERVAL_MS", "fast"),
            ("WEFT_MAX_EVENTS_PER_TICK", "0"),
            ("WEFT_SYNC_OUTPUT", "maybe"),
        ]));
        assert_eq!(config, ProgramConfig::default());
    }

    #[test]
    fn builder_clamps_event_cap() {
        let config = ProgramConfig::default().with_max_events_per_tick(0);
        assert_eq!(config.max_events_per_tick, 1);
    }

    #[test]
    fn interval_millis_saturate() {
        assert_eq!(ProgramConfig::default().frame_interval_ms(), 28);
        let forever = ProgramConfig::default().with_frame_interval(Duration::MAX);
        assert_eq!(forever.frame_interval_ms(), u64::MAX);
    }
}
