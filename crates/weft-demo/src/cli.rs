#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually to keep the binary lean. Engine settings start from
//! `WEFT_*` environment variables (see [`weft::ProgramConfig::from_env`]);
//! flags given on the command line win.

use std::path::PathBuf;
use std::time::Duration;

use weft::ProgramConfig;
use weft::runtime::AnimationConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default log file, used when `WEFT_LOG` is set and `--log-file` is not.
pub const DEFAULT_LOG_FILE: &str = "weft-demo.log";

pub const HELP_TEXT: &str = "\
weft demo

USAGE:
    weft-demo [OPTIONS]

OPTIONS:
    --title=TEXT          Header title (default: weft demo)
    --frame-interval=MS   Tick interval in milliseconds (default: 28)
    --max-events=N        Input events handled per tick (default: 128)
    --inline              Render on the main screen instead of the alternate one
    --sync-output         Wrap frames in synchronized output
    --no-animation        Disable the animation timers
    --log-file=PATH       Where logs go when WEFT_LOG is set (default: weft-demo.log)
    --help, -h            Show this help message
    --version, -V         Show version

KEYBINDINGS:
    Tab / Shift-Tab   Cycle focus sections
    Arrow keys        Move between targets of a section
    Enter / Space     Press the focused button
    Ctrl+R            Reset the form
    t / a             Cycle palette / toggle light and dark
    q / Ctrl+C        Quit (outside the name field)

ENVIRONMENT VARIABLES:
    WEFT_LOG                   Log filter, e.g. weft_runtime=debug
    WEFT_FRAME_INTERVAL_MS     Default for --frame-interval
    WEFT_MAX_EVENTS_PER_TICK   Default for --max-events
    WEFT_SYNC_OUTPUT           Default for --sync-output
    WEFT_ALT_SCREEN            0 behaves like --inline";

/// What `main` should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the demo.
    Run(Opts),
    /// Print help and exit.
    Help,
    /// Print the version and exit.
    Version,
}

/// Parsed options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Header title.
    pub title: Option<String>,
    /// Tick interval override.
    pub frame_interval: Option<Duration>,
    /// Drain cap override.
    pub max_events: Option<usize>,
    /// Stay on the main screen.
    pub inline: bool,
    /// Force synchronized output on.
    pub sync_output: bool,
    /// Turn the animation timers off.
    pub no_animation: bool,
    /// Log destination.
    pub log_file: PathBuf,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            title: None,
            frame_interval: None,
            max_events: None,
            inline: false,
            sync_output: false,
            no_animation: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// Parse `args` (without the program name).
///
/// # Errors
///
/// Returns a message naming the offending argument.
pub fn parse<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut opts = Opts::default();
    for arg in args {
        let arg = arg.as_ref();
        match arg {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--inline" => opts.inline = true,
            "--sync-output" => opts.sync_output = true,
            "--no-animation" => opts.no_animation = true,
            other => {
                if let Some(val) = other.strip_prefix("--title=") {
                    opts.title = Some(val.to_string());
                } else if let Some(val) = other.strip_prefix("--frame-interval=") {
                    let ms: u64 = number(val, "--frame-interval")?;
                    opts.frame_interval = Some(Duration::from_millis(ms.max(1)));
                } else if let Some(val) = other.strip_prefix("--max-events=") {
                    opts.max_events = Some(number(val, "--max-events")?);
                } else if let Some(val) = other.strip_prefix("--log-file=") {
                    opts.log_file = PathBuf::from(val);
                } else {
                    return Err(format!("Unknown argument: {other}"));
                }
            }
        }
    }
    Ok(Command::Run(opts))
}

fn number<T: std::str::FromStr>(val: &str, flag: &str) -> Result<T, String> {
    val.parse()
        .map_err(|_| format!("Invalid {flag} value: {val}"))
}

/// The version line.
#[must_use]
pub fn version() -> String {
    format!("weft-demo {VERSION}")
}

impl Opts {
    /// Apply the flags on top of `config`.
    #[must_use]
    pub fn apply(&self, mut config: ProgramConfig) -> ProgramConfig {
        if let Some(interval) = self.frame_interval {
            config = config.with_frame_interval(interval);
        }
        if let Some(cap) = self.max_events {
            config = config.with_max_events_per_tick(cap);
        }
        if self.inline {
            config = config.with_alternate_screen(false);
        }
        if self.sync_output {
            config = config.with_sync_output(true);
        }
        if self.no_animation {
            config = config.with_animation(AnimationConfig::default());
        }
        config
    }
}
