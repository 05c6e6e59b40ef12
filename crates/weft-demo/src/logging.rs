#![forbid(unsafe_code)]

//! Log setup. The terminal belongs to the UI, so logs go to a file and only
//! when `WEFT_LOG` asks for them.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "WEFT_LOG";

/// Install a file subscriber if `WEFT_LOG` is set.
///
/// Returns `Ok(false)` when logging stays off, including when another
/// subscriber was installed first.
///
/// # Errors
///
/// Fails when the log file cannot be created.
pub fn init(path: &Path) -> io::Result<bool> {
    let Ok(directives) = std::env::var(LOG_ENV) else {
        return Ok(false);
    };
    let filter = filter(&directives);
    let file = File::create(path)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .is_ok();
    Ok(installed)
}

/// Parse `directives`, falling back to `warn` when they are malformed.
fn filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_pass_through() {
        assert_eq!(filter("weft_runtime=debug").to_string(), "weft_runtime=debug");
    }

    #[test]
    fn missing_variable_leaves_logging_off() {
        if std::env::var_os(LOG_ENV).is_none() {
            assert!(!init(Path::new("unused.log")).unwrap());
        }
    }
}
