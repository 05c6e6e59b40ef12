#![forbid(unsafe_code)]

//! weft demo binary entry point.

use std::process;

use weft::ProgramConfig;
use weft_demo::app::DemoApp;
use weft_demo::cli::{self, Command};
use weft_demo::logging;

fn main() {
    let opts = match cli::parse(std::env::args().skip(1)) {
        Ok(Command::Run(opts)) => opts,
        Ok(Command::Help) => {
            println!("{}", cli::HELP_TEXT);
            return;
        }
        Ok(Command::Version) => {
            println!("{}", cli::version());
            return;
        }
        Err(message) => {
            eprintln!("{message}");
            eprintln!("Run with --help for usage information.");
            process::exit(2);
        }
    };

    if let Err(e) = logging::init(&opts.log_file) {
        eprintln!("Cannot open log file {}: {e}", opts.log_file.display());
        process::exit(1);
    }

    let config = opts.apply(ProgramConfig::from_env());
    let mut app = DemoApp::new();
    if let Some(title) = &opts.title {
        app = app.with_title(title.clone());
    }
    tracing::info!(?config, "starting demo");

    if let Err(e) = weft::run(app, config) {
        eprintln!("Runtime error: {e}");
        process::exit(1);
    }
}
