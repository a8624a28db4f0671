use std::env;

use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

/// Initialize stderr logging. The level comes from `MINISH_LOG`
/// (`error`..`trace`); logging is off by default so the shell's own
/// diagnostics stay clean.
pub fn init() {
    let level = env::var("MINISH_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Off);
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}
