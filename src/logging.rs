//! Log initialization.
//!
//! Diagnostics go to stderr so stdout stays clean for usage and listings.

use crate::cli::Options;
use tracing::{warn, Level};

const KNOWN_SCHEMES: &[&str] = &["dark", "light", "none"];

pub fn init(options: &Options) {
    let level = if options.verbose {
        Level::DEBUG
    } else if options.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };
    let ansi = options
        .color
        .as_deref()
        .map(|scheme| scheme != "none")
        .unwrap_or(false);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(ansi)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(scheme) = options.color.as_deref() {
        if !KNOWN_SCHEMES.contains(&scheme) {
            warn!("Unknown color scheme '{}', using the default", scheme);
        }
    }
}
