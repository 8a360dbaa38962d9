//! Command-line surface.

use crate::engine::{RunConfig, PROGRAM_NAME};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bounce",
    about = "Offline audio plugin host: renders a plugin chain over audio and MIDI files",
    disable_version_flag = true
)]
pub struct Options {
    /// Print version and license information
    #[arg(long)]
    pub version: bool,

    /// List supported sample source types
    #[arg(long)]
    pub list_file_types: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Colored log output with the given scheme (dark, light, none)
    #[arg(long, value_name = "SCHEME")]
    pub color: Option<String>,

    /// Processing blocksize in frames
    #[arg(long, value_name = "FRAMES")]
    pub blocksize: Option<usize>,

    /// Channel count
    #[arg(long, value_name = "NUM")]
    pub channels: Option<usize>,

    /// Sample rate in Hz
    #[arg(long, value_name = "HZ")]
    pub sample_rate: Option<f64>,

    /// Input sample source
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output sample source
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// MIDI file to feed the chain
    #[arg(long, value_name = "PATH")]
    pub midi_file: Option<PathBuf>,

    /// Plugins to append to the chain (comma or semicolon separated,
    /// each `name` or `name(key=value,...)`)
    #[arg(short, long = "plugin", value_name = "LIST")]
    pub plugins: Vec<String>,

    /// Dump plugin metadata after initialization, before running
    #[arg(long)]
    pub display_info: bool,
}

impl Options {
    pub fn to_run_config(&self) -> RunConfig {
        RunConfig {
            sample_rate: self.sample_rate,
            blocksize: self.blocksize,
            channels: self.channels,
            input: self.input.clone(),
            output: self.output.clone(),
            midi_file: self.midi_file.clone(),
            plugins: self.plugins.clone(),
            display_info: self.display_info,
        }
    }
}

pub fn print_version() {
    println!(
        "{} version {}",
        PROGRAM_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!("Copyright (c) 2026 the bounce authors.");
    println!("Licensed under the MIT license; this software comes with no warranty.");
}

pub fn print_file_types() {
    println!("Supported source types:");
    for (extensions, description) in bounce_io::supported_types() {
        println!("  {:<12} {}", extensions, description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_option_set() {
        let options = Options::try_parse_from([
            "bounce",
            "--input",
            "in.wav",
            "--output",
            "out.wav",
            "--plugin",
            "again(gain=1.0)",
            "--blocksize",
            "256",
            "--channels",
            "2",
            "--sample-rate",
            "48000",
            "--midi-file",
            "notes.mid",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(options.blocksize, Some(256));
        assert_eq!(options.sample_rate, Some(48000.0));
        assert_eq!(options.plugins, vec!["again(gain=1.0)".to_string()]);
        assert!(options.verbose);

        let config = options.to_run_config();
        assert_eq!(config.midi_file, Some(PathBuf::from("notes.mid")));
    }

    #[test]
    fn test_repeated_plugin_options_accumulate() {
        let options =
            Options::try_parse_from(["bounce", "-p", "sinesynth", "-p", "again(gain=0.5)"])
                .unwrap();
        assert_eq!(options.plugins.len(), 2);
    }

    #[test]
    fn test_invalid_blocksize_is_a_parse_error() {
        assert!(Options::try_parse_from(["bounce", "--blocksize", "lots"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Options::try_parse_from(["bounce", "-q", "-v"]).is_err());
    }
}
