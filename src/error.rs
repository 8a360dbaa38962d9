//! Centralized error type and process exit codes.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate
//! boundaries; each error maps onto the exit code the process reports.

use bounce_plugin::PluginError;
use thiserror::Error;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    /// Help, version, or file-type listing was printed instead of running.
    NotRun,
    InvalidArgument,
    MissingRequiredOption,
    IoError,
    PluginError,
    InvalidPluginChain,
}

impl ExitCode {
    pub const fn code(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::NotRun => 1,
            ExitCode::InvalidArgument => 2,
            ExitCode::MissingRequiredOption => 3,
            ExitCode::IoError => 4,
            ExitCode::PluginError => 5,
            ExitCode::InvalidPluginChain => 6,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    MissingRequiredOption(&'static str),

    #[error(transparent)]
    Settings(#[from] bounce_core::CoreError),

    #[error(transparent)]
    Io(#[from] bounce_io::IoError),

    #[error("MIDI: {0}")]
    Midi(#[from] bounce_midi::MidiError),

    #[error(transparent)]
    Plugin(#[from] bounce_plugin::PluginError),
}

impl Error {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::MissingRequiredOption(_) => ExitCode::MissingRequiredOption,
            Error::Settings(_) => ExitCode::InvalidArgument,
            Error::Io(_) | Error::Midi(_) => ExitCode::IoError,
            // Load and handshake failures happen during chain
            // initialization; only name resolution and list parsing make a
            // chain invalid.
            Error::Plugin(PluginError::InitFailed { .. } | PluginError::LoadFailed { .. }) => {
                ExitCode::PluginError
            }
            Error::Plugin(_) => ExitCode::InvalidPluginChain,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
