//! Sample source errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unknown sample source type for '{0}'")]
    UnknownType(PathBuf),

    #[error("Unsupported format in '{path}': {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("'{path}' has {found} channels but the engine is configured for {expected}")]
    ChannelMismatch {
        path: PathBuf,
        found: usize,
        expected: usize,
    },

    #[error("Source '{name}' does not support {operation}")]
    NotSupported {
        name: String,
        operation: &'static str,
    },

    #[error("Source '{0}' is closed")]
    Closed(String),
}

pub type Result<T> = std::result::Result<T, IoError>;
