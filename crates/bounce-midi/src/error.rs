//! MIDI errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MidiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MIDI parse error: {0}")]
    Parse(#[from] midly::Error),

    #[error("SMPTE timecode timing is not supported")]
    UnsupportedTiming,
}

pub type Result<T> = std::result::Result<T, MidiError>;
