//! Sample sources for the bounce offline host.
//!
//! A [`SampleSource`] pulls or pushes fixed-size blocks of audio. The
//! concrete format is guessed from the file extension; the silence variant
//! feeds instrument-headed chains that have no input file.

mod aiff;
mod error;
mod pcm;
mod silence;
mod source;
mod wav;

pub use error::{IoError, Result};
pub use source::{
    guess_source_type, open_sample_source, silence_source, supported_types, Direction,
    SampleSource, SourceState, SourceType,
};
