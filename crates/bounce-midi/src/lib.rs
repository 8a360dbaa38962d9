//! MIDI support for the bounce offline host.
//!
//! A run's MIDI timeline is loaded from a Standard MIDI File into an
//! immutable [`MidiSequence`] before the processing loop starts; the engine
//! then slices it into per-block event lists with sample-accurate
//! `delta_frames`.

mod error;
mod event;
mod sequence;
mod smf;

pub use error::{MidiError, Result};
pub use event::{MidiEvent, MidiEventList};
pub use sequence::MidiSequence;
pub use smf::{MidiFileSource, TempoMap};
