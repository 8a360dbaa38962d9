//! # bounce: offline audio plugin host
//!
//! Loads a chain of audio-effect and instrument plugins, pulls blocks from
//! a sample source, aligns timestamped MIDI events to sample positions,
//! drives the chain in order, and writes the processed result to an output
//! file. Deterministic batch rendering, no DAW required.
//!
//! The workspace splits along the same seams as the data flow:
//! - **bounce-core**: audio settings, transport clock, sample buffers,
//!   task timing
//! - **bounce-midi**: event timeline, SMF loading, per-block slicing
//! - **bounce-io**: WAV/AIFF/PCM/silence sample sources
//! - **bounce-plugin**: the plugin contract, VST2 backend, built-ins, and
//!   the chain
//!
//! This crate ties them together: [`engine::prepare`] validates a
//! [`engine::RunConfig`] into an [`Engine`], and [`Engine::run`] executes
//! the clocked main loop.

pub mod cli;
pub mod engine;
mod error;
pub mod logging;

pub use engine::{prepare, Engine, RenderStats, RunConfig, PROGRAM_NAME};
pub use error::{Error, ExitCode, Result};

pub use bounce_core::{AudioClock, AudioSettings, SampleBuffer, TaskTimer};
pub use bounce_io::{
    open_sample_source, silence_source, Direction, SampleSource, SourceState, SourceType,
};
pub use bounce_midi::{MidiEvent, MidiEventList, MidiFileSource, MidiSequence};
pub use bounce_plugin::{
    open_by_name, Plugin, PluginCategory, PluginChain, PluginError, PluginSpec, PluginType,
};
