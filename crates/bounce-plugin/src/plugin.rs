//! The uniform plugin contract and name resolution.

use crate::error::Result;
use crate::internal;
use crate::PluginError;
use bounce_core::{AudioSettings, SampleBuffer};
use bounce_midi::MidiEvent;

#[cfg(feature = "vst2")]
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginType {
    Vst2,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginCategory {
    Effect,
    /// Produces audio from MIDI and tolerates silent input. Only legal at
    /// the head of a chain.
    Instrument,
    Unknown,
}

/// A plugin name plus any `key=value` parameters from the argument string.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginSpec {
    pub name: String,
    pub params: Vec<(String, f32)>,
}

/// An audio/MIDI processor.
///
/// Lifecycle: resolved by [`open_by_name`], then `initialize` with the
/// final audio settings before any processing, then zero or more blocks,
/// then `close` (idempotent). Backend libraries load during `initialize`,
/// so a resolution failure means the name is unknown while a load or
/// handshake failure is an initialization error. A processing-phase
/// misbehavior is the plugin's problem to log; the host keeps delivering
/// blocks.
pub trait Plugin {
    fn name(&self) -> &str;

    fn plugin_type(&self) -> PluginType;

    fn category(&self) -> PluginCategory;

    fn accepts_midi(&self) -> bool;

    /// Load the backend (where one exists) and communicate the engine's
    /// audio settings. Required before processing; a plugin that cannot be
    /// loaded or rejects the settings fails here.
    fn initialize(&mut self, settings: &AudioSettings) -> Result<()>;

    /// Transform one block. `output` must be fully populated.
    fn process_audio(&mut self, input: &SampleBuffer, output: &mut SampleBuffer);

    /// Deliver this block's MIDI events, each carrying `delta_frames`.
    fn process_midi_events(&mut self, events: &[MidiEvent]);

    /// Log descriptive metadata (name, vendor, parameters).
    fn display_info(&mut self);

    fn close(&mut self);
}

/// Resolve a plugin by symbolic name: host built-ins first, then a VST2
/// dynamic library on disk (as given, then with the platform extension).
///
/// Resolution is cheap. No library is opened here; that happens in
/// `initialize`, so an unknown name is the only failure this can report.
pub fn open_by_name(spec: &PluginSpec) -> Result<Box<dyn Plugin>> {
    if let Some(plugin) = internal::create(spec)? {
        return Ok(plugin);
    }

    #[cfg(feature = "vst2")]
    if let Some(path) = resolve_vst2_path(&spec.name) {
        if !spec.params.is_empty() {
            tracing::warn!(
                "Ignoring parameters for VST2 plugin '{}'; set them in the plugin's own state",
                spec.name
            );
        }
        return Ok(Box::new(crate::vst2::Vst2Plugin::resolve(&path)));
    }

    Err(PluginError::Unresolved(spec.name.clone()))
}

#[cfg(all(feature = "vst2", target_os = "windows"))]
const DYLIB_EXTENSION: &str = "dll";
#[cfg(all(feature = "vst2", target_os = "macos"))]
const DYLIB_EXTENSION: &str = "vst";
#[cfg(all(feature = "vst2", not(any(target_os = "windows", target_os = "macos"))))]
const DYLIB_EXTENSION: &str = "so";

#[cfg(feature = "vst2")]
fn resolve_vst2_path(name: &str) -> Option<PathBuf> {
    let direct = PathBuf::from(name);
    if direct.exists() {
        return Some(direct);
    }
    let with_extension = PathBuf::from(format!("{}.{}", name, DYLIB_EXTENSION));
    if with_extension.exists() {
        return Some(with_extension);
    }
    None
}
