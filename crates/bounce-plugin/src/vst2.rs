//! VST2 plugin backend.
//!
//! Name resolution only finds the dynamic library on disk; the library is
//! opened, instantiated, and handshaken in `initialize`, so a plugin that
//! cannot be loaded or that rejects the host's audio settings fails the
//! run as a plugin error rather than a chain error. Channel scratch
//! vectors are sized at `initialize`, so per-block processing does not
//! allocate sample storage.

use crate::error::{LoadStage, PluginError, Result};
use crate::plugin::{Plugin, PluginCategory, PluginType};
use bounce_core::{AudioSettings, SampleBuffer};
use bounce_midi::MidiEvent;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use vst::api;
use vst::buffer::AudioBuffer as VstBuffer;
use vst::host::{Host, PluginInstance, PluginLoader};
use vst::plugin::{Category, Plugin as VstPluginTrait, PluginParameters};

struct LoadedVst2 {
    instance: PluginInstance,

    /// Kept alive for the `vst` crate's Host trait dispatch.
    #[allow(dead_code)]
    host: Arc<Mutex<OfflineHost>>,

    info: vst::plugin::Info,
}

pub(crate) struct Vst2Plugin {
    name: String,
    path: PathBuf,
    loaded: Option<LoadedVst2>,

    category: PluginCategory,
    accepts_midi: bool,

    in_scratch: Vec<Vec<f32>>,
    out_scratch: Vec<Vec<f32>>,
    initialized: bool,
    closed: bool,
}

impl Vst2Plugin {
    /// Bind a resolved library path. Nothing is opened yet; the plugin's
    /// kind is unknown until `initialize` loads it.
    pub(crate) fn resolve(path: &Path) -> Self {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path: path.to_path_buf(),
            loaded: None,
            category: PluginCategory::Unknown,
            accepts_midi: false,
            in_scratch: Vec::new(),
            out_scratch: Vec::new(),
            initialized: false,
            closed: false,
        }
    }

    fn to_api_event(event: &MidiEvent) -> api::MidiEvent {
        api::MidiEvent {
            event_type: api::EventType::Midi,
            byte_size: std::mem::size_of::<api::MidiEvent>() as i32,
            delta_frames: event.delta_frames as i32,
            flags: api::MidiEventFlags::REALTIME_EVENT.bits(),
            note_length: 0,
            note_offset: 0,
            midi_data: [event.status, event.data1, event.data2],
            _midi_reserved: 0,
            detune: 0,
            note_off_velocity: 0,
            _reserved1: 0,
            _reserved2: 0,
        }
    }
}

/// Hand a pointer list to `process_events`. `api::Events` declares an
/// inline two-slot array; larger lists need manually laid-out storage.
fn dispatch_events(instance: &mut PluginInstance, pointers: &[*mut api::Event]) {
    let count = pointers.len();
    if count <= 2 {
        let mut events = api::Events {
            num_events: count as i32,
            _reserved: 0,
            events: [std::ptr::null_mut(); 2],
        };
        events.events[..count].copy_from_slice(pointers);
        instance.process_events(&events);
        return;
    }

    let header = std::mem::size_of::<api::Events>() - 2 * std::mem::size_of::<*mut api::Event>();
    let total = header + count * std::mem::size_of::<*mut api::Event>();
    let words = total.div_ceil(std::mem::size_of::<usize>());
    let mut storage = vec![0usize; words];
    let events_ptr = storage.as_mut_ptr() as *mut api::Events;
    unsafe {
        (*events_ptr).num_events = count as i32;
        (*events_ptr)._reserved = 0;
        let array = (*events_ptr).events.as_mut_ptr();
        for (index, pointer) in pointers.iter().enumerate() {
            *array.add(index) = *pointer;
        }
        instance.process_events(&*events_ptr);
    }
}

impl Plugin for Vst2Plugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn plugin_type(&self) -> PluginType {
        PluginType::Vst2
    }

    fn category(&self) -> PluginCategory {
        self.category
    }

    fn accepts_midi(&self) -> bool {
        self.accepts_midi
    }

    fn initialize(&mut self, settings: &AudioSettings) -> Result<()> {
        let host = Arc::new(Mutex::new(OfflineHost));

        let mut loader = PluginLoader::load(&self.path, Arc::clone(&host)).map_err(|e| {
            PluginError::LoadFailed {
                path: self.path.clone(),
                stage: LoadStage::Opening,
                reason: format!("{:?}", e),
            }
        })?;

        let mut instance = loader.instance().map_err(|e| PluginError::LoadFailed {
            path: self.path.clone(),
            stage: LoadStage::Instantiation,
            reason: format!("{:?}", e),
        })?;

        instance.init();
        let info = instance.get_info();

        self.category = match info.category {
            Category::Synth => PluginCategory::Instrument,
            Category::Unknown => PluginCategory::Unknown,
            _ => PluginCategory::Effect,
        };
        self.accepts_midi = info.midi_inputs > 0 || self.category == PluginCategory::Instrument;
        self.name = info.name.clone();

        // A plugin with fewer channels than the engine cannot populate the
        // output block; that is a rejection, not something to pad over.
        let inputs = info.inputs.max(0) as usize;
        let outputs = info.outputs.max(0) as usize;
        if outputs < settings.channels {
            return Err(PluginError::InitFailed {
                name: self.name.clone(),
                reason: format!(
                    "provides {} output channels but the engine runs {}",
                    outputs, settings.channels
                ),
            });
        }
        if self.category != PluginCategory::Instrument && inputs < settings.channels {
            return Err(PluginError::InitFailed {
                name: self.name.clone(),
                reason: format!(
                    "accepts {} input channels but the engine runs {}",
                    inputs, settings.channels
                ),
            });
        }

        instance.set_sample_rate(settings.sample_rate as f32);
        instance.set_block_size(settings.blocksize as i64);
        instance.resume();

        debug!(
            "Loaded VST2 plugin '{}' from {} ({} in, {} out)",
            self.name,
            self.path.display(),
            inputs,
            outputs
        );

        self.in_scratch = vec![vec![0.0; settings.blocksize]; inputs.max(settings.channels)];
        self.out_scratch = vec![vec![0.0; settings.blocksize]; outputs.max(settings.channels)];
        self.loaded = Some(LoadedVst2 {
            instance,
            host,
            info,
        });
        self.initialized = true;
        Ok(())
    }

    fn process_audio(&mut self, input: &SampleBuffer, output: &mut SampleBuffer) {
        debug_assert!(self.initialized);
        let Some(loaded) = self.loaded.as_mut() else {
            output.clear();
            return;
        };

        let blocksize = input.blocksize();
        for (channel, scratch) in self.in_scratch.iter_mut().enumerate() {
            if channel < input.num_channels() {
                scratch.copy_from_slice(input.channel(channel));
            } else {
                scratch.fill(0.0);
            }
        }
        for scratch in &mut self.out_scratch {
            scratch.fill(0.0);
        }

        let input_ptrs: Vec<*const f32> = self.in_scratch.iter().map(|v| v.as_ptr()).collect();
        let mut output_ptrs: Vec<*mut f32> =
            self.out_scratch.iter_mut().map(|v| v.as_mut_ptr()).collect();

        // Safety: the scratch vectors outlive the buffer and have blocksize
        // samples each.
        let mut vst_buffer = unsafe {
            VstBuffer::from_raw(
                input_ptrs.len(),
                output_ptrs.len(),
                input_ptrs.as_ptr(),
                output_ptrs.as_mut_ptr(),
                blocksize,
            )
        };
        loaded.instance.process(&mut vst_buffer);

        for channel in 0..output.num_channels() {
            output
                .channel_mut(channel)
                .copy_from_slice(&self.out_scratch[channel]);
        }
    }

    fn process_midi_events(&mut self, events: &[MidiEvent]) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        if events.is_empty() {
            return;
        }
        let boxed: Vec<Box<api::MidiEvent>> = events
            .iter()
            .map(|e| Box::new(Self::to_api_event(e)))
            .collect();
        let pointers: Vec<*mut api::Event> = boxed
            .iter()
            .map(|e| e.as_ref() as *const api::MidiEvent as *mut api::Event)
            .collect();
        dispatch_events(&mut loaded.instance, &pointers);
        drop(boxed);
    }

    fn display_info(&mut self) {
        info!("Plugin '{}' (VST2, {})", self.name, self.path.display());
        let Some(loaded) = self.loaded.as_mut() else {
            info!("  Not yet initialized");
            return;
        };

        info!("  Vendor: {}", loaded.info.vendor);
        info!("  Version: {}", loaded.info.version);
        info!(
            "  Audio: {} inputs, {} outputs",
            loaded.info.inputs, loaded.info.outputs
        );
        info!(
            "  MIDI input: {}",
            if self.accepts_midi { "yes" } else { "no" }
        );
        info!("  Programs: {}", loaded.info.presets);

        let params = loaded.instance.get_parameter_object();
        for index in 0..loaded.info.parameters {
            info!(
                "  Parameter {}: {} = {}",
                index,
                params.get_parameter_name(index),
                params.get_parameter_text(index)
            );
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.instance.suspend();
        }
        self.closed = true;
    }
}

/// Minimal host callback for offline rendering: no automation recording, no
/// editor, no transport reporting.
struct OfflineHost;

impl Host for OfflineHost {
    fn automate(&self, index: i32, value: f32) {
        debug!("Plugin moved parameter {} to {}", index, value);
    }

    fn get_plugin_id(&self) -> i32 {
        0x626E_6365 // "bnce"
    }

    fn idle(&self) {}
}
