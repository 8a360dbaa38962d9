//! Host built-in plugins.
//!
//! These exist so chains can be assembled and exercised without any dynamic
//! libraries on disk: a pass-through, a flat gain, and a small sine
//! instrument for MIDI-driven runs.

use crate::error::Result;
use crate::plugin::{Plugin, PluginCategory, PluginSpec, PluginType};
use bounce_core::{AudioSettings, SampleBuffer};
use bounce_midi::{MidiEvent, MidiEventList};
use tracing::{info, warn};

/// Instantiate a built-in by name, or `None` if the name is not ours.
pub(crate) fn create(spec: &PluginSpec) -> Result<Option<Box<dyn Plugin>>> {
    let plugin: Box<dyn Plugin> = match spec.name.as_str() {
        "passthrough" => {
            reject_params(spec);
            Box::new(Passthrough::new())
        }
        "again" => Box::new(Again::new(&spec.params)),
        "sinesynth" => Box::new(SineSynth::new(&spec.params)),
        _ => return Ok(None),
    };
    Ok(Some(plugin))
}

fn reject_params(spec: &PluginSpec) {
    for (key, _) in &spec.params {
        warn!("Plugin '{}' has no parameter '{}'", spec.name, key);
    }
}

fn param(params: &[(String, f32)], name: &str, plugin: &str, default: f32) -> f32 {
    let mut value = default;
    for (key, v) in params {
        if key == name {
            value = *v;
        } else {
            warn!("Plugin '{}' has no parameter '{}'", plugin, key);
        }
    }
    value
}

/// Copies input to output unchanged.
pub struct Passthrough;

impl Passthrough {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Passthrough {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for Passthrough {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn plugin_type(&self) -> PluginType {
        PluginType::Internal
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Effect
    }

    fn accepts_midi(&self) -> bool {
        false
    }

    fn initialize(&mut self, _settings: &AudioSettings) -> Result<()> {
        Ok(())
    }

    fn process_audio(&mut self, input: &SampleBuffer, output: &mut SampleBuffer) {
        output.copy_from(input);
    }

    fn process_midi_events(&mut self, _events: &[MidiEvent]) {}

    fn display_info(&mut self) {
        info!("Plugin 'passthrough' (internal effect): copies input to output");
    }

    fn close(&mut self) {}
}

/// Flat gain: `again(gain=0.5)`.
pub struct Again {
    gain: f32,
}

impl Again {
    pub fn new(params: &[(String, f32)]) -> Self {
        Self {
            gain: param(params, "gain", "again", 1.0),
        }
    }
}

impl Plugin for Again {
    fn name(&self) -> &str {
        "again"
    }

    fn plugin_type(&self) -> PluginType {
        PluginType::Internal
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Effect
    }

    fn accepts_midi(&self) -> bool {
        false
    }

    fn initialize(&mut self, _settings: &AudioSettings) -> Result<()> {
        Ok(())
    }

    fn process_audio(&mut self, input: &SampleBuffer, output: &mut SampleBuffer) {
        for channel in 0..output.num_channels() {
            let src = input.channel(channel);
            for (out, sample) in output.channel_mut(channel).iter_mut().zip(src) {
                *out = sample * self.gain;
            }
        }
    }

    fn process_midi_events(&mut self, _events: &[MidiEvent]) {}

    fn display_info(&mut self) {
        info!("Plugin 'again' (internal effect)");
        info!("  gain = {}", self.gain);
    }

    fn close(&mut self) {}
}

// Voices fade out over this many samples after note-off.
const RELEASE_SAMPLES: f32 = 256.0;

struct Voice {
    note: u8,
    phase: f64,
    step: f64,
    amplitude: f32,
    releasing: bool,
    envelope: f32,
}

/// Polyphonic sine instrument: `sinesynth(amplitude=0.25)`.
///
/// NoteOn/NoteOff take effect at their `delta_frames` offset within the
/// block, so rendered onsets are sample-accurate.
pub struct SineSynth {
    sample_rate: f64,
    amplitude: f32,
    voices: Vec<Voice>,
    pending: MidiEventList,
}

impl SineSynth {
    pub fn new(params: &[(String, f32)]) -> Self {
        Self {
            sample_rate: 44100.0,
            amplitude: param(params, "amplitude", "sinesynth", 0.25),
            voices: Vec::new(),
            pending: MidiEventList::new(),
        }
    }

    fn apply_event(&mut self, event: &MidiEvent) {
        if event.is_note_on() {
            let frequency = 440.0 * (2.0f64).powf((f64::from(event.data1) - 69.0) / 12.0);
            self.voices.push(Voice {
                note: event.data1,
                phase: 0.0,
                step: std::f64::consts::TAU * frequency / self.sample_rate,
                amplitude: self.amplitude * f32::from(event.data2) / 127.0,
                releasing: false,
                envelope: 1.0,
            });
        } else if event.is_note_off() {
            for voice in &mut self.voices {
                if voice.note == event.data1 {
                    voice.releasing = true;
                }
            }
        }
    }
}

impl Plugin for SineSynth {
    fn name(&self) -> &str {
        "sinesynth"
    }

    fn plugin_type(&self) -> PluginType {
        PluginType::Internal
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Instrument
    }

    fn accepts_midi(&self) -> bool {
        true
    }

    fn initialize(&mut self, settings: &AudioSettings) -> Result<()> {
        self.sample_rate = settings.sample_rate;
        self.voices.clear();
        Ok(())
    }

    fn process_audio(&mut self, _input: &SampleBuffer, output: &mut SampleBuffer) {
        output.clear();
        let events = std::mem::take(&mut self.pending);
        let mut next_event = 0;

        for frame in 0..output.blocksize() {
            while next_event < events.len() && events[next_event].delta_frames as usize <= frame {
                let event = events[next_event];
                self.apply_event(&event);
                next_event += 1;
            }

            let mut mixed = 0.0f32;
            for voice in &mut self.voices {
                mixed += voice.phase.sin() as f32 * voice.amplitude * voice.envelope;
                voice.phase += voice.step;
                if voice.releasing {
                    voice.envelope -= 1.0 / RELEASE_SAMPLES;
                }
            }
            self.voices.retain(|v| !v.releasing || v.envelope > 0.0);

            for channel in 0..output.num_channels() {
                output.channel_mut(channel)[frame] = mixed;
            }
        }
    }

    fn process_midi_events(&mut self, events: &[MidiEvent]) {
        self.pending.extend_from_slice(events);
    }

    fn display_info(&mut self) {
        info!("Plugin 'sinesynth' (internal instrument)");
        info!("  amplitude = {}", self.amplitude);
    }

    fn close(&mut self) {
        self.voices.clear();
    }
}
