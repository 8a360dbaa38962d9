//! The ordered plugin chain and its drive loop.

use crate::error::{PluginError, Result};
use crate::plugin::{open_by_name, Plugin, PluginCategory, PluginSpec};
use bounce_core::{AudioSettings, SampleBuffer, TaskTimer};
use bounce_midi::MidiEvent;
use tracing::debug;

/// An ordered, finite sequence of plugins driven left to right.
///
/// Audio flows `input -> plugin 0 -> ... -> plugin N-1 -> output` through an
/// alternating pair of scratch buffers, swapped by index so the hot path
/// never allocates. MIDI for a block is always delivered before the audio
/// pass for the same block.
pub struct PluginChain {
    plugins: Vec<Box<dyn Plugin>>,
    scratch_a: SampleBuffer,
    scratch_b: SampleBuffer,
}

impl PluginChain {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            scratch_a: SampleBuffer::new(0, 0),
            scratch_b: SampleBuffer::new(0, 0),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn name_of(&self, index: usize) -> &str {
        self.plugins[index].name()
    }

    pub fn head_is_instrument(&self) -> bool {
        self.plugins
            .first()
            .map(|p| p.category() == PluginCategory::Instrument)
            .unwrap_or(false)
    }

    /// Append an already-loaded plugin.
    pub fn push(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Parse a delimited plugin list (`,` or `;` outside parentheses) and
    /// append each named plugin in order. On any resolution failure the
    /// chain is left unmodified.
    pub fn add_from_argument_string(&mut self, argument: &str) -> Result<()> {
        let specs = parse_plugin_list(argument)?;
        let mut opened = Vec::with_capacity(specs.len());
        for spec in &specs {
            opened.push(open_by_name(spec)?);
        }
        for plugin in &opened {
            debug!("Added plugin '{}' to chain", plugin.name());
        }
        self.plugins.append(&mut opened);
        Ok(())
    }

    /// Initialize plugins in order 0..N-1 against the final audio settings
    /// and size the scratch buffers. Backend libraries load here, so a
    /// plugin that cannot be opened or that rejects the settings fails at
    /// its index. Once every plugin has reported its kind, an instrument
    /// anywhere but the head of the chain is rejected.
    pub fn initialize_all(&mut self, settings: &AudioSettings) -> Result<()> {
        for plugin in &mut self.plugins {
            plugin.initialize(settings)?;
        }
        for (index, plugin) in self.plugins.iter().enumerate().skip(1) {
            if plugin.category() == PluginCategory::Instrument {
                return Err(PluginError::InvalidChain(format!(
                    "instrument '{}' must be the first plugin (found at position {})",
                    plugin.name(),
                    index
                )));
            }
        }
        self.scratch_a = SampleBuffer::new(settings.channels, settings.blocksize);
        self.scratch_b = SampleBuffer::new(settings.channels, settings.blocksize);
        Ok(())
    }

    /// Drive one block through every plugin in index order, timing each.
    ///
    /// The first plugin reads `input`; the last writes `output`; a single
    /// plugin connects the two directly. The caller restarts its own timer
    /// slot afterwards.
    pub fn process_audio(
        &mut self,
        input: &SampleBuffer,
        output: &mut SampleBuffer,
        timer: &mut TaskTimer,
    ) {
        let count = self.plugins.len();
        debug_assert!(count > 0, "chain must be non-empty before the loop");

        if count == 1 {
            timer.start(0);
            self.plugins[0].process_audio(input, output);
            return;
        }

        timer.start(0);
        self.plugins[0].process_audio(input, &mut self.scratch_a);
        for index in 1..count - 1 {
            timer.start(index);
            self.plugins[index].process_audio(&self.scratch_a, &mut self.scratch_b);
            std::mem::swap(&mut self.scratch_a, &mut self.scratch_b);
        }
        timer.start(count - 1);
        self.plugins[count - 1].process_audio(&self.scratch_a, output);
    }

    /// Deliver this block's events to every plugin that accepts MIDI, in
    /// chain order.
    pub fn process_midi_events(&mut self, events: &[MidiEvent], timer: &mut TaskTimer) {
        if events.is_empty() {
            return;
        }
        for (index, plugin) in self.plugins.iter_mut().enumerate() {
            if plugin.accepts_midi() {
                timer.start(index);
                plugin.process_midi_events(events);
            }
        }
    }

    pub fn display_info(&mut self) {
        for plugin in &mut self.plugins {
            plugin.display_info();
        }
    }

    /// Close every plugin, in chain order. Idempotent.
    pub fn close_all(&mut self) {
        for plugin in &mut self.plugins {
            plugin.close();
        }
    }
}

impl Default for PluginChain {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_plugin_list(argument: &str) -> Result<Vec<PluginSpec>> {
    let mut specs = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (at, c) in argument.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' | ';' if depth == 0 => {
                specs.push(parse_spec(&argument[start..at])?);
                start = at + 1;
            }
            _ => {}
        }
    }
    specs.push(parse_spec(&argument[start..])?);
    Ok(specs)
}

fn parse_spec(item: &str) -> Result<PluginSpec> {
    let item = item.trim();
    if item.is_empty() {
        return Err(PluginError::InvalidChain(
            "empty plugin name in list".to_string(),
        ));
    }

    let Some(open) = item.find('(') else {
        return Ok(PluginSpec {
            name: item.to_string(),
            params: Vec::new(),
        });
    };
    if !item.ends_with(')') {
        return Err(PluginError::InvalidChain(format!(
            "unbalanced parentheses in '{}'",
            item
        )));
    }

    let name = item[..open].trim();
    if name.is_empty() {
        return Err(PluginError::InvalidChain(format!(
            "missing plugin name in '{}'",
            item
        )));
    }

    let mut params = Vec::new();
    for pair in item[open + 1..item.len() - 1]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| PluginError::InvalidParameter(pair.to_string()))?;
        let value: f32 = value
            .trim()
            .parse()
            .map_err(|_| PluginError::InvalidParameter(pair.to_string()))?;
        params.push((key.trim().to_string(), value));
    }

    Ok(PluginSpec {
        name: name.to_string(),
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AudioSettings {
        AudioSettings {
            blocksize: 64,
            ..Default::default()
        }
    }

    fn constant_input(value: f32) -> SampleBuffer {
        let mut buf = SampleBuffer::new(2, 64);
        for channel in 0..2 {
            buf.channel_mut(channel).fill(value);
        }
        buf
    }

    #[test]
    fn test_parse_plugin_list() {
        let specs = parse_plugin_list("passthrough,again(gain=0.5);sinesynth").unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].name, "passthrough");
        assert_eq!(specs[1].name, "again");
        assert_eq!(specs[1].params, vec![("gain".to_string(), 0.5)]);
        assert_eq!(specs[2].name, "sinesynth");
    }

    #[test]
    fn test_parse_rejects_bad_parameter() {
        assert!(matches!(
            parse_plugin_list("again(gain=loud)"),
            Err(PluginError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_plugin_list("again(gain)"),
            Err(PluginError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_name() {
        assert!(parse_plugin_list("passthrough,,again").is_err());
        assert!(parse_plugin_list("(gain=1.0)").is_err());
    }

    #[test]
    fn test_unresolved_plugin_leaves_chain_unmodified() {
        let mut chain = PluginChain::new();
        assert!(chain
            .add_from_argument_string("passthrough,missing-plugin")
            .is_err());
        assert!(chain.is_empty());
    }

    #[test]
    fn test_single_plugin_connects_input_to_output() {
        let mut chain = PluginChain::new();
        chain.add_from_argument_string("again(gain=0.5)").unwrap();
        chain.initialize_all(&settings()).unwrap();

        let input = constant_input(0.8);
        let mut output = SampleBuffer::new(2, 64);
        let mut timer = TaskTimer::new(chain.len() + 1);
        chain.process_audio(&input, &mut output, &mut timer);

        assert!(output.channel(0).iter().all(|&s| (s - 0.4).abs() < 1e-6));
    }

    #[test]
    fn test_chain_order_composes_gains() {
        let mut chain = PluginChain::new();
        chain
            .add_from_argument_string("again(gain=0.5),passthrough,again(gain=0.5)")
            .unwrap();
        chain.initialize_all(&settings()).unwrap();

        let input = constant_input(1.0);
        let mut output = SampleBuffer::new(2, 64);
        let mut timer = TaskTimer::new(chain.len() + 1);
        chain.process_audio(&input, &mut output, &mut timer);

        assert!(output.channel(0).iter().all(|&s| (s - 0.25).abs() < 1e-6));
        assert!(output.channel(1).iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_instrument_must_be_head() {
        let mut chain = PluginChain::new();
        chain
            .add_from_argument_string("passthrough,sinesynth")
            .unwrap();
        assert!(matches!(
            chain.initialize_all(&settings()),
            Err(PluginError::InvalidChain(_))
        ));
    }

    #[test]
    fn test_instrument_head_is_valid() {
        let mut chain = PluginChain::new();
        chain
            .add_from_argument_string("sinesynth,again(gain=0.5)")
            .unwrap();
        assert!(chain.initialize_all(&settings()).is_ok());
        assert!(chain.head_is_instrument());
    }

    #[test]
    fn test_midi_goes_to_accepting_plugins_only() {
        let mut chain = PluginChain::new();
        chain
            .add_from_argument_string("sinesynth,passthrough")
            .unwrap();
        chain.initialize_all(&settings()).unwrap();

        let events = [MidiEvent::note_on(0, 0, 60, 100)];
        let mut timer = TaskTimer::new(chain.len() + 1);
        chain.process_midi_events(&events, &mut timer);

        // The instrument received the note: the next audio pass rings.
        let input = constant_input(0.0);
        let mut output = SampleBuffer::new(2, 64);
        chain.process_audio(&input, &mut output, &mut timer);
        let energy: f32 = output.channel(0).iter().map(|s| s * s).sum();
        assert!(energy > 0.0);
    }
}
