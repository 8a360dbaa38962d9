//! MIDI delivery invariants, observed through a recording plugin driven by
//! the real engine loop.

use bounce::{
    silence_source, AudioSettings, Engine, MidiEvent, MidiSequence, Plugin, PluginCategory,
    PluginChain, PluginType, SampleBuffer,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct DeliveryLog {
    events: Vec<MidiEvent>,
    per_block: Vec<usize>,
}

struct RecordingPlugin {
    log: Rc<RefCell<DeliveryLog>>,
}

impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        "recorder"
    }

    fn plugin_type(&self) -> PluginType {
        PluginType::Internal
    }

    fn category(&self) -> PluginCategory {
        PluginCategory::Effect
    }

    fn accepts_midi(&self) -> bool {
        true
    }

    fn initialize(&mut self, _settings: &AudioSettings) -> Result<(), bounce::PluginError> {
        Ok(())
    }

    fn process_audio(&mut self, input: &SampleBuffer, output: &mut SampleBuffer) {
        output.copy_from(input);
    }

    fn process_midi_events(&mut self, events: &[MidiEvent]) {
        let mut log = self.log.borrow_mut();
        log.per_block.push(events.len());
        log.events.extend_from_slice(events);
    }

    fn display_info(&mut self) {}

    fn close(&mut self) {}
}

#[test]
fn test_delivered_events_match_source_ranges() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.wav");

    let settings = AudioSettings::default();
    let sequence = MidiSequence::from_events(vec![
        MidiEvent::note_on(0, 0, 60, 100),
        MidiEvent::note_on(100, 0, 64, 100),
        MidiEvent::note_off(600, 0, 60, 0),
        MidiEvent::note_off(1300, 0, 64, 0),
    ]);

    let log = Rc::new(RefCell::new(DeliveryLog::default()));
    let mut chain = PluginChain::new();
    chain.push(Box::new(RecordingPlugin {
        log: Rc::clone(&log),
    }));
    chain.initialize_all(&settings).unwrap();

    let out_source =
        bounce::open_sample_source(&output, bounce::Direction::Write, &settings).unwrap();
    let engine = Engine::new(settings, chain, silence_source(), out_source, Some(sequence))
        .unwrap();
    let stats = engine.run().unwrap();

    // Last event sits in block 2, so the loop runs three blocks.
    assert_eq!(stats.final_sample, 3 * 512);

    let log = log.borrow();
    // Every sourced event arrived exactly once, in timeline order.
    assert_eq!(log.events.len(), 4);
    assert_eq!(log.per_block, vec![2, 1, 1]);
    let timestamps: Vec<u64> = log.events.iter().map(|e| e.timestamp).collect();
    assert_eq!(timestamps, vec![0, 100, 600, 1300]);

    // Delta frames always land inside the block.
    for event in &log.events {
        assert!((event.delta_frames as usize) < 512);
        assert_eq!(u64::from(event.delta_frames), event.timestamp % 512);
    }
}
