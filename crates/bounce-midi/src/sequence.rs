//! Immutable event timeline with block-range slicing.

use crate::{MidiEvent, MidiEventList};

/// An ordered MIDI timeline, sorted by timestamp ascending.
///
/// The sequence is fully materialized before the processing loop starts and
/// never changes afterwards. Simultaneous events keep their original file
/// order (the sort is stable).
#[derive(Debug, Clone, Default)]
pub struct MidiSequence {
    events: Vec<MidiEvent>,
}

impl MidiSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from events in file order.
    pub fn from_events(mut events: Vec<MidiEvent>) -> Self {
        events.sort_by_key(|e| e.timestamp);
        Self { events }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[MidiEvent] {
        &self.events
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.events.last().map(|e| e.timestamp)
    }

    /// Append to `out` every event with `timestamp` in
    /// `[start_sample, start_sample + blocksize)`, rewriting `delta_frames`
    /// to the offset within the block.
    ///
    /// Returns `true` while more events remain at or after the end of the
    /// range; `false` signals end-of-sequence, which the engine uses to
    /// finish the loop on the current block.
    pub fn fill_range(&self, start_sample: u64, blocksize: usize, out: &mut MidiEventList) -> bool {
        let end = start_sample + blocksize as u64;
        let mut index = self.events.partition_point(|e| e.timestamp < start_sample);
        while index < self.events.len() && self.events[index].timestamp < end {
            let mut event = self.events[index];
            event.delta_frames = (event.timestamp - start_sample) as u32;
            out.push(event);
            index += 1;
        }
        index < self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::SmallVec;

    fn sequence() -> MidiSequence {
        MidiSequence::from_events(vec![
            MidiEvent::note_on(0, 0, 60, 100),
            MidiEvent::note_on(100, 0, 64, 100),
            MidiEvent::note_off(600, 0, 60, 0),
            MidiEvent::note_off(1300, 0, 64, 0),
        ])
    }

    #[test]
    fn test_fill_range_rewrites_delta_frames() {
        let seq = sequence();
        let mut out: MidiEventList = SmallVec::new();
        let more = seq.fill_range(0, 512, &mut out);

        assert!(more);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].delta_frames, 0);
        assert_eq!(out[1].delta_frames, 100);
        assert!(out.iter().all(|e| (e.delta_frames as usize) < 512));
    }

    #[test]
    fn test_fill_range_middle_block() {
        let seq = sequence();
        let mut out: MidiEventList = SmallVec::new();
        let more = seq.fill_range(512, 512, &mut out);

        assert!(more);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].timestamp, 600);
        assert_eq!(out[0].delta_frames, 88);
    }

    #[test]
    fn test_fill_range_final_block_signals_end() {
        let seq = sequence();
        let mut out: MidiEventList = SmallVec::new();
        let more = seq.fill_range(1024, 512, &mut out);

        assert!(!more);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].delta_frames, 1300 - 1024);
    }

    #[test]
    fn test_fill_range_past_end() {
        let seq = sequence();
        let mut out: MidiEventList = SmallVec::new();
        let more = seq.fill_range(4096, 512, &mut out);

        assert!(!more);
        assert!(out.is_empty());
    }

    #[test]
    fn test_fill_range_empty_sequence() {
        let seq = MidiSequence::new();
        let mut out: MidiEventList = SmallVec::new();
        assert!(!seq.fill_range(0, 512, &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn test_event_count_per_block_matches_source() {
        let seq = sequence();
        let mut total = 0;
        let mut start = 0;
        loop {
            let mut out: MidiEventList = SmallVec::new();
            let more = seq.fill_range(start, 512, &mut out);
            total += out.len();
            start += 512;
            if !more {
                break;
            }
        }
        assert_eq!(total, seq.len());
    }

    #[test]
    fn test_simultaneous_events_keep_file_order() {
        let seq = MidiSequence::from_events(vec![
            MidiEvent::note_on(50, 0, 60, 100),
            MidiEvent::note_on(50, 0, 64, 100),
            MidiEvent::note_on(50, 0, 67, 100),
        ]);
        let mut out: MidiEventList = SmallVec::new();
        seq.fill_range(0, 512, &mut out);
        let notes: Vec<u8> = out.iter().map(|e| e.data1).collect();
        assert_eq!(notes, vec![60, 64, 67]);
    }
}
