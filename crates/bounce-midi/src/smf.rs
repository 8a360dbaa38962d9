//! Standard MIDI File (SMF) loading via `midly`.
//!
//! Events from every track are flattened onto one timeline, assigned
//! absolute sample positions through the file's tempo map, and handed back
//! as a [`MidiSequence`]. Streaming MIDI input is explicitly unsupported:
//! the whole file is read up front.

use crate::error::{MidiError, Result};
use crate::{MidiEvent, MidiSequence};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_US_PER_QN: u32 = 500_000; // 120 BPM

/// A MIDI file on disk, opened for one-shot event loading.
#[derive(Debug)]
pub struct MidiFileSource {
    path: PathBuf,
    data: Vec<u8>,
}

impl MidiFileSource {
    /// Open the file and read its raw bytes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = std::fs::read(&path)?;
        Ok(Self { path, data })
    }

    pub fn name(&self) -> String {
        self.path.display().to_string()
    }

    /// Parse every event in the file into a sequence, with timestamps
    /// converted to absolute sample positions at `sample_rate`.
    pub fn read_all_events(&self, sample_rate: f64) -> Result<MidiSequence> {
        let smf = Smf::parse(&self.data)?;

        let ppq = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(_, _) => return Err(MidiError::UnsupportedTiming),
        };

        debug!(
            "Parsing MIDI file '{}': {} tracks, {} ticks per beat",
            self.path.display(),
            smf.tracks.len(),
            ppq
        );

        // First pass: collect tempo changes and channel messages, each with
        // its absolute tick. Track order is file order, which from_events
        // preserves for simultaneous events.
        let mut tempo_changes: Vec<(u64, u32)> = Vec::new();
        let mut raw_events: Vec<(u64, u8, u8, u8)> = Vec::new();

        for track in smf.tracks.iter() {
            let mut tick = 0u64;
            for event in track.iter() {
                tick += u64::from(event.delta.as_int());
                match &event.kind {
                    TrackEventKind::Midi { channel, message } => {
                        if let Some((status, data1, data2)) =
                            encode_message(channel.as_int(), message)
                        {
                            raw_events.push((tick, status, data1, data2));
                        }
                    }
                    TrackEventKind::Meta(MetaMessage::Tempo(us_per_qn)) => {
                        tempo_changes.push((tick, us_per_qn.as_int()));
                    }
                    TrackEventKind::Meta(MetaMessage::EndOfTrack) => {}
                    TrackEventKind::Meta(_) => {
                        debug!("Skipping meta event at tick {}", tick);
                    }
                    TrackEventKind::SysEx(_) | TrackEventKind::Escape(_) => {
                        debug!("Skipping sysex event at tick {}", tick);
                    }
                }
            }
        }

        tempo_changes.sort_by_key(|&(tick, _)| tick);
        let tempo_map = TempoMap::new(ppq, tempo_changes);

        let events: Vec<MidiEvent> = raw_events
            .into_iter()
            .map(|(tick, status, data1, data2)| {
                MidiEvent::new(
                    tempo_map.tick_to_sample(tick, sample_rate),
                    status,
                    data1,
                    data2,
                )
            })
            .collect();

        debug!(
            "Parsed {} MIDI events from '{}'",
            events.len(),
            self.path.display()
        );

        Ok(MidiSequence::from_events(events))
    }
}

fn encode_message(channel: u8, message: &MidiMessage) -> Option<(u8, u8, u8)> {
    match *message {
        MidiMessage::NoteOff { key, vel } => Some((0x80 | channel, key.as_int(), vel.as_int())),
        MidiMessage::NoteOn { key, vel } => Some((0x90 | channel, key.as_int(), vel.as_int())),
        MidiMessage::Aftertouch { key, vel } => Some((0xA0 | channel, key.as_int(), vel.as_int())),
        MidiMessage::Controller { controller, value } => {
            Some((0xB0 | channel, controller.as_int(), value.as_int()))
        }
        MidiMessage::ProgramChange { program } => Some((0xC0 | channel, program.as_int(), 0)),
        MidiMessage::ChannelAftertouch { vel } => Some((0xD0 | channel, vel.as_int(), 0)),
        MidiMessage::PitchBend { bend } => {
            let raw = (i32::from(bend.as_int()) + 0x2000) as u16;
            Some((0xE0 | channel, (raw & 0x7F) as u8, (raw >> 7) as u8))
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TempoSegment {
    tick: u64,
    us_per_qn: u32,
    cumulative_us: f64,
}

/// Piecewise tick-to-time conversion built from a file's Set Tempo events.
///
/// 120 BPM applies before the first tempo event, per the SMF default.
#[derive(Debug, Clone)]
pub struct TempoMap {
    ppq: u16,
    segments: Vec<TempoSegment>,
}

impl TempoMap {
    /// `changes` must be sorted by tick; equal ticks keep the later entry.
    pub fn new(ppq: u16, changes: Vec<(u64, u32)>) -> Self {
        let mut segments = Vec::with_capacity(changes.len() + 1);
        segments.push(TempoSegment {
            tick: 0,
            us_per_qn: DEFAULT_US_PER_QN,
            cumulative_us: 0.0,
        });

        let mut prev_tick = 0u64;
        let mut prev_us_per_qn = DEFAULT_US_PER_QN;
        let mut elapsed_us = 0.0f64;
        for (tick, us_per_qn) in changes {
            elapsed_us += (tick - prev_tick) as f64 * f64::from(prev_us_per_qn) / f64::from(ppq);
            segments.push(TempoSegment {
                tick,
                us_per_qn,
                cumulative_us: elapsed_us,
            });
            prev_tick = tick;
            prev_us_per_qn = us_per_qn;
        }

        Self { ppq, segments }
    }

    /// Absolute sample position of `tick` at the given sample rate.
    pub fn tick_to_sample(&self, tick: u64, sample_rate: f64) -> u64 {
        // The sentinel segment at tick 0 guarantees a match.
        let index = self.segments.partition_point(|s| s.tick <= tick) - 1;
        let segment = &self.segments[index];
        let us = segment.cumulative_us
            + (tick - segment.tick) as f64 * f64::from(segment.us_per_qn) / f64::from(self.ppq);
        (us * sample_rate / 1_000_000.0).round() as u64
    }
}
