//! Shared fixtures for the integration suite.

#![allow(dead_code)]

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Write a 16-bit sine wave file with the same sample on every channel.
pub fn write_sine_wav(path: &Path, frames: usize, sample_rate: u32, channels: u16) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for frame in 0..frames {
        let phase = frame as f64 * std::f64::consts::TAU * 440.0 / f64::from(sample_rate);
        let sample = (phase.sin() * 12000.0) as i16;
        for _ in 0..channels {
            writer.write_sample(sample).unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// All samples of a WAV file, interleaved, as i16.
pub fn read_wav_i16(path: &Path) -> Vec<i16> {
    let mut reader = hound::WavReader::open(path).unwrap();
    reader.samples::<i16>().map(|s| s.unwrap()).collect()
}

fn push_varlen(out: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 4];
    let mut count = 0;
    loop {
        bytes[count] = (value & 0x7F) as u8;
        value >>= 7;
        count += 1;
        if value == 0 {
            break;
        }
    }
    for index in (0..count).rev() {
        let mut byte = bytes[index];
        if index > 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }
}

/// Write a minimal type-0 MIDI file at 480 ticks per beat, 120 BPM, from
/// `(delta_ticks, message bytes)` pairs.
pub fn write_midi_file(path: &Path, events: &[(u32, [u8; 3])]) {
    let mut track = Vec::new();
    track.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]); // tempo 500000
    for (delta, bytes) in events {
        push_varlen(&mut track, *delta);
        track.extend_from_slice(bytes);
    }
    track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut data = Vec::new();
    data.extend_from_slice(b"MThd");
    data.extend_from_slice(&6u32.to_be_bytes());
    data.extend_from_slice(&0u16.to_be_bytes());
    data.extend_from_slice(&1u16.to_be_bytes());
    data.extend_from_slice(&480u16.to_be_bytes());
    data.extend_from_slice(b"MTrk");
    data.extend_from_slice(&(track.len() as u32).to_be_bytes());
    data.extend_from_slice(&track);

    std::fs::write(path, data).unwrap();
}
