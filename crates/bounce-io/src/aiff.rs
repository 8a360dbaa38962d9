//! Minimal AIFF sample sources (16-bit big-endian PCM).
//!
//! Enough of the FORM/COMM/SSND structure to round-trip uncompressed audio;
//! compressed AIFF-C variants are rejected at open.

use crate::error::{IoError, Result};
use crate::source::{SampleSource, SourceState, SourceType};
use bounce_core::{AudioSettings, SampleBuffer};
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::warn;

// Byte offsets of the length fields patched when a writer closes.
const FORM_SIZE_OFFSET: u64 = 4;
const NUM_FRAMES_OFFSET: u64 = 22;
const SSND_SIZE_OFFSET: u64 = 42;
const HEADER_LEN: u32 = 54;

/// Encode a sample rate as an 80-bit IEEE 754 extended float, the COMM
/// chunk's representation.
fn encode_sample_rate(rate: f64) -> [u8; 10] {
    let value = rate.round() as u32;
    let mut bytes = [0u8; 10];
    if value == 0 {
        return bytes;
    }
    let shift = value.leading_zeros();
    let exponent = 16383 + 31 - shift as u16;
    let mantissa = u64::from(value) << (32 + shift);
    bytes[0..2].copy_from_slice(&exponent.to_be_bytes());
    bytes[2..10].copy_from_slice(&mantissa.to_be_bytes());
    bytes
}

fn decode_sample_rate(bytes: &[u8; 10]) -> f64 {
    let exponent = i32::from(u16::from_be_bytes([bytes[0], bytes[1]]) & 0x7FFF);
    let mut mantissa_bytes = [0u8; 8];
    mantissa_bytes.copy_from_slice(&bytes[2..10]);
    let mantissa = u64::from_be_bytes(mantissa_bytes);
    if mantissa == 0 {
        return 0.0;
    }
    mantissa as f64 * (2.0f64).powi(exponent - 16383 - 63)
}

struct AiffInfo {
    channels: usize,
    sample_rate: f64,
    bits: u16,
    sound_data: Vec<u8>,
}

fn unsupported(path: &Path, reason: impl Into<String>) -> IoError {
    IoError::UnsupportedFormat {
        path: path.into(),
        reason: reason.into(),
    }
}

fn parse_aiff(path: &Path, bytes: &[u8]) -> Result<AiffInfo> {
    if bytes.len() < 12 || &bytes[0..4] != b"FORM" || &bytes[8..12] != b"AIFF" {
        return Err(unsupported(path, "not an AIFF file"));
    }

    let mut comm: Option<(usize, u64, u16, f64)> = None;
    let mut sound_data: Option<Vec<u8>> = None;

    let mut offset = 12usize;
    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let size = u32::from_be_bytes([
            bytes[offset + 4],
            bytes[offset + 5],
            bytes[offset + 6],
            bytes[offset + 7],
        ]) as usize;
        let body = offset + 8;
        if body + size > bytes.len() {
            return Err(unsupported(path, "truncated chunk"));
        }
        match id {
            b"COMM" => {
                if size < 18 {
                    return Err(unsupported(path, "short COMM chunk"));
                }
                let channels = u16::from_be_bytes([bytes[body], bytes[body + 1]]) as usize;
                let num_frames = u32::from_be_bytes([
                    bytes[body + 2],
                    bytes[body + 3],
                    bytes[body + 4],
                    bytes[body + 5],
                ]) as u64;
                let bits = u16::from_be_bytes([bytes[body + 6], bytes[body + 7]]);
                let mut rate_bytes = [0u8; 10];
                rate_bytes.copy_from_slice(&bytes[body + 8..body + 18]);
                comm = Some((channels, num_frames, bits, decode_sample_rate(&rate_bytes)));
            }
            b"SSND" => {
                if size < 8 {
                    return Err(unsupported(path, "short SSND chunk"));
                }
                let data_offset = u32::from_be_bytes([
                    bytes[body],
                    bytes[body + 1],
                    bytes[body + 2],
                    bytes[body + 3],
                ]) as usize;
                if 8 + data_offset > size {
                    return Err(unsupported(path, "SSND offset past chunk end"));
                }
                sound_data = Some(bytes[body + 8 + data_offset..body + size].to_vec());
            }
            _ => {}
        }
        // Chunks are padded to an even length.
        offset = body + size + (size & 1);
    }

    let (channels, num_frames, bits, sample_rate) =
        comm.ok_or_else(|| unsupported(path, "missing COMM chunk"))?;
    let mut sound_data = sound_data.ok_or_else(|| unsupported(path, "missing SSND chunk"))?;
    if bits != 16 {
        return Err(unsupported(path, format!("{} bits per sample", bits)));
    }
    if channels == 0 {
        return Err(unsupported(path, "zero channels"));
    }
    sound_data.truncate(num_frames as usize * channels * 2);

    Ok(AiffInfo {
        channels,
        sample_rate,
        bits,
        sound_data,
    })
}

pub(crate) struct AiffReadSource {
    name: String,
    channels: usize,
    sound_data: Vec<u8>,
    cursor: usize,
    frames_processed: u64,
    state: SourceState,
}

impl AiffReadSource {
    pub(crate) fn open(path: &Path, settings: &AudioSettings) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let info = parse_aiff(path, &bytes)?;

        if info.channels != settings.channels {
            return Err(IoError::ChannelMismatch {
                path: path.into(),
                found: info.channels,
                expected: settings.channels,
            });
        }
        if info.sample_rate != settings.sample_rate {
            warn!(
                "'{}' has sample rate {} but the engine runs at {}; no resampling is applied",
                path.display(),
                info.sample_rate,
                settings.sample_rate
            );
        }
        debug_assert_eq!(info.bits, 16);

        Ok(Self {
            name: path.display().to_string(),
            channels: info.channels,
            sound_data: info.sound_data,
            cursor: 0,
            frames_processed: 0,
            state: SourceState::Open,
        })
    }
}

impl SampleSource for AiffReadSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SourceType {
        SourceType::Aiff
    }

    fn state(&self) -> SourceState {
        self.state
    }

    fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    fn read_block(&mut self, buf: &mut SampleBuffer) -> Result<bool> {
        buf.clear();
        let frame_bytes = self.channels * 2;
        let frames_left = (self.sound_data.len() - self.cursor) / frame_bytes;
        let frames = frames_left.min(buf.blocksize());
        for frame in 0..frames {
            for channel in 0..self.channels {
                let at = self.cursor + frame * frame_bytes + channel * 2;
                let sample = i16::from_be_bytes([self.sound_data[at], self.sound_data[at + 1]]);
                buf.channel_mut(channel)[frame] = f32::from(sample) / 32768.0;
            }
        }
        self.cursor += frames * frame_bytes;
        self.frames_processed += frames as u64;
        Ok(frames == buf.blocksize())
    }

    fn close(&mut self) -> Result<()> {
        self.state = SourceState::Closed;
        Ok(())
    }
}

pub(crate) struct AiffWriteSource {
    name: String,
    writer: Option<BufWriter<File>>,
    channels: usize,
    frames_processed: u64,
    state: SourceState,
}

impl AiffWriteSource {
    pub(crate) fn create(path: &Path, settings: &AudioSettings) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        // Header with placeholder lengths, patched on close.
        writer.write_all(b"FORM")?;
        writer.write_all(&0u32.to_be_bytes())?;
        writer.write_all(b"AIFF")?;
        writer.write_all(b"COMM")?;
        writer.write_all(&18u32.to_be_bytes())?;
        writer.write_all(&(settings.channels as u16).to_be_bytes())?;
        writer.write_all(&0u32.to_be_bytes())?; // num frames
        writer.write_all(&16u16.to_be_bytes())?;
        writer.write_all(&encode_sample_rate(settings.sample_rate))?;
        writer.write_all(b"SSND")?;
        writer.write_all(&8u32.to_be_bytes())?; // chunk size
        writer.write_all(&0u32.to_be_bytes())?; // data offset
        writer.write_all(&0u32.to_be_bytes())?; // block align

        Ok(Self {
            name: path.display().to_string(),
            writer: Some(writer),
            channels: settings.channels,
            frames_processed: 0,
            state: SourceState::Open,
        })
    }
}

impl SampleSource for AiffWriteSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SourceType {
        SourceType::Aiff
    }

    fn state(&self) -> SourceState {
        self.state
    }

    fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    fn write_block(&mut self, buf: &SampleBuffer) -> Result<()> {
        let writer = match self.writer.as_mut() {
            Some(writer) => writer,
            None => return Err(IoError::Closed(self.name.clone())),
        };
        for frame in 0..buf.blocksize() {
            for channel in 0..self.channels {
                let sample = (buf.channel(channel)[frame] * 32768.0)
                    .round()
                    .clamp(-32768.0, 32767.0) as i16;
                if let Err(e) = writer.write_all(&sample.to_be_bytes()) {
                    self.state = SourceState::Failed;
                    return Err(e.into());
                }
            }
        }
        self.frames_processed += buf.blocksize() as u64;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            let data_len = self.frames_processed as u32 * self.channels as u32 * 2;
            writer.seek(SeekFrom::Start(FORM_SIZE_OFFSET))?;
            writer.write_all(&(HEADER_LEN - 8 + data_len).to_be_bytes())?;
            writer.seek(SeekFrom::Start(NUM_FRAMES_OFFSET))?;
            writer.write_all(&(self.frames_processed as u32).to_be_bytes())?;
            writer.seek(SeekFrom::Start(SSND_SIZE_OFFSET))?;
            writer.write_all(&(8 + data_len).to_be_bytes())?;
            writer.flush()?;
            self.state = SourceState::Closed;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate_codec_round_trip() {
        for rate in [8000.0, 22050.0, 44100.0, 48000.0, 96000.0] {
            let encoded = encode_sample_rate(rate);
            assert_eq!(decode_sample_rate(&encoded), rate);
        }
    }

    #[test]
    fn test_44100_extended_encoding() {
        // Canonical bytes: exponent 0x400E, mantissa AC 44 00 ...
        let bytes = encode_sample_rate(44100.0);
        assert_eq!(&bytes[0..4], &[0x40, 0x0E, 0xAC, 0x44]);
    }

    #[test]
    fn test_aiff_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.aiff");
        let settings = AudioSettings {
            blocksize: 256,
            ..Default::default()
        };

        let mut writer = AiffWriteSource::create(&path, &settings).unwrap();
        let mut block = SampleBuffer::new(2, 256);
        for frame in 0..256 {
            block.channel_mut(0)[frame] = (frame as f32 - 128.0) / 256.0;
            block.channel_mut(1)[frame] = 0.5;
        }
        writer.write_block(&block).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();

        let mut reader = AiffReadSource::open(&path, &settings).unwrap();
        let mut out = SampleBuffer::new(2, 256);
        assert!(reader.read_block(&mut out).unwrap());
        for frame in 0..256 {
            assert!((out.channel(0)[frame] - block.channel(0)[frame]).abs() < 1.0 / 32768.0);
        }

        // Next read finds nothing: end-of-stream with a zeroed block.
        assert!(!reader.read_block(&mut out).unwrap());
        assert!(out.channel(0).iter().all(|&s| s == 0.0));
        assert_eq!(reader.frames_processed(), 256);
    }

    #[test]
    fn test_open_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.aiff");
        std::fs::write(&path, b"not an aiff file at all").unwrap();
        let settings = AudioSettings::default();
        assert!(matches!(
            AiffReadSource::open(&path, &settings),
            Err(IoError::UnsupportedFormat { .. })
        ));
    }
}
