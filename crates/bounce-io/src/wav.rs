//! WAV sample sources via `hound`.
//!
//! Reads 16/24/32-bit int and 32-bit float; writes 16-bit PCM. Conversion
//! uses the symmetric 32768 scale in both directions so a 16-bit file
//! survives a pass-through run bit-exactly.

use crate::error::{IoError, Result};
use crate::source::{SampleSource, SourceState, SourceType};
use bounce_core::{AudioSettings, SampleBuffer};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::warn;

#[inline]
fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

#[inline]
fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Pull frames deinterleaved into the block, stopping at end-of-stream.
/// Returns the number of whole frames read.
fn fill_block<I>(mut samples: I, buf: &mut SampleBuffer) -> hound::Result<usize>
where
    I: Iterator<Item = hound::Result<f32>>,
{
    let channels = buf.num_channels();
    for frame in 0..buf.blocksize() {
        for channel in 0..channels {
            match samples.next() {
                Some(sample) => buf.channel_mut(channel)[frame] = sample?,
                None => return Ok(frame),
            }
        }
    }
    Ok(buf.blocksize())
}

pub(crate) struct WavReadSource {
    name: String,
    reader: WavReader<BufReader<File>>,
    spec: WavSpec,
    frames_processed: u64,
    state: SourceState,
}

impl std::fmt::Debug for WavReadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavReadSource")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("frames_processed", &self.frames_processed)
            .field("state", &self.state)
            .finish()
    }
}

impl WavReadSource {
    pub(crate) fn open(path: &Path, settings: &AudioSettings) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        if spec.channels as usize != settings.channels {
            return Err(IoError::ChannelMismatch {
                path: path.into(),
                found: spec.channels as usize,
                expected: settings.channels,
            });
        }
        match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) | (SampleFormat::Int, 16 | 24 | 32) => {}
            (format, bits) => {
                return Err(IoError::UnsupportedFormat {
                    path: path.into(),
                    reason: format!("{:?} {} bits per sample", format, bits),
                });
            }
        }
        if f64::from(spec.sample_rate) != settings.sample_rate {
            warn!(
                "'{}' has sample rate {} but the engine runs at {}; no resampling is applied",
                path.display(),
                spec.sample_rate,
                settings.sample_rate
            );
        }

        Ok(Self {
            name: path.display().to_string(),
            reader,
            spec,
            frames_processed: 0,
            state: SourceState::Open,
        })
    }
}

impl SampleSource for WavReadSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SourceType {
        SourceType::Wav
    }

    fn state(&self) -> SourceState {
        self.state
    }

    fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    fn read_block(&mut self, buf: &mut SampleBuffer) -> Result<bool> {
        buf.clear();
        let filled = match (self.spec.sample_format, self.spec.bits_per_sample) {
            (SampleFormat::Float, _) => fill_block(self.reader.samples::<f32>(), buf),
            (SampleFormat::Int, 16) => fill_block(
                self.reader.samples::<i16>().map(|s| s.map(i16_to_f32)),
                buf,
            ),
            (SampleFormat::Int, 24) => fill_block(
                self.reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / 8_388_608.0)),
                buf,
            ),
            (SampleFormat::Int, _) => fill_block(
                self.reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / 2_147_483_648.0)),
                buf,
            ),
        };
        let frames = filled.map_err(|e| {
            self.state = SourceState::Failed;
            IoError::from(e)
        })?;
        self.frames_processed += frames as u64;
        Ok(frames == buf.blocksize())
    }

    fn close(&mut self) -> Result<()> {
        self.state = SourceState::Closed;
        Ok(())
    }
}

pub(crate) struct WavWriteSource {
    name: String,
    writer: Option<WavWriter<BufWriter<File>>>,
    frames_processed: u64,
    state: SourceState,
}

impl WavWriteSource {
    pub(crate) fn create(path: &Path, settings: &AudioSettings) -> Result<Self> {
        let spec = WavSpec {
            channels: settings.channels as u16,
            sample_rate: settings.sample_rate as u32,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec)?;
        Ok(Self {
            name: path.display().to_string(),
            writer: Some(writer),
            frames_processed: 0,
            state: SourceState::Open,
        })
    }
}

impl SampleSource for WavWriteSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SourceType {
        SourceType::Wav
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
            for channel in 0..buf.num_channels() {
                if let Err(e) = writer.write_sample(f32_to_i16(buf.channel(channel)[frame])) {
                    self.state = SourceState::Failed;
                    return Err(e.into());
                }
            }
        }
        self.frames_processed += buf.blocksize() as u64;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
            self.state = SourceState::Closed;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i16_conversion_is_symmetric() {
        for sample in [i16::MIN, -12345, -1, 0, 1, 12345, i16::MAX] {
            assert_eq!(f32_to_i16(i16_to_f32(sample)), sample);
        }
    }

    #[test]
    fn test_f32_to_i16_clips() {
        assert_eq!(f32_to_i16(1.5), i16::MAX);
        assert_eq!(f32_to_i16(-1.5), i16::MIN);
    }

    #[test]
    fn test_round_trip_and_short_final_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        let settings = AudioSettings {
            blocksize: 512,
            ..Default::default()
        };

        // 700 frames of a stereo ramp.
        let mut source = WavWriteSource::create(&path, &settings).unwrap();
        let mut block = SampleBuffer::new(2, 700);
        for frame in 0..700 {
            block.channel_mut(0)[frame] = frame as f32 / 1024.0;
            block.channel_mut(1)[frame] = -(frame as f32) / 1024.0;
        }
        source.write_block(&block).unwrap();
        source.close().unwrap();
        assert_eq!(source.frames_processed(), 700);

        let mut reader = WavReadSource::open(&path, &settings).unwrap();
        let mut buf = SampleBuffer::new(2, 512);

        // First block is full.
        assert!(reader.read_block(&mut buf).unwrap());
        assert!((buf.channel(0)[100] - f32_to_i16(100.0 / 1024.0) as f32 / 32768.0).abs() < 1e-6);

        // Second block hits end-of-stream: 188 real frames, rest zero.
        assert!(!reader.read_block(&mut buf).unwrap());
        assert_ne!(buf.channel(0)[187], 0.0);
        assert!(buf.channel(0)[188..].iter().all(|&s| s == 0.0));
        assert_eq!(reader.frames_processed(), 700);
    }

    #[test]
    fn test_channel_mismatch_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();

        let settings = AudioSettings::default();
        let err = WavReadSource::open(&path, &settings).unwrap_err();
        assert!(matches!(err, IoError::ChannelMismatch { found: 1, .. }));
    }

    #[test]
    fn test_write_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("closed.wav");
        let settings = AudioSettings::default();

        let mut source = WavWriteSource::create(&path, &settings).unwrap();
        source.close().unwrap();
        source.close().unwrap();

        let block = SampleBuffer::new(2, 16);
        assert!(matches!(
            source.write_block(&block),
            Err(IoError::Closed(_))
        ));
    }
}
