//! Headerless raw PCM sources (interleaved little-endian 16-bit frames).
//!
//! Raw files carry no metadata, so the frame layout comes entirely from the
//! engine's audio settings.

use crate::error::{IoError, Result};
use crate::source::{SampleSource, SourceState, SourceType};
use bounce_core::{AudioSettings, SampleBuffer};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Read until `buf` is full or the stream ends.
fn read_fully(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

pub(crate) struct PcmReadSource {
    name: String,
    reader: BufReader<File>,
    channels: usize,
    block_bytes: Vec<u8>,
    frames_processed: u64,
    state: SourceState,
}

impl PcmReadSource {
    pub(crate) fn open(path: &Path, settings: &AudioSettings) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            name: path.display().to_string(),
            reader: BufReader::new(file),
            channels: settings.channels,
            block_bytes: vec![0u8; settings.blocksize * settings.channels * 2],
            frames_processed: 0,
            state: SourceState::Open,
        })
    }
}

impl SampleSource for PcmReadSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SourceType {
        SourceType::Pcm
    }

    fn state(&self) -> SourceState {
        self.state
    }

    fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    fn read_block(&mut self, buf: &mut SampleBuffer) -> Result<bool> {
        buf.clear();
        let filled = read_fully(&mut self.reader, &mut self.block_bytes).map_err(|e| {
            self.state = SourceState::Failed;
            IoError::from(e)
        })?;
        let frame_bytes = self.channels * 2;
        let frames = filled / frame_bytes;
        for frame in 0..frames {
            for channel in 0..self.channels {
                let at = frame * frame_bytes + channel * 2;
                let sample = i16::from_le_bytes([self.block_bytes[at], self.block_bytes[at + 1]]);
                buf.channel_mut(channel)[frame] = f32::from(sample) / 32768.0;
            }
        }
        self.frames_processed += frames as u64;
        Ok(frames == buf.blocksize())
    }

    fn close(&mut self) -> Result<()> {
        self.state = SourceState::Closed;
        Ok(())
    }
}

pub(crate) struct PcmWriteSource {
    name: String,
    writer: Option<BufWriter<File>>,
    channels: usize,
    frames_processed: u64,
    state: SourceState,
}

impl PcmWriteSource {
    pub(crate) fn create(path: &Path, settings: &AudioSettings) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            name: path.display().to_string(),
            writer: Some(BufWriter::new(file)),
            channels: settings.channels,
            frames_processed: 0,
            state: SourceState::Open,
        })
    }
}

impl SampleSource for PcmWriteSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SourceType {
        SourceType::Pcm
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
                if let Err(e) = writer.write_all(&sample.to_le_bytes()) {
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
            writer.flush()?;
            self.state = SourceState::Closed;
        }
        Ok(())
    }
}
