//! The silence generator source.

use crate::error::Result;
use crate::source::{SampleSource, SourceState, SourceType};
use bounce_core::SampleBuffer;

/// Produces zero-filled blocks indefinitely. Selected automatically when an
/// instrument-headed chain runs without an input file; the MIDI sequence is
/// then the only thing that can end the loop.
#[derive(Debug)]
pub struct SilenceSource {
    frames_processed: u64,
    state: SourceState,
}

impl SilenceSource {
    pub fn new() -> Self {
        Self {
            frames_processed: 0,
            state: SourceState::Open,
        }
    }
}

impl Default for SilenceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for SilenceSource {
    fn name(&self) -> &str {
        "(silence)"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Silence
    }

    fn state(&self) -> SourceState {
        self.state
    }

    fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    fn read_block(&mut self, buf: &mut SampleBuffer) -> Result<bool> {
        buf.clear();
        self.frames_processed += buf.blocksize() as u64;
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        self.state = SourceState::Closed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_never_ends() {
        let mut source = SilenceSource::new();
        let mut buf = SampleBuffer::new(2, 256);
        buf.channel_mut(0).fill(0.7);

        for _ in 0..4 {
            assert!(source.read_block(&mut buf).unwrap());
        }
        assert!(buf.channels().all(|c| c.iter().all(|&s| s == 0.0)));
        assert_eq!(source.frames_processed(), 1024);
    }

    #[test]
    fn test_silence_rejects_writes() {
        let mut source = SilenceSource::new();
        let buf = SampleBuffer::new(2, 256);
        assert!(source.write_block(&buf).is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut source = SilenceSource::new();
        assert!(source.close().is_ok());
        assert!(source.close().is_ok());
        assert_eq!(source.state(), SourceState::Closed);
    }
}
