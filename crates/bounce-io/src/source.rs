//! The sample source abstraction and extension-based type guessing.

use crate::aiff::{AiffReadSource, AiffWriteSource};
use crate::error::{IoError, Result};
use crate::pcm::{PcmReadSource, PcmWriteSource};
use crate::silence::SilenceSource;
use crate::wav::{WavReadSource, WavWriteSource};
use bounce_core::{AudioSettings, SampleBuffer};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Wav,
    Aiff,
    Pcm,
    Silence,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Wav => write!(f, "WAV"),
            SourceType::Aiff => write!(f, "AIFF"),
            SourceType::Pcm => write!(f, "PCM"),
            SourceType::Silence => write!(f, "silence"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Open,
    Closed,
    Failed,
}

/// Block-oriented audio I/O.
///
/// Read sources fill buffers until the stream runs dry; write sources
/// consume whole blocks. A source opened one way reports `NotSupported`
/// for the other direction.
pub trait SampleSource {
    fn name(&self) -> &str;

    fn source_type(&self) -> SourceType;

    fn state(&self) -> SourceState;

    /// Frames actually read or written so far.
    fn frames_processed(&self) -> u64;

    /// Fill `buf` with up to one block of frames.
    ///
    /// Returns `true` while the buffer was filled entirely with real
    /// samples; `false` on the block that exhausts the stream (the
    /// remainder of the buffer is zero-padded). That final short block is
    /// still valid audio and is processed by the engine.
    fn read_block(&mut self, buf: &mut SampleBuffer) -> Result<bool> {
        let _ = buf;
        Err(IoError::NotSupported {
            name: self.name().to_string(),
            operation: "reading",
        })
    }

    /// Write all frames of `buf`.
    fn write_block(&mut self, buf: &SampleBuffer) -> Result<()> {
        let _ = buf;
        Err(IoError::NotSupported {
            name: self.name().to_string(),
            operation: "writing",
        })
    }

    /// Flush and release the underlying file. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// Supported extensions and their descriptions, for `--list-file-types`.
pub fn supported_types() -> &'static [(&'static str, &'static str)] {
    &[
        ("wav", "RIFF WAVE (16/24/32-bit int, 32-bit float)"),
        ("aif, aiff", "AIFF (16-bit big-endian)"),
        ("pcm, raw", "headerless little-endian 16-bit frames"),
    ]
}

/// Infer the source type from the file extension, case-insensitive.
pub fn guess_source_type(path: &Path) -> Option<SourceType> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "wav" => Some(SourceType::Wav),
        "aif" | "aiff" => Some(SourceType::Aiff),
        "pcm" | "raw" => Some(SourceType::Pcm),
        _ => None,
    }
}

/// Open `path` as a sample source in the given direction.
///
/// The concrete format comes from the extension; an unrecognized extension
/// fails here rather than after the loop has started.
pub fn open_sample_source(
    path: &Path,
    direction: Direction,
    settings: &AudioSettings,
) -> Result<Box<dyn SampleSource>> {
    let source_type = guess_source_type(path).ok_or_else(|| IoError::UnknownType(path.into()))?;
    match (source_type, direction) {
        (SourceType::Wav, Direction::Read) => Ok(Box::new(WavReadSource::open(path, settings)?)),
        (SourceType::Wav, Direction::Write) => {
            Ok(Box::new(WavWriteSource::create(path, settings)?))
        }
        (SourceType::Aiff, Direction::Read) => Ok(Box::new(AiffReadSource::open(path, settings)?)),
        (SourceType::Aiff, Direction::Write) => {
            Ok(Box::new(AiffWriteSource::create(path, settings)?))
        }
        (SourceType::Pcm, Direction::Read) => Ok(Box::new(PcmReadSource::open(path, settings)?)),
        (SourceType::Pcm, Direction::Write) => {
            Ok(Box::new(PcmWriteSource::create(path, settings)?))
        }
        (SourceType::Silence, _) => Ok(silence_source()),
    }
}

/// The silence generator: endless zero-filled blocks, never end-of-stream.
pub fn silence_source() -> Box<dyn SampleSource> {
    Box::new(SilenceSource::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_source_type_case_insensitive() {
        assert_eq!(
            guess_source_type(Path::new("mix.WAV")),
            Some(SourceType::Wav)
        );
        assert_eq!(
            guess_source_type(Path::new("take.Aiff")),
            Some(SourceType::Aiff)
        );
        assert_eq!(
            guess_source_type(Path::new("raw.pcm")),
            Some(SourceType::Pcm)
        );
        assert_eq!(guess_source_type(Path::new("song.mp3")), None);
        assert_eq!(guess_source_type(Path::new("noext")), None);
    }

    #[test]
    fn test_open_unknown_extension_fails() {
        let settings = AudioSettings::default();
        let err = open_sample_source(Path::new("song.xyz"), Direction::Read, &settings)
            .err()
            .expect("unknown extension must fail");
        assert!(matches!(err, IoError::UnknownType(_)));
    }
}
