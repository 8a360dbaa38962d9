//! Engine-wide audio configuration.

use crate::{CoreError, Result};

/// Sample rate, blocksize, and channel count shared by every component of a
/// run. Mutated only before the processing loop starts; the engine owns the
/// single instance and everything else borrows it read-only.
#[derive(Debug, Clone)]
pub struct AudioSettings {
    pub sample_rate: f64,
    pub blocksize: usize,
    pub channels: usize,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            blocksize: 512,
            channels: 2,
        }
    }
}

impl AudioSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(CoreError::InvalidSettings(format!(
                "sample rate {} must be positive",
                self.sample_rate
            )));
        }
        if self.blocksize == 0 {
            return Err(CoreError::InvalidSettings(
                "blocksize must be positive".to_string(),
            ));
        }
        if self.channels == 0 {
            return Err(CoreError::InvalidSettings(
                "channel count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
