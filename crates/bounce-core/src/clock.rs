//! Logical transport clock.

use tracing::debug;

/// Monotonic sample position for the processing loop.
///
/// The clock has no relation to wall time; it only tracks how many frames
/// the transport has advanced. Once stopped it is frozen and further
/// `advance` calls are ignored, so the final value equals the total frames
/// processed.
#[derive(Debug)]
pub struct AudioClock {
    current_sample: u64,
    running: bool,
}

impl AudioClock {
    pub fn new() -> Self {
        Self {
            current_sample: 0,
            running: true,
        }
    }

    #[inline]
    pub fn current_sample(&self) -> u64 {
        self.current_sample
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the transport by `frames`. Ignored when the clock is stopped
    /// or `frames` is zero.
    pub fn advance(&mut self, frames: u64) {
        if !self.running {
            debug!("Ignoring advance({}) on a stopped clock", frames);
            return;
        }
        if frames == 0 {
            return;
        }
        self.current_sample += frames;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }
}

impl Default for AudioClock {
    fn default() -> Self {
        Self::new()
    }
}
