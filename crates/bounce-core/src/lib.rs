//! Core primitives for the bounce offline plugin host.
//!
//! Everything the processing loop shares: the engine-wide [`AudioSettings`],
//! the logical transport [`AudioClock`], channel-major [`SampleBuffer`]s, and
//! the per-component [`TaskTimer`].

mod buffer;
mod clock;
mod error;
mod settings;
mod timer;

pub use buffer::SampleBuffer;
pub use clock::AudioClock;
pub use error::{CoreError, Result};
pub use settings::AudioSettings;
pub use timer::TaskTimer;
