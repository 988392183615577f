//! In-chain processing stages: tone filters and master gain

mod gain;
mod tone;

pub use gain::Gain;
pub use tone::{ToneBand, ToneFilter, TONE_GAIN_RANGE_DB};

/// Trait for in-place processing stages
pub trait Effect: Send {
    /// Process audio samples in place (stereo interleaved)
    fn process(&mut self, samples: &mut [f32]);

    /// Clear filter memory
    fn reset(&mut self);
}
