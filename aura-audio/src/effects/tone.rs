//! Bass / mid / treble tone filters
//!
//! RBJ Audio EQ Cookbook biquads:
//! - Bass: low shelf at 250Hz
//! - Mid: peaking bell at 1kHz, Q = 1
//! - Treble: high shelf at 4kHz
//!
//! Gain changes are applied to the coefficients immediately, so they are
//! heard from the next processed block.

use std::f32::consts::PI;

use crate::effects::Effect;

/// Legal gain range for every tone band (dB)
pub const TONE_GAIN_RANGE_DB: f32 = 10.0;

/// Biquad filter coefficients
#[derive(Clone, Copy, Debug)]
struct BiquadCoeffs {
    a0: f32,
    a1: f32,
    a2: f32,
    b1: f32,
    b2: f32,
}

impl BiquadCoeffs {
    const UNITY: Self = Self {
        a0: 1.0,
        a1: 0.0,
        a2: 0.0,
        b1: 0.0,
        b2: 0.0,
    };
}

/// Biquad filter state for a single channel
#[derive(Default, Clone)]
struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, input: f32, coeffs: &BiquadCoeffs) -> f32 {
        let output = coeffs.a0 * input + coeffs.a1 * self.x1 + coeffs.a2 * self.x2
            - coeffs.b1 * self.y1
            - coeffs.b2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Which part of the spectrum a tone filter shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneBand {
    Bass,
    Mid,
    Treble,
}

impl ToneBand {
    /// Corner (shelves) or center (bell) frequency in Hz
    pub fn frequency(&self) -> f32 {
        match self {
            ToneBand::Bass => 250.0,
            ToneBand::Mid => 1000.0,
            ToneBand::Treble => 4000.0,
        }
    }
}

/// One tone band with stereo state
pub struct ToneFilter {
    band: ToneBand,
    sample_rate: f32,
    gain_db: f32,
    coeffs: BiquadCoeffs,
    state_l: BiquadState,
    state_r: BiquadState,
}

impl ToneFilter {
    pub fn new(band: ToneBand, sample_rate: f32) -> Self {
        Self {
            band,
            sample_rate,
            gain_db: 0.0,
            coeffs: BiquadCoeffs::UNITY,
            state_l: BiquadState::default(),
            state_r: BiquadState::default(),
        }
    }

    pub fn band(&self) -> ToneBand {
        self.band
    }

    /// Set gain in dB (clamped to ±10dB)
    pub fn set_gain_db(&mut self, gain_db: f32) {
        let gain_db = if gain_db.is_nan() { 0.0 } else { gain_db };
        self.gain_db = gain_db.clamp(-TONE_GAIN_RANGE_DB, TONE_GAIN_RANGE_DB);
        self.coeffs = self.calc_coeffs();
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    fn calc_coeffs(&self) -> BiquadCoeffs {
        if self.gain_db.abs() < 0.01 {
            return BiquadCoeffs::UNITY;
        }

        let a = 10.0f32.powf(self.gain_db / 40.0); // sqrt(10^(dB/20))
        let omega = 2.0 * PI * self.band.frequency() / self.sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();

        match self.band {
            ToneBand::Bass => {
                let alpha = sin_omega / 2.0 * (2.0f32).sqrt(); // Slope = 1
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                let a0 = (a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha;
                BiquadCoeffs {
                    a0: (a * ((a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha)) / a0,
                    a1: (2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega)) / a0,
                    a2: (a * ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha)) / a0,
                    b1: (-2.0 * ((a - 1.0) + (a + 1.0) * cos_omega)) / a0,
                    b2: ((a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha) / a0,
                }
            }
            ToneBand::Mid => {
                let alpha = sin_omega / 2.0; // Q = 1
                let a0 = 1.0 + alpha / a;
                BiquadCoeffs {
                    a0: (1.0 + alpha * a) / a0,
                    a1: (-2.0 * cos_omega) / a0,
                    a2: (1.0 - alpha * a) / a0,
                    b1: (-2.0 * cos_omega) / a0,
                    b2: (1.0 - alpha / a) / a0,
                }
            }
            ToneBand::Treble => {
                let alpha = sin_omega / 2.0 * (2.0f32).sqrt();
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                let a0 = (a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha;
                BiquadCoeffs {
                    a0: (a * ((a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha)) / a0,
                    a1: (-2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega)) / a0,
                    a2: (a * ((a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha)) / a0,
                    b1: (2.0 * ((a - 1.0) - (a + 1.0) * cos_omega)) / a0,
                    b2: ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha) / a0,
                }
            }
        }
    }
}

impl Effect for ToneFilter {
    fn process(&mut self, samples: &mut [f32]) {
        for frame in samples.chunks_exact_mut(2) {
            frame[0] = self.state_l.process(frame[0], &self.coeffs);
            frame[1] = self.state_r.process(frame[1], &self.coeffs);
        }
    }

    fn reset(&mut self) {
        self.state_l.reset();
        self.state_r.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_stereo(freq: f32, sample_rate: f32, frames: usize) -> Vec<f32> {
        (0..frames)
            .flat_map(|i| {
                let s = (2.0 * PI * freq * i as f32 / sample_rate).sin() * 0.25;
                [s, s]
            })
            .collect()
    }

    fn rms_tail(samples: &[f32]) -> f32 {
        let tail = &samples[samples.len() / 2..];
        (tail.iter().map(|s| s * s).sum::<f32>() / tail.len() as f32).sqrt()
    }

    #[test]
    fn test_flat_is_passthrough() {
        let mut filter = ToneFilter::new(ToneBand::Mid, 48000.0);
        let mut samples = vec![0.5, 0.5, 0.3, 0.3, -0.2, -0.2];
        let original = samples.clone();
        filter.process(&mut samples);
        assert_eq!(samples, original);
    }

    #[test]
    fn test_gain_clamping() {
        let mut filter = ToneFilter::new(ToneBand::Bass, 48000.0);
        filter.set_gain_db(25.0);
        assert_eq!(filter.gain_db(), 10.0);
        filter.set_gain_db(-25.0);
        assert_eq!(filter.gain_db(), -10.0);
        filter.set_gain_db(f32::NAN);
        assert_eq!(filter.gain_db(), 0.0);
    }

    #[test]
    fn test_bass_boost_raises_low_tone() {
        let input = sine_stereo(60.0, 48000.0, 9600);
        let mut boosted = input.clone();
        let mut filter = ToneFilter::new(ToneBand::Bass, 48000.0);
        filter.set_gain_db(10.0);
        filter.process(&mut boosted);

        let ratio = rms_tail(&boosted) / rms_tail(&input);
        // +10dB shelf well below the corner is close to x3.16
        assert!(ratio > 2.5 && ratio < 3.5, "ratio {}", ratio);
    }

    #[test]
    fn test_treble_cut_leaves_bass_alone() {
        let input = sine_stereo(60.0, 48000.0, 9600);
        let mut cut = input.clone();
        let mut filter = ToneFilter::new(ToneBand::Treble, 48000.0);
        filter.set_gain_db(-10.0);
        filter.process(&mut cut);

        let ratio = rms_tail(&cut) / rms_tail(&input);
        assert!((ratio - 1.0).abs() < 0.05, "ratio {}", ratio);
    }

    #[test]
    fn test_mid_bell_at_center() {
        let input = sine_stereo(1000.0, 48000.0, 9600);
        let mut boosted = input.clone();
        let mut filter = ToneFilter::new(ToneBand::Mid, 48000.0);
        filter.set_gain_db(6.0);
        filter.process(&mut boosted);

        let ratio = rms_tail(&boosted) / rms_tail(&input);
        // +6dB at the center frequency is about x2
        assert!((ratio - 2.0).abs() < 0.15, "ratio {}", ratio);
    }

    #[test]
    fn test_reset_clears_ringing() {
        let mut filter = ToneFilter::new(ToneBand::Treble, 48000.0);
        filter.set_gain_db(8.0);
        let mut impulse = vec![1.0, 1.0, 0.0, 0.0];
        filter.process(&mut impulse);

        filter.reset();
        let mut silence = vec![0.0; 8];
        filter.process(&mut silence);
        assert!(silence.iter().all(|&s| s == 0.0));
        assert_eq!(filter.band(), ToneBand::Treble);
    }
}
