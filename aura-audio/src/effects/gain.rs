//! Master gain stage

use crate::effects::Effect;

/// Linear gain applied to the whole chain (0.0 - 1.0)
pub struct Gain {
    level: f32,
}

impl Gain {
    pub fn new(level: f32) -> Self {
        let mut gain = Self {
            level: 1.0,
        };
        gain.set_level(level);
        gain
    }

    /// Set level (clamped to 0.0 - 1.0)
    pub fn set_level(&mut self, level: f32) {
        self.level = if level.is_nan() { 1.0 } else { level.clamp(0.0, 1.0) };
    }

    pub fn level(&self) -> f32 {
        self.level
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Effect for Gain {
    fn process(&mut self, samples: &mut [f32]) {
        if self.level == 1.0 {
            return;
        }
        for s in samples.iter_mut() {
            *s *= self.level;
        }
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_clamped() {
        assert_eq!(Gain::new(3.0).level(), 1.0);
        assert_eq!(Gain::new(-1.0).level(), 0.0);
    }

    #[test]
    fn test_scales_samples() {
        let mut gain = Gain::new(0.5);
        let mut samples = vec![1.0, -0.5];
        gain.process(&mut samples);
        assert_eq!(samples, vec![0.5, -0.25]);
    }

    #[test]
    fn test_zero_mutes() {
        let mut gain = Gain::new(0.0);
        let mut samples = vec![0.7; 4];
        gain.process(&mut samples);
        assert!(samples.iter().all(|&s| s == 0.0));
    }
}
