//! Particle field pumped by bass energy
//!
//! The only render mode with state: a fixed-size particle set that is seeded
//! once per palette and integrated every frame. Seeding uses a xorshift64
//! generator, so the same seed and the same buffer sequence always give the
//! same trajectories.

use aura_analysis::{SampleBuffer, SampleKind};

use crate::color::{Color, Palette};
use crate::modes::RenderMode;
use crate::surface::{CanvasSize, Point, Stroke, Surface};

const LINK_WIDTH: f32 = 0.5;

/// Tunables of the particle field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleConfig {
    /// Particles per field
    pub count: usize,
    /// Pump at full-scale bass
    pub pump_scale: f32,
    /// Lowest bins averaged into the pump
    pub bass_bins: usize,
    /// Particles closer than this (px) are linked
    pub link_distance: f32,
    pub seed: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: 100,
            pump_scale: 1.5,
            bass_bins: 50,
            link_distance: 100.0,
            seed: Xorshift64::DEFAULT_SEED,
        }
    }
}

/// xorshift64 PRNG (no allocation, fast)
#[derive(Debug, Clone)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    pub const DEFAULT_SEED: u64 = 0xDEADBEEF_CAFEBABE;

    /// Zero is a fixed point of xorshift and is replaced by the default seed
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::DEFAULT_SEED } else { seed },
        }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform in [0, 1)
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Point,
    pub size: f32,
    pub velocity: Point,
    pub color: Color,
}

/// Persistent particle set
#[derive(Debug, Clone)]
pub struct ParticleField {
    config: ParticleConfig,
    rng: Xorshift64,
    particles: Vec<Particle>,
}

impl ParticleField {
    /// Create an unseeded field; the first frame seeds it to the canvas
    pub fn new(config: ParticleConfig) -> Self {
        Self {
            config,
            rng: Xorshift64::new(config.seed),
            particles: Vec::with_capacity(config.count),
        }
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_seeded(&self) -> bool {
        !self.particles.is_empty()
    }

    /// Scatter `count` particles over the canvas with colors from `palette`
    ///
    /// The generator is restarted from the configured seed, so reseeding with
    /// the same inputs reproduces the same field.
    pub fn reseed(&mut self, palette: &Palette, size: CanvasSize) {
        self.rng = Xorshift64::new(self.config.seed);
        self.particles.clear();
        let colors = palette.len().max(1);
        for _ in 0..self.config.count {
            let rng = &mut self.rng;
            let position = Point::new(rng.next_f32() * size.width, rng.next_f32() * size.height);
            let radius = rng.next_f32() * 3.0 + 1.0;
            let velocity = Point::new((rng.next_f32() - 0.5) * 2.0, (rng.next_f32() - 0.5) * 2.0);
            let color = palette.get((rng.next_f32() * colors as f32) as usize);
            self.particles.push(Particle {
                position,
                size: radius,
                velocity,
                color,
            });
        }
        tracing::debug!(count = self.particles.len(), "particle field seeded");
    }

    /// Bass pump from the lowest bins, 0 to `pump_scale`
    pub fn pump(&self, buffer: &SampleBuffer) -> f32 {
        buffer.mean_of_first(self.config.bass_bins) / 255.0 * self.config.pump_scale
    }

    /// Integrate one frame; velocity turns back inward at the canvas bounds
    pub fn step(&mut self, pump: f32, size: CanvasSize) {
        let factor = 1.0 + pump;
        for p in &mut self.particles {
            p.position.x += p.velocity.x * factor;
            p.position.y += p.velocity.y * factor;

            if p.position.x < 0.0 {
                p.velocity.x = p.velocity.x.abs();
            } else if p.position.x > size.width {
                p.velocity.x = -p.velocity.x.abs();
            }
            if p.position.y < 0.0 {
                p.velocity.y = p.velocity.y.abs();
            } else if p.position.y > size.height {
                p.velocity.y = -p.velocity.y.abs();
            }
        }
    }

    fn draw(&self, pump: f32, surface: &mut dyn Surface) {
        let link = self.config.link_distance;
        for (i, p) in self.particles.iter().enumerate() {
            surface.fill_circle(p.position, p.size * (1.0 + pump), p.color, None);

            // O(n^2) over the particle set only, never over bins
            for other in &self.particles[i + 1..] {
                let distance = p.position.distance(&other.position);
                if distance < link {
                    let color = p.color.with_opacity(1.0 - distance / link);
                    surface.stroke_line(p.position, other.position, Stroke::new(color, LINK_WIDTH));
                }
            }
        }
    }
}

impl Default for ParticleField {
    fn default() -> Self {
        Self::new(ParticleConfig::default())
    }
}

impl RenderMode for ParticleField {
    fn data_kind(&self) -> SampleKind {
        SampleKind::Frequency
    }

    fn render(
        &mut self,
        buffer: &SampleBuffer,
        palette: &Palette,
        size: CanvasSize,
        surface: &mut dyn Surface,
    ) {
        if !self.is_seeded() {
            self.reseed(palette, size);
        }
        let pump = self.pump(buffer);
        self.step(pump, size);
        self.draw(pump, surface);
    }

    fn name(&self) -> &'static str {
        "Particles"
    }
}
