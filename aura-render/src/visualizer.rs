//! Mode dispatch and per-frame background

use aura_analysis::{SampleBuffer, SampleKind};

use crate::color::Color;
use crate::modes::{BarsMode, CircularMode, ParticleConfig, ParticleField, RenderMode, WaveMode};
use crate::surface::{CanvasSize, Surface};
use crate::theme::{ThemeState, VisualizerMode};

/// Alpha of the background wash in particle mode (leaves trails)
pub const PARTICLE_TRAIL_ALPHA: u8 = 0x40;
/// Black overlay drawn over a background image
pub const IMAGE_OVERLAY: Color = Color::BLACK.with_alpha(102);

/// The render mode currently in use, one variant per algorithm
#[derive(Debug)]
pub enum ActiveMode {
    Bars(BarsMode),
    Wave(WaveMode),
    Circular(CircularMode),
    Particles(ParticleField),
}

impl ActiveMode {
    pub fn new(mode: VisualizerMode, particle_config: ParticleConfig) -> Self {
        match mode {
            VisualizerMode::Bars => ActiveMode::Bars(BarsMode),
            VisualizerMode::Wave => ActiveMode::Wave(WaveMode::new()),
            VisualizerMode::Circular => ActiveMode::Circular(CircularMode),
            VisualizerMode::Particles => ActiveMode::Particles(ParticleField::new(particle_config)),
        }
    }

    pub fn mode(&self) -> VisualizerMode {
        match self {
            ActiveMode::Bars(_) => VisualizerMode::Bars,
            ActiveMode::Wave(_) => VisualizerMode::Wave,
            ActiveMode::Circular(_) => VisualizerMode::Circular,
            ActiveMode::Particles(_) => VisualizerMode::Particles,
        }
    }

    pub fn as_render_mode(&mut self) -> &mut dyn RenderMode {
        match self {
            ActiveMode::Bars(mode) => mode,
            ActiveMode::Wave(mode) => mode,
            ActiveMode::Circular(mode) => mode,
            ActiveMode::Particles(mode) => mode,
        }
    }

    pub fn data_kind(&self) -> SampleKind {
        match self {
            ActiveMode::Wave(_) => SampleKind::TimeDomain,
            _ => SampleKind::Frequency,
        }
    }
}

/// Holds the theme and the active mode, and draws whole frames
pub struct Visualizer {
    theme: ThemeState,
    active: ActiveMode,
    particle_config: ParticleConfig,
    size: CanvasSize,
}

impl Visualizer {
    pub fn new(theme: ThemeState, particle_config: ParticleConfig) -> Self {
        let active = ActiveMode::new(theme.mode, particle_config);
        Self {
            theme,
            active,
            particle_config,
            size: CanvasSize::default(),
        }
    }

    pub fn theme(&self) -> &ThemeState {
        &self.theme
    }

    /// Replace the theme
    ///
    /// A mode change swaps the algorithm (particles are dropped on the way out
    /// and created fresh on the way in). A palette change while particles are
    /// active reseeds them.
    pub fn apply_theme(&mut self, theme: ThemeState) {
        if theme.mode != self.active.mode() {
            tracing::debug!(from = %self.active.mode(), to = %theme.mode, "switching render mode");
            self.active = ActiveMode::new(theme.mode, self.particle_config);
        } else if theme.palette != self.theme.palette {
            if let ActiveMode::Particles(field) = &mut self.active {
                field.reseed(&theme.palette, self.size);
            }
        }
        if theme.name != self.theme.name {
            tracing::info!(theme = %theme.name, "theme applied");
        }
        self.theme = theme;
    }

    /// Switch only the mode of the current theme
    pub fn set_mode(&mut self, mode: VisualizerMode) {
        let mut theme = self.theme.clone();
        theme.mode = mode;
        self.apply_theme(theme);
    }

    pub fn mode(&self) -> VisualizerMode {
        self.active.mode()
    }

    /// Kind of snapshot the active mode wants this frame
    pub fn data_kind(&self) -> SampleKind {
        self.active.data_kind()
    }

    /// Particle state, present only while particles are active
    pub fn particles(&self) -> Option<&ParticleField> {
        match &self.active {
            ActiveMode::Particles(field) => Some(field),
            _ => None,
        }
    }

    /// Track the drawing surface's pixel dimensions
    pub fn resize(&mut self, size: CanvasSize) {
        self.size = size;
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    /// Paint the background and the active mode for one frame
    pub fn render_frame(&mut self, buffer: &SampleBuffer, surface: &mut dyn Surface) {
        let size = self.size;
        self.paint_background(surface);
        self.active
            .as_render_mode()
            .render(buffer, &self.theme.palette, size, surface);
    }

    fn paint_background(&self, surface: &mut dyn Surface) {
        if self.theme.background_image.is_some() {
            surface.clear();
            surface.fill_background(IMAGE_OVERLAY);
        } else if self.active.mode() == VisualizerMode::Particles {
            surface.fill_background(self.theme.background.with_alpha(PARTICLE_TRAIL_ALPHA));
        } else {
            surface.fill_background(self.theme.background);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{CommandList, DrawCommand, Paint};

    fn frame(visualizer: &mut Visualizer, buffer: &SampleBuffer) -> CommandList {
        let mut surface = CommandList::new(visualizer.size());
        visualizer.render_frame(buffer, &mut surface);
        surface
    }

    fn visualizer() -> Visualizer {
        let mut v = Visualizer::new(ThemeState::default(), ParticleConfig::default());
        v.resize(CanvasSize::new(320.0, 240.0));
        v
    }

    #[test]
    fn test_data_kind_follows_mode() {
        let mut v = visualizer();
        assert_eq!(v.data_kind(), SampleKind::Frequency);
        v.set_mode(VisualizerMode::Wave);
        assert_eq!(v.data_kind(), SampleKind::TimeDomain);
        assert_eq!(v.theme().mode, VisualizerMode::Wave);
    }

    #[test]
    fn test_solid_background() {
        let mut v = visualizer();
        let surface = frame(&mut v, &SampleBuffer::zeroed(1024, SampleKind::Frequency));
        assert_eq!(surface.len(), 1);
        let DrawCommand::FillRect { paint, width, .. } = surface.commands()[0] else {
            panic!("expected background");
        };
        assert_eq!(paint, Paint::Solid(Color::rgb(5, 5, 5)));
        assert_eq!(width, 320.0);
    }

    #[test]
    fn test_particle_trails_background() {
        let mut v = visualizer();
        v.set_mode(VisualizerMode::Particles);
        let surface = frame(&mut v, &SampleBuffer::zeroed(1024, SampleKind::Frequency));
        let DrawCommand::FillRect { paint, .. } = surface.commands()[0] else {
            panic!("expected background");
        };
        assert_eq!(paint, Paint::Solid(Color::rgb(5, 5, 5).with_alpha(0x40)));
    }

    #[test]
    fn test_background_image_overlay() {
        let mut v = visualizer();
        let mut theme = v.theme().clone();
        theme.background_image = Some("/pictures/stage.png".to_string());
        v.apply_theme(theme);

        let surface = frame(&mut v, &SampleBuffer::default());
        assert_eq!(surface.commands()[0], DrawCommand::Clear);
        let DrawCommand::FillRect { paint, .. } = surface.commands()[1] else {
            panic!("expected overlay");
        };
        assert_eq!(paint, Paint::Solid(IMAGE_OVERLAY));
    }

    #[test]
    fn test_particles_dropped_and_recreated() {
        let mut v = visualizer();
        let buffer = SampleBuffer::zeroed(1024, SampleKind::Frequency);
        v.set_mode(VisualizerMode::Particles);
        frame(&mut v, &buffer);
        let first = v.particles().unwrap().particles().to_vec();

        v.set_mode(VisualizerMode::Bars);
        assert!(v.particles().is_none());

        v.set_mode(VisualizerMode::Particles);
        assert!(!v.particles().unwrap().is_seeded());
        frame(&mut v, &buffer);
        assert_eq!(v.particles().unwrap().particles(), first.as_slice());
    }

    #[test]
    fn test_palette_change_reseeds_particles() {
        let mut v = visualizer();
        v.set_mode(VisualizerMode::Particles);
        let buffer = SampleBuffer::zeroed(1024, SampleKind::Frequency);
        for _ in 0..5 {
            frame(&mut v, &buffer);
        }

        let mut theme = v.theme().clone();
        theme.set_color(0, "#123456").unwrap();
        v.apply_theme(theme);

        let field = v.particles().unwrap();
        assert_eq!(field.particles().len(), 100);
        let mut fresh = ParticleField::default();
        fresh.reseed(&v.theme().palette, v.size());
        assert_eq!(field.particles(), fresh.particles());
    }
}
