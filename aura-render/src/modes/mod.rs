//! Rendering algorithms
//!
//! Every mode maps one analyzer snapshot plus the theme palette onto draw
//! calls. Only particles keep state between frames.

mod bars;
mod circular;
mod particles;
mod wave;

pub use bars::{BarsMode, BAR_GAP, BAR_HEIGHT_RATIO, BAR_WIDTH_FACTOR};
pub use circular::{CircularMode, CIRCULAR_SPIKES};
pub use particles::{Particle, ParticleConfig, ParticleField, Xorshift64};
pub use wave::WaveMode;

use aura_analysis::{SampleBuffer, SampleKind};

use crate::color::Palette;
use crate::surface::{CanvasSize, Surface};

/// Common capability of the four modes
pub trait RenderMode {
    /// Which analyzer snapshot the mode consumes
    fn data_kind(&self) -> SampleKind;

    /// Draw one frame; an empty buffer draws the silent frame
    fn render(
        &mut self,
        buffer: &SampleBuffer,
        palette: &Palette,
        size: CanvasSize,
        surface: &mut dyn Surface,
    );

    fn name(&self) -> &'static str;
}
