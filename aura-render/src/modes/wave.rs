//! Oscilloscope line

use aura_analysis::{SampleBuffer, SampleKind, TIME_DOMAIN_CENTER};

use crate::color::Palette;
use crate::modes::RenderMode;
use crate::surface::{CanvasSize, Point, Stroke, Surface};

const LINE_WIDTH: f32 = 3.0;
const GLOW_BLUR: f32 = 15.0;

/// Time-domain polyline across the canvas, stroked twice for bloom
#[derive(Debug, Default)]
pub struct WaveMode {
    /// Reused polyline scratch
    points: Vec<Point>,
}

impl WaveMode {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderMode for WaveMode {
    fn data_kind(&self) -> SampleKind {
        SampleKind::TimeDomain
    }

    fn render(
        &mut self,
        buffer: &SampleBuffer,
        palette: &Palette,
        size: CanvasSize,
        surface: &mut dyn Surface,
    ) {
        if size.is_empty() {
            return;
        }
        let center_y = size.height / 2.0;
        let samples = buffer.as_slice();

        self.points.clear();
        if samples.is_empty() {
            self.points.push(Point::new(0.0, center_y));
        } else {
            let slice_width = size.width / samples.len() as f32;
            self.points.extend(samples.iter().enumerate().map(|(i, &v)| {
                let y = v as f32 / TIME_DOMAIN_CENTER as f32 * center_y;
                Point::new(i as f32 * slice_width, y)
            }));
        }
        // Anchor the tail at the right edge, vertically centered
        self.points.push(Point::new(size.width, center_y));

        let stroke = Stroke::new(palette.get(1), LINE_WIDTH);
        surface.stroke_path(&self.points, stroke);
        surface.stroke_path(&self.points, stroke.with_glow(GLOW_BLUR, palette.get(0)));
    }

    fn name(&self) -> &'static str {
        "Wave"
    }
}
