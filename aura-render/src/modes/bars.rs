//! Bar spectrum

use aura_analysis::{SampleBuffer, SampleKind};

use crate::color::Palette;
use crate::modes::RenderMode;
use crate::surface::{CanvasSize, Paint, Surface};

/// Bar width as a multiple of `width / bins`
pub const BAR_WIDTH_FACTOR: f32 = 2.5;
/// Tallest bar as a fraction of the canvas height
pub const BAR_HEIGHT_RATIO: f32 = 0.8;
/// Horizontal gap between bars in pixels
pub const BAR_GAP: f32 = 1.0;

/// Bottom-aligned bars, one per bin, left to right until the canvas runs out
#[derive(Debug, Default)]
pub struct BarsMode;

impl RenderMode for BarsMode {
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
        let bins = buffer.len();
        if bins == 0 || size.is_empty() {
            return;
        }

        let bar_width = size.width / bins as f32 * BAR_WIDTH_FACTOR;
        let paint = Paint::VerticalGradient {
            bottom: palette.get(0),
            middle: palette.get(2),
            top: palette.get(4),
        };

        let mut x = 0.0;
        for &value in buffer.as_slice() {
            let bar_height = value as f32 / 255.0 * size.height * BAR_HEIGHT_RATIO;
            if bar_height > 0.0 {
                surface.fill_rect(x, size.height - bar_height, bar_width, bar_height, paint);
            }
            x += bar_width + BAR_GAP;
            if x > size.width {
                break;
            }
        }
    }

    fn name(&self) -> &'static str {
        "Bars"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::surface::{CommandList, DrawCommand};

    fn palette() -> Palette {
        Palette::from_hex(&["#00f2ff", "#00c3ff", "#ff00e6", "#8000ff", "#290038"]).unwrap()
    }

    #[test]
    fn test_zero_magnitudes_draw_nothing() {
        let size = CanvasSize::new(800.0, 600.0);
        let mut surface = CommandList::new(size);
        let buffer = SampleBuffer::zeroed(1024, SampleKind::Frequency);
        BarsMode.render(&buffer, &palette(), size, &mut surface);
        assert!(surface.is_empty());
    }

    #[test]
    fn test_full_bar_height_and_gradient() {
        let size = CanvasSize::new(100.0, 100.0);
        let mut surface = CommandList::new(size);
        let buffer = SampleBuffer::from_samples(vec![255, 0, 0, 0], SampleKind::Frequency);
        BarsMode.render(&buffer, &palette(), size, &mut surface);

        assert_eq!(surface.len(), 1);
        let DrawCommand::FillRect { x, y, width, height, paint } = surface.commands()[0] else {
            panic!("expected a rect");
        };
        assert_eq!(x, 0.0);
        assert!((height - 80.0).abs() < 1e-4);
        assert!((y - 20.0).abs() < 1e-4);
        assert!((width - 62.5).abs() < 1e-4);
        assert_eq!(
            paint,
            Paint::VerticalGradient {
                bottom: Color::rgb(0x00, 0xf2, 0xff),
                middle: Color::rgb(0xff, 0x00, 0xe6),
                top: Color::rgb(0x29, 0x00, 0x38),
            }
        );
    }

    #[test]
    fn test_stops_at_canvas_edge() {
        let size = CanvasSize::new(1024.0, 100.0);
        let mut surface = CommandList::new(size);
        let buffer = SampleBuffer::from_samples(vec![200; 1024], SampleKind::Frequency);
        BarsMode.render(&buffer, &palette(), size, &mut surface);

        // Each bar takes 2.5 + 1 px: the run ends once x passes 1024
        let drawn = surface.len();
        assert!(drawn < 1024);
        assert_eq!(drawn, 293);
        for command in surface.commands() {
            if let DrawCommand::FillRect { x, .. } = command {
                assert!(*x <= size.width);
            }
        }
    }

    #[test]
    fn test_short_palette_wraps() {
        let size = CanvasSize::new(10.0, 10.0);
        let mut surface = CommandList::new(size);
        let short = Palette::from_hex(&["#ff0000", "#00ff00", "#0000ff"]).unwrap();
        let buffer = SampleBuffer::from_samples(vec![100], SampleKind::Frequency);
        BarsMode.render(&buffer, &short, size, &mut surface);

        let DrawCommand::FillRect { paint, .. } = surface.commands()[0] else {
            panic!("expected a rect");
        };
        assert_eq!(paint.sample(1.0), Color::rgb(0, 255, 0));
    }
}
