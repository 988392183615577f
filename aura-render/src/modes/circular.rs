//! Radial spectrum

use std::f32::consts::TAU;

use aura_analysis::{SampleBuffer, SampleKind};

use crate::color::Palette;
use crate::modes::RenderMode;
use crate::surface::{CanvasSize, Glow, Point, Stroke, Surface};

/// Number of angular samples around the ring
pub const CIRCULAR_SPIKES: usize = 120;

/// Ring radius as a fraction of half the shorter side
const RADIUS_RATIO: f32 = 0.4;
/// Longest spike as a fraction of half the shorter side
const SPIKE_RATIO: f32 = 0.5;
const RING_WIDTH: f32 = 3.0;
const SPIKE_WIDTH: f32 = 2.0;
const CORE_RATIO: f32 = 0.9;
const CORE_GLOW: f32 = 20.0;

/// Spikes radiating out of a ring, with a glowing core drawn on top
#[derive(Debug, Default)]
pub struct CircularMode;

impl RenderMode for CircularMode {
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
        if size.is_empty() {
            return;
        }
        let center = size.center();
        let half = size.min_side() / 2.0;
        let radius = half * RADIUS_RATIO;
        let max_spike = half * SPIKE_RATIO;

        surface.stroke_circle(center, radius, Stroke::new(palette.get(0), RING_WIDTH));

        let samples = buffer.as_slice();
        let stride = (samples.len() / CIRCULAR_SPIKES).max(1);
        for i in 0..CIRCULAR_SPIKES {
            let value = samples.get(i * stride).copied().unwrap_or(0);
            let spike = value as f32 / 255.0 * max_spike;
            if spike <= 0.0 {
                continue;
            }

            let angle = i as f32 / CIRCULAR_SPIKES as f32 * TAU;
            let (sin, cos) = angle.sin_cos();
            let from = Point::new(center.x + cos * radius, center.y + sin * radius);
            let to = Point::new(
                center.x + cos * (radius + spike),
                center.y + sin * (radius + spike),
            );
            let color = if i % 2 == 0 { palette.get(1) } else { palette.get(2) };
            surface.stroke_line(from, to, Stroke::new(color, SPIKE_WIDTH));
        }

        surface.fill_circle(
            center,
            radius * CORE_RATIO,
            palette.get(0),
            Some(Glow {
                blur: CORE_GLOW,
                color: palette.get(1),
            }),
        );
    }

    fn name(&self) -> &'static str {
        "Circular"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::surface::{CommandList, DrawCommand};

    fn palette() -> Palette {
        Palette::new(vec![Color::rgb(1, 0, 0), Color::rgb(2, 0, 0), Color::rgb(3, 0, 0)])
    }

    #[test]
    fn test_silence_draws_ring_and_core() {
        let size = CanvasSize::new(800.0, 600.0);
        let mut surface = CommandList::new(size);
        let buffer = SampleBuffer::zeroed(1024, SampleKind::Frequency);
        CircularMode.render(&buffer, &palette(), size, &mut surface);

        assert_eq!(surface.len(), 2);
        let DrawCommand::StrokeCircle { center, radius, .. } = surface.commands()[0] else {
            panic!("expected the ring first");
        };
        assert_eq!(center, Point::new(400.0, 300.0));
        assert!((radius - 120.0).abs() < 1e-4);
        let DrawCommand::FillCircle { radius, glow, .. } = surface.commands()[1] else {
            panic!("expected the core last");
        };
        assert!((radius - 108.0).abs() < 1e-4);
        assert_eq!(glow.unwrap().blur, 20.0);
    }

    #[test]
    fn test_full_spectrum_draws_every_spike() {
        let size = CanvasSize::new(200.0, 200.0);
        let mut surface = CommandList::new(size);
        let buffer = SampleBuffer::from_samples(vec![255; 1024], SampleKind::Frequency);
        CircularMode.render(&buffer, &palette(), size, &mut surface);

        assert_eq!(surface.len(), CIRCULAR_SPIKES + 2);
        assert!(matches!(surface.commands().last(), Some(DrawCommand::FillCircle { .. })));

        // First spike points right from the ring (r = 40) to r + 50
        let DrawCommand::Path { points, stroke } = &surface.commands()[1] else {
            panic!("expected a spike");
        };
        let pts = surface.path_points(points);
        assert!((pts[0].x - 140.0).abs() < 1e-3);
        assert!((pts[1].x - 190.0).abs() < 1e-3);
        assert_eq!(stroke.color, Color::rgb(2, 0, 0));

        let DrawCommand::Path { stroke, .. } = &surface.commands()[2] else {
            panic!("expected a spike");
        };
        assert_eq!(stroke.color, Color::rgb(3, 0, 0));
    }

    #[test]
    fn test_short_buffer_does_not_overrun() {
        let size = CanvasSize::new(100.0, 100.0);
        let mut surface = CommandList::new(size);
        let buffer = SampleBuffer::from_samples(vec![255; 10], SampleKind::Frequency);
        CircularMode.render(&buffer, &palette(), size, &mut surface);
        assert_eq!(surface.len(), 10 + 2);
    }
}
