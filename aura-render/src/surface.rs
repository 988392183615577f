//! Drawing surface abstraction and a recording implementation
//!
//! Render modes draw through [`Surface`]. [`CommandList`] records the calls
//! so a front end can replay them onto whatever it displays with, and tests
//! can inspect exactly what a mode drew.

use std::ops::Range;

use crate::color::Color;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Pixel dimensions of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Soft shadow drawn around a shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub blur: f32,
    pub color: Color,
}

/// Fill style for rectangles
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Three stops running from the bottom edge of the shape to its top
    VerticalGradient { bottom: Color, middle: Color, top: Color },
}

impl Paint {
    /// Color at `t` (0 = bottom, 1 = top)
    pub fn sample(&self, t: f32) -> Color {
        match *self {
            Paint::Solid(color) => color,
            Paint::VerticalGradient { bottom, middle, top } => {
                if t < 0.5 {
                    bottom.lerp(middle, t * 2.0)
                } else {
                    middle.lerp(top, (t - 0.5) * 2.0)
                }
            }
        }
    }
}

/// Line style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    pub glow: Option<Glow>,
}

impl Stroke {
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            glow: None,
        }
    }

    pub fn with_glow(self, blur: f32, color: Color) -> Self {
        Self {
            glow: Some(Glow { blur, color }),
            ..self
        }
    }
}

/// Target the render modes draw on
pub trait Surface {
    fn size(&self) -> CanvasSize;

    /// Reset every pixel to transparent
    fn clear(&mut self);

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, paint: Paint);

    /// Stroke an open polyline through `points`
    fn stroke_path(&mut self, points: &[Point], stroke: Stroke);

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color, glow: Option<Glow>);

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: Stroke);

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.stroke_path(&[from, to], stroke);
    }

    /// Cover the whole surface with one color
    fn fill_background(&mut self, color: Color) {
        let size = self.size();
        self.fill_rect(0.0, 0.0, size.width, size.height, Paint::Solid(color));
    }
}

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        paint: Paint,
    },
    /// Polyline whose points live in the list's shared point store
    Path { points: Range<usize>, stroke: Stroke },
    FillCircle {
        center: Point,
        radius: f32,
        color: Color,
        glow: Option<Glow>,
    },
    StrokeCircle {
        center: Point,
        radius: f32,
        stroke: Stroke,
    },
}

/// Surface that records draw calls, reused frame after frame
///
/// [`CommandList::begin`] empties the list but keeps its allocations, so a
/// steady-state frame does not allocate.
#[derive(Debug, Clone, Default)]
pub struct CommandList {
    size: CanvasSize,
    commands: Vec<DrawCommand>,
    points: Vec<Point>,
}

impl CommandList {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            commands: Vec::with_capacity(1024),
            points: Vec::with_capacity(2048),
        }
    }

    /// Start a new frame at `size`
    pub fn begin(&mut self, size: CanvasSize) {
        self.size = size;
        self.commands.clear();
        self.points.clear();
    }

    /// Change the pixel dimensions without touching the recorded frame
    pub fn resize(&mut self, size: CanvasSize) {
        self.size = size;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Points of a recorded path
    pub fn path_points(&self, range: &Range<usize>) -> &[Point] {
        self.points.get(range.clone()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl Surface for CommandList {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn clear(&mut self) {
        self.push(DrawCommand::Clear);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, paint: Paint) {
        self.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            paint,
        });
    }

    fn stroke_path(&mut self, points: &[Point], stroke: Stroke) {
        let start = self.points.len();
        self.points.extend_from_slice(points);
        self.push(DrawCommand::Path {
            points: start..self.points.len(),
            stroke,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color, glow: Option<Glow>) {
        self.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
            glow,
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, stroke: Stroke) {
        self.push(DrawCommand::StrokeCircle {
            center,
            radius,
            stroke,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_paths_in_shared_store() {
        let mut list = CommandList::new(CanvasSize::new(10.0, 10.0));
        list.stroke_line(Point::new(0.0, 0.0), Point::new(1.0, 1.0), Stroke::new(Color::WHITE, 1.0));
        list.stroke_path(
            &[Point::new(2.0, 2.0), Point::new(3.0, 3.0), Point::new(4.0, 4.0)],
            Stroke::new(Color::WHITE, 1.0),
        );

        let DrawCommand::Path { points, .. } = &list.commands()[1] else {
            panic!("expected a path");
        };
        assert_eq!(list.path_points(points).len(), 3);
        assert_eq!(list.path_points(points)[0], Point::new(2.0, 2.0));
    }

    #[test]
    fn test_begin_reuses_allocation() {
        let mut list = CommandList::new(CanvasSize::new(10.0, 10.0));
        for _ in 0..100 {
            list.fill_background(Color::BLACK);
        }
        let capacity = list.commands.capacity();
        list.begin(CanvasSize::new(20.0, 20.0));
        assert!(list.is_empty());
        assert_eq!(list.commands.capacity(), capacity);
        assert_eq!(list.size().width, 20.0);
    }

    #[test]
    fn test_gradient_sampling() {
        let paint = Paint::VerticalGradient {
            bottom: Color::BLACK,
            middle: Color::rgb(100, 100, 100),
            top: Color::WHITE,
        };
        assert_eq!(paint.sample(0.0), Color::BLACK);
        assert_eq!(paint.sample(0.5), Color::rgb(100, 100, 100));
        assert_eq!(paint.sample(1.0), Color::WHITE);
    }
}
