//! Visualizer canvas - replays a recorded frame onto braille cells
//!
//! Every terminal cell holds a 2x4 grid of braille dots, so a frame recorded
//! at `canvas_size(area)` maps one recorded pixel to one dot.

use aura_render::{CanvasSize, Color, CommandList, DrawCommand, Paint, Point};
use ratatui::{buffer::Buffer, layout::Rect, style::Style, widgets::Widget};

use crate::theme::to_terminal;

const DOTS_X: usize = 2;
const DOTS_Y: usize = 4;
const BRAILLE_BASE: u32 = 0x2800;

/// Dot bit for (column, row) within a cell
const DOT_BITS: [[u8; DOTS_Y]; DOTS_X] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

/// Drawing resolution for a terminal area
pub fn canvas_size(area: Rect) -> CanvasSize {
    CanvasSize::new(
        (area.width as usize * DOTS_X) as f32,
        (area.height as usize * DOTS_Y) as f32,
    )
}

/// Source-over blend of `color` onto an opaque `base`
fn over(base: Color, color: Color) -> Color {
    base.lerp(color.with_alpha(255), color.a as f32 / 255.0)
        .with_alpha(255)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterCell {
    pub dots: u8,
    pub fg: Color,
    pub bg: Color,
}

impl Default for RasterCell {
    fn default() -> Self {
        Self {
            dots: 0,
            fg: Color::BLACK,
            bg: Color::BLACK,
        }
    }
}

impl RasterCell {
    pub fn symbol(&self) -> char {
        char::from_u32(BRAILLE_BASE + self.dots as u32).unwrap_or(' ')
    }
}

/// Cell grid a [`CommandList`] is rasterized into
#[derive(Debug, Default)]
pub struct Raster {
    columns: usize,
    rows: usize,
    cells: Vec<RasterCell>,
}

impl Raster {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![RasterCell::default(); columns * rows],
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<&RasterCell> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells.get(row * self.columns + column)
    }

    fn dot_width(&self) -> usize {
        self.columns * DOTS_X
    }

    fn dot_height(&self) -> usize {
        self.rows * DOTS_Y
    }

    /// Draw every command of `frame`, in order
    pub fn replay(&mut self, frame: &CommandList) {
        for command in frame.commands() {
            match command {
                DrawCommand::Clear => self.cells.fill(RasterCell::default()),
                DrawCommand::FillRect {
                    x,
                    y,
                    width,
                    height,
                    paint,
                } => self.fill_rect(*x, *y, *width, *height, *paint),
                DrawCommand::Path { points, stroke } => {
                    for pair in frame.path_points(points).windows(2) {
                        self.line(pair[0], pair[1], stroke.color);
                    }
                }
                DrawCommand::FillCircle {
                    center,
                    radius,
                    color,
                    ..
                } => self.fill_circle(*center, *radius, *color),
                DrawCommand::StrokeCircle {
                    center,
                    radius,
                    stroke,
                } => self.stroke_circle(*center, *radius, stroke.color),
            }
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, paint: Paint) {
        let covers = x <= 0.0
            && y <= 0.0
            && x + width >= self.dot_width() as f32
            && y + height >= self.dot_height() as f32;
        if covers {
            // Background wash: tint every cell, opaque fills also wipe the dots
            let color = paint.sample(0.5);
            for cell in &mut self.cells {
                cell.bg = over(cell.bg, color);
                if color.a == 255 {
                    cell.dots = 0;
                }
            }
            return;
        }

        let x0 = x.max(0.0).round() as usize;
        let y0 = y.max(0.0).round() as usize;
        let x1 = ((x + width).round().max(0.0) as usize).min(self.dot_width());
        let y1 = ((y + height).round().max(0.0) as usize).min(self.dot_height());
        for dy in y0..y1 {
            let t = if height > 0.0 { (y + height - dy as f32) / height } else { 0.0 };
            let color = paint.sample(t);
            for dx in x0..x1 {
                self.plot(dx as i64, dy as i64, color);
            }
        }
    }

    fn line(&mut self, from: Point, to: Point, color: Color) {
        let steps = (to.x - from.x).abs().max((to.y - from.y).abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = from.x + (to.x - from.x) * t;
            let y = from.y + (to.y - from.y) * t;
            self.plot(x.round() as i64, y.round() as i64, color);
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let r = radius.ceil() as i64;
        let (cx, cy) = (center.x.round() as i64, center.y.round() as i64);
        for dy in -r..=r {
            for dx in -r..=r {
                if ((dx * dx + dy * dy) as f32) <= radius * radius {
                    self.plot(cx + dx, cy + dy, color);
                }
            }
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, color: Color) {
        let steps = (std::f32::consts::TAU * radius).ceil().max(16.0) as usize;
        for i in 0..steps {
            let (sin, cos) = (i as f32 / steps as f32 * std::f32::consts::TAU).sin_cos();
            let x = center.x + cos * radius;
            let y = center.y + sin * radius;
            self.plot(x.round() as i64, y.round() as i64, color);
        }
    }

    fn plot(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.dot_width() || y >= self.dot_height() {
            return;
        }
        let index = (y / DOTS_Y) * self.columns + x / DOTS_X;
        let cell = &mut self.cells[index];
        cell.dots |= DOT_BITS[x % DOTS_X][y % DOTS_Y];
        cell.fg = over(cell.bg, color);
    }
}

/// Widget that draws the visualizer's last frame
pub struct VisualizerWidget<'a> {
    frame: &'a CommandList,
}

impl<'a> VisualizerWidget<'a> {
    pub fn new(frame: &'a CommandList) -> Self {
        Self { frame }
    }
}

impl Widget for VisualizerWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let mut raster = Raster::new(area.width as usize, area.height as usize);
        raster.replay(self.frame);

        for row in 0..raster.rows() {
            for column in 0..raster.columns() {
                let Some(cell) = raster.cell(column, row) else {
                    continue;
                };
                let style = Style::default()
                    .fg(to_terminal(cell.fg))
                    .bg(to_terminal(cell.bg));
                buf[(area.x + column as u16, area.y + row as u16)]
                    .set_char(cell.symbol())
                    .set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_render::{Stroke, Surface};

    fn frame(columns: usize, rows: usize) -> CommandList {
        CommandList::new(CanvasSize::new((columns * 2) as f32, (rows * 4) as f32))
    }

    #[test]
    fn test_canvas_size_in_dots() {
        let size = canvas_size(Rect::new(0, 0, 80, 24));
        assert_eq!(size, CanvasSize::new(160.0, 96.0));
    }

    #[test]
    fn test_background_sets_cell_colors() {
        let mut list = frame(4, 2);
        list.fill_background(Color::rgb(5, 5, 5));

        let mut raster = Raster::new(4, 2);
        raster.replay(&list);
        let cell = raster.cell(3, 1).unwrap();
        assert_eq!(cell.bg, Color::rgb(5, 5, 5));
        assert_eq!(cell.dots, 0);
        assert_eq!(cell.symbol(), '\u{2800}');
    }

    #[test]
    fn test_translucent_background_keeps_dots() {
        let mut list = frame(2, 1);
        list.fill_circle(Point::new(1.0, 2.0), 3.0, Color::WHITE, None);
        list.fill_background(Color::BLACK.with_alpha(0x40));

        let mut raster = Raster::new(2, 1);
        raster.replay(&list);
        assert_eq!(raster.cell(0, 0).unwrap().dots, 0xff);
    }

    #[test]
    fn test_line_plots_dots() {
        let mut list = frame(2, 1);
        list.stroke_line(Point::new(0.0, 0.0), Point::new(3.0, 0.0), Stroke::new(Color::WHITE, 1.0));

        let mut raster = Raster::new(2, 1);
        raster.replay(&list);
        assert_eq!(raster.cell(0, 0).unwrap().dots, 0x01 | 0x08);
        assert_eq!(raster.cell(1, 0).unwrap().dots, 0x01 | 0x08);
        assert_eq!(raster.cell(0, 0).unwrap().fg, Color::WHITE);
    }

    #[test]
    fn test_out_of_bounds_is_clipped() {
        let mut list = frame(2, 2);
        list.fill_circle(Point::new(-50.0, -50.0), 10.0, Color::WHITE, None);
        list.fill_rect(100.0, 100.0, 5.0, 5.0, Paint::Solid(Color::WHITE));

        let mut raster = Raster::new(2, 2);
        raster.replay(&list);
        assert!((0..2).all(|r| (0..2).all(|c| raster.cell(c, r).unwrap().dots == 0)));
        assert!(raster.cell(2, 0).is_none());
    }
}
