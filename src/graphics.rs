use crate::math::{apply_lighting, barycentric, calculate_light_intensity};
use crate::state::Lighting;
use crate::vertex::FaceTriangle;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, SetForegroundColor},
};
use glam::DVec2;
use std::io::{self, Write};

/// Glyphs from darkest to brightest
const SHADE_RAMP: [char; 9] = ['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// One character cell
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub glyph: char,
    pub color: Color,
}

impl Cell {
    const BLANK: Cell = Cell {
        glyph: ' ',
        color: Color::Reset,
    };
}

/// Character-cell color buffer with a depth buffer
pub struct Framebuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    z_buffer: Vec<f64>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Framebuffer {
            width,
            height,
            cells: vec![Cell::BLANK; width * height],
            z_buffer: vec![f64::INFINITY; width * height],
        }
    }

    /// Width in cells
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reallocates for a new terminal size
    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) != (self.width, self.height) {
            *self = Framebuffer::new(width, height);
        }
    }

    /// Blanks every cell and resets depth
    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
        self.z_buffer.fill(f64::INFINITY);
    }

    #[cfg(test)]
    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x])
    }

    /// Writes a cell, ignoring positions outside the buffer
    fn put(&mut self, x: isize, y: isize, cell: Cell) {
        if x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height {
            self.cells[y as usize * self.width + x as usize] = cell;
        }
    }

    /// Draws a triangle with per-cell lighting and depth testing
    pub fn draw_triangle(
        &mut self,
        triangle: &FaceTriangle<'_>,
        lighting: &Lighting,
        base_color: [u8; 3],
    ) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let [v0, v1, v2] = triangle.corners;
        let (a, b, c) = (v0.screen_position, v1.screen_position, v2.screen_position);

        // Compute bounding box of the triangle
        let min = a.min(b).min(c).floor().max(DVec2::ZERO);
        let max = a
            .max(b)
            .max(c)
            .ceil()
            .min(DVec2::new(self.width as f64 - 1.0, self.height as f64 - 1.0));
        if min.x > max.x || min.y > max.y {
            return;
        }

        for y in min.y as usize..=max.y as usize {
            for x in min.x as usize..=max.x as usize {
                let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let Some([w0, w1, w2]) = barycentric(p, a, b, c) else {
                    continue;
                };

                let depth = v0.depth * w0 + v1.depth * w1 + v2.depth * w2;
                let offset = y * self.width + x;
                if depth >= self.z_buffer[offset] {
                    continue;
                }
                self.z_buffer[offset] = depth;

                let position = v0.position * w0 + v1.position * w1 + v2.position * w2;
                let intensity = calculate_light_intensity(triangle.normal, position, lighting);
                let shade = (intensity * (SHADE_RAMP.len() - 1) as f64).round() as usize;
                self.cells[offset] = Cell {
                    glyph: SHADE_RAMP[shade.min(SHADE_RAMP.len() - 1)],
                    color: apply_lighting(base_color, intensity),
                };
            }
        }
    }

    /// Draws a line between two points using Bresenham's algorithm
    pub fn draw_line(&mut self, from: DVec2, to: DVec2, glyph: char, color: Color) {
        let (mut x0, mut y0) = (from.x.floor() as isize, from.y.floor() as isize);
        let (x1, y1) = (to.x.floor() as isize, to.y.floor() as isize);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy; // error value e_xy

        // Lines far outside the viewport are skipped
        if dx.max(-dy) > 4 * (self.width + self.height) as isize {
            return;
        }

        loop {
            self.put(x0, y0, Cell { glyph, color });
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Writes text starting at a cell, clipped to the buffer
    pub fn draw_text(&mut self, x: usize, y: usize, text: &str, color: Color) {
        for (i, glyph) in text.chars().enumerate() {
            self.put((x + i) as isize, y as isize, Cell { glyph, color });
        }
    }

    /// Queues the whole buffer to the terminal, one color change per run
    pub fn present(&self, out: &mut impl Write) -> io::Result<()> {
        let mut current = None;
        for (y, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            queue!(out, MoveTo(0, y as u16))?;
            let mut run = String::with_capacity(self.width);
            for cell in row {
                if current != Some(cell.color) {
                    if !run.is_empty() {
                        queue!(out, Print(&run))?;
                        run.clear();
                    }
                    queue!(out, SetForegroundColor(cell.color))?;
                    current = Some(cell.color);
                }
                run.push(cell.glyph);
            }
            queue!(out, Print(&run))?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraController, Viewport};
    use crate::vertex::ProjectedCube;
    use glam::DMat4;

    #[test]
    fn cube_fills_center_of_buffer() {
        let camera = CameraController::default();
        let viewport = Viewport::new(60, 30, 2.0);
        let cube = ProjectedCube::new(&DMat4::IDENTITY, &camera, &viewport);
        let mut frame = Framebuffer::new(60, 30);
        for triangle in cube.triangles() {
            frame.draw_triangle(&triangle, &Lighting::default(), [255, 105, 180]);
        }
        let center = frame.cell(30, 15).unwrap();
        assert_ne!(center.glyph, ' ');
        assert!(matches!(center.color, Color::Rgb { .. }));
        assert_eq!(frame.cell(0, 0).unwrap().glyph, ' ');
    }

    #[test]
    fn nearer_triangle_wins_depth_test() {
        let camera = CameraController::default();
        let viewport = Viewport::new(60, 30, 2.0);
        let far = ProjectedCube::new(&DMat4::IDENTITY, &camera, &viewport);
        let near = ProjectedCube::new(
            &DMat4::from_translation(glam::DVec3::new(0.0, 0.0, 2.0)),
            &camera,
            &viewport,
        );
        let mut frame = Framebuffer::new(60, 30);
        for triangle in near.triangles() {
            frame.draw_triangle(&triangle, &Lighting::default(), [0, 0, 255]);
        }
        for triangle in far.triangles() {
            frame.draw_triangle(&triangle, &Lighting::default(), [255, 0, 0]);
        }
        let Color::Rgb { r, b, .. } = frame.cell(30, 15).unwrap().color else {
            panic!("center cell not drawn");
        };
        assert_eq!(r, 0);
        assert!(b > 0);
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut frame = Framebuffer::new(10, 5);
        frame.draw_line(DVec2::new(0.5, 0.5), DVec2::new(9.5, 4.5), '#', Color::Yellow);
        assert_eq!(frame.cell(0, 0).unwrap().glyph, '#');
        assert_eq!(frame.cell(9, 4).unwrap().glyph, '#');
    }

    #[test]
    fn text_is_clipped_at_the_edge() {
        let mut frame = Framebuffer::new(4, 1);
        frame.draw_text(2, 0, "abc", Color::White);
        assert_eq!(frame.cell(2, 0).unwrap().glyph, 'a');
        assert_eq!(frame.cell(3, 0).unwrap().glyph, 'b');
        assert!(frame.cell(4, 0).is_none());
    }

    #[test]
    fn present_writes_every_glyph() {
        let mut frame = Framebuffer::new(3, 2);
        frame.draw_text(0, 1, "xyz", Color::Green);
        let mut out = Vec::new();
        frame.present(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("xyz"));
    }
}
