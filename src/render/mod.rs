//! Render module - the drawing contract and the cell canvas.
//!
//! The tree does not rasterize anything itself: the draw pass hands every
//! visible view's callback a [`Canvas`] plus resolved geometry. The bundled
//! [`CellCanvas`] is a terminal-cell grid backing the reference terminal
//! platform; any other vector backend can implement `Canvas` instead.

use crate::types::{Attr, Rect, Rgba};

// =============================================================================
// Frame context
// =============================================================================

/// Per-frame information handed to draw callbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameContext {
    /// Monotonically increasing frame counter.
    pub frame: u64,
    /// Current window size in canvas units.
    pub window: (f32, f32),
}

// =============================================================================
// Canvas contract
// =============================================================================

/// Minimal drawing surface handed to view draw callbacks.
pub trait Canvas {
    /// Canvas size in drawing units.
    fn size(&self) -> (f32, f32);

    /// Fill the whole canvas with one color.
    fn clear(&mut self, color: Rgba);

    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    /// Outline a rectangle.
    fn stroke_rect(&mut self, rect: Rect, color: Rgba);

    fn draw_text(&mut self, x: f32, y: f32, text: &str, fg: Rgba, attrs: Attr);
}

// =============================================================================
// Cell
// =============================================================================

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgba,
    pub bg: Rgba,
    pub attrs: Attr,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Rgba::WHITE,
            bg: Rgba::TRANSPARENT,
            attrs: Attr::NONE,
        }
    }
}

// =============================================================================
// CellCanvas
// =============================================================================

/// A grid of terminal cells implementing [`Canvas`].
///
/// Drawing units map 1:1 to cells; fractional coordinates are floored.
/// All operations clip to the grid.
pub struct CellCanvas {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl CellCanvas {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resize the grid, clearing its content.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize(width as usize * height as usize, Cell::default());
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y as usize * self.width as usize + x as usize)
    }

    fn cell_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells
            .get_mut(y as usize * self.width as usize + x as usize)
    }

    /// One row of cells, for the flush path.
    pub fn row(&self, y: u16) -> &[Cell] {
        let start = y as usize * self.width as usize;
        &self.cells[start..start + self.width as usize]
    }

    /// Clip a rect to the grid, returning cell bounds (x0, y0, x1, y1),
    /// end-exclusive.
    fn clip(&self, rect: Rect) -> Option<(u16, u16, u16, u16)> {
        let x0 = rect.x.max(0.0).floor() as i64;
        let y0 = rect.y.max(0.0).floor() as i64;
        let x1 = (rect.right().min(self.width as f32)).ceil() as i64;
        let y1 = (rect.bottom().min(self.height as f32)).ceil() as i64;
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u16, y0 as u16, x1 as u16, y1 as u16))
    }
}

impl Canvas for CellCanvas {
    fn size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    fn clear(&mut self, color: Rgba) {
        for cell in &mut self.cells {
            *cell = Cell {
                bg: color,
                ..Cell::default()
            };
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        if color.is_transparent() {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(cell) = self.cell_mut(x, y) {
                    cell.bg = color;
                    cell.ch = ' ';
                }
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba) {
        let Some((x0, y0, x1, y1)) = self.clip(rect) else {
            return;
        };
        let (right, bottom) = (x1 - 1, y1 - 1);
        for x in x0..x1 {
            for (y, ch) in [(y0, '─'), (bottom, '─')] {
                if let Some(cell) = self.cell_mut(x, y) {
                    cell.ch = ch;
                    cell.fg = color;
                }
            }
        }
        for y in y0..y1 {
            for (x, ch) in [(x0, '│'), (right, '│')] {
                if let Some(cell) = self.cell_mut(x, y) {
                    cell.ch = ch;
                    cell.fg = color;
                }
            }
        }
        for (x, y, ch) in [
            (x0, y0, '┌'),
            (right, y0, '┐'),
            (x0, bottom, '└'),
            (right, bottom, '┘'),
        ] {
            if let Some(cell) = self.cell_mut(x, y) {
                cell.ch = ch;
                cell.fg = color;
            }
        }
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, fg: Rgba, attrs: Attr) {
        let row = y.floor() as i64;
        if row < 0 || row >= self.height as i64 {
            return;
        }
        let mut column = x.floor() as i64;
        for ch in text.chars() {
            if column >= self.width as i64 {
                break;
            }
            if column >= 0 {
                if let Some(cell) = self.cell_mut(column as u16, row as u16) {
                    cell.ch = ch;
                    cell.fg = fg;
                    cell.attrs = attrs;
                }
            }
            column += 1;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_clips_to_grid() {
        let mut canvas = CellCanvas::new(10, 5);
        let red = Rgba::rgb(255, 0, 0);
        canvas.fill_rect(Rect::new(8.0, 3.0, 10.0, 10.0), red);

        assert_eq!(canvas.cell(8, 3).unwrap().bg, red);
        assert_eq!(canvas.cell(9, 4).unwrap().bg, red);
        assert_eq!(canvas.cell(7, 3).unwrap().bg, Rgba::TRANSPARENT);
    }

    #[test]
    fn test_draw_text_clips_horizontally() {
        let mut canvas = CellCanvas::new(5, 1);
        canvas.draw_text(3.0, 0.0, "hello", Rgba::WHITE, Attr::BOLD);

        assert_eq!(canvas.cell(3, 0).unwrap().ch, 'h');
        assert_eq!(canvas.cell(4, 0).unwrap().ch, 'e');
        assert_eq!(canvas.cell(3, 0).unwrap().attrs, Attr::BOLD);
        // Off-grid rows are ignored entirely.
        canvas.draw_text(0.0, 7.0, "x", Rgba::WHITE, Attr::NONE);
    }

    #[test]
    fn test_stroke_rect_corners() {
        let mut canvas = CellCanvas::new(10, 10);
        canvas.stroke_rect(Rect::new(1.0, 1.0, 4.0, 3.0), Rgba::WHITE);

        assert_eq!(canvas.cell(1, 1).unwrap().ch, '┌');
        assert_eq!(canvas.cell(4, 1).unwrap().ch, '┐');
        assert_eq!(canvas.cell(1, 3).unwrap().ch, '└');
        assert_eq!(canvas.cell(4, 3).unwrap().ch, '┘');
        assert_eq!(canvas.cell(2, 1).unwrap().ch, '─');
        assert_eq!(canvas.cell(1, 2).unwrap().ch, '│');
    }

    #[test]
    fn test_resize_clears() {
        let mut canvas = CellCanvas::new(4, 4);
        canvas.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Rgba::WHITE);
        canvas.resize(8, 2);
        assert_eq!(canvas.width(), 8);
        assert_eq!(canvas.cell(0, 0).unwrap().bg, Rgba::TRANSPARENT);
    }
}
