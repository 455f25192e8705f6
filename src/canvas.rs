// src/canvas.rs
//! Převod logických pixelů plátna na buňky terminálu a posun (scroll) plátna.

use ratatui::layout::Rect;

use crate::mapper::{Viewport, ViewportBox};
use crate::overlay::OverlayFrame;

/// Kolik logických pixelů odpovídá jedné buňce terminálu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellGrid {
    pub cell_width: u32,
    pub cell_height: u32,
}

impl Default for CellGrid {
    fn default() -> Self {
        Self {
            cell_width: 8,
            cell_height: 16,
        }
    }
}

/// Box v buňkách, souřadnice relativně k levému hornímu rohu plátna.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBox {
    pub col: i64,
    pub row: i64,
    pub width: i64,
    pub height: i64,
}

impl CellBox {
    pub fn contains(&self, col: i64, row: i64) -> bool {
        col >= self.col && col < self.col + self.width && row >= self.row && row < self.row + self.height
    }
}

impl CellGrid {
    pub fn new(cell_width: u32, cell_height: u32) -> Self {
        Self {
            cell_width: cell_width.max(1),
            cell_height: cell_height.max(1),
        }
    }

    pub fn to_cells(&self, b: &ViewportBox) -> CellBox {
        let cw = self.cell_width as i64;
        let ch = self.cell_height as i64;
        let col = b.left.div_euclid(cw);
        let row = b.top.div_euclid(ch);
        // poslední pokrytá buňka podle pravého / dolního okraje, ne podle šířky
        let last_col = (b.right() - 1).div_euclid(cw);
        let last_row = (b.bottom() - 1).div_euclid(ch);
        CellBox {
            col,
            row,
            width: (last_col - col + 1).max(1),
            height: (last_row - row + 1).max(1),
        }
    }

    /// Rozměr celého plátna v buňkách.
    pub fn canvas_size(&self, viewport: Viewport) -> (u16, u16) {
        let cols = viewport.width.div_ceil(self.cell_width);
        let rows = viewport.height.div_ceil(self.cell_height);
        (
            cols.min(u16::MAX as u32) as u16,
            rows.min(u16::MAX as u32) as u16,
        )
    }
}

/// Posunutelný výřez plátna na obrazovce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanvasScroll {
    pub col: u16,
    pub row: u16,
}

impl CanvasScroll {
    pub fn scroll_by(&mut self, d_col: i32, d_row: i32, canvas: (u16, u16), area: Rect) {
        let max_col = canvas.0.saturating_sub(area.width) as i32;
        let max_row = canvas.1.saturating_sub(area.height) as i32;
        self.col = (self.col as i32 + d_col).clamp(0, max_col.max(0)) as u16;
        self.row = (self.row as i32 + d_row).clamp(0, max_row.max(0)) as u16;
    }

    /// Posune výřez tak, aby byl box celý vidět (pokud se vejde).
    pub fn reveal(&mut self, cells: &CellBox, canvas: (u16, u16), area: Rect) {
        let (row, height) = (cells.row.max(0), cells.height);
        let (col, width) = (cells.col.max(0), cells.width);

        let top = self.row as i64;
        let bottom = top + area.height as i64;
        if row < top || height > area.height as i64 {
            self.row = row as u16;
        } else if row + height > bottom {
            self.row = (row + height - area.height as i64).max(0) as u16;
        }

        let left = self.col as i64;
        let right = left + area.width as i64;
        if col < left || width > area.width as i64 {
            self.col = col as u16;
        } else if col + width > right {
            self.col = (col + width - area.width as i64).max(0) as u16;
        }

        self.scroll_by(0, 0, canvas, area);
    }

    /// Kde na obrazovce box leží, oříznutý na `area`. `None` = mimo výřez.
    pub fn project(&self, cells: &CellBox, area: Rect) -> Option<Rect> {
        let x0 = cells.col - self.col as i64;
        let y0 = cells.row - self.row as i64;
        let x1 = x0 + cells.width;
        let y1 = y0 + cells.height;

        let cx0 = x0.max(0);
        let cy0 = y0.max(0);
        let cx1 = x1.min(area.width as i64);
        let cy1 = y1.min(area.height as i64);
        if cx0 >= cx1 || cy0 >= cy1 {
            return None;
        }
        Some(Rect {
            x: area.x + cx0 as u16,
            y: area.y + cy0 as u16,
            width: (cx1 - cx0) as u16,
            height: (cy1 - cy0) as u16,
        })
    }

    /// Buňka plátna pod bodem obrazovky. `None` mimo `area`.
    pub fn screen_to_cell(&self, area: Rect, column: u16, row: u16) -> Option<(i64, i64)> {
        if column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }
        Some((
            (column - area.x) as i64 + self.col as i64,
            (row - area.y) as i64 + self.row as i64,
        ))
    }
}

/// Region pod kliknutím. Porovnává se v buňkách, tedy přesně s tím, co je na obrazovce.
pub fn hit_test(
    frame: &OverlayFrame,
    grid: &CellGrid,
    scroll: &CanvasScroll,
    area: Rect,
    column: u16,
    row: u16,
) -> Option<usize> {
    let (col, r) = scroll.screen_to_cell(area, column, row)?;
    frame
        .elements
        .iter()
        .rev()
        .find(|e| grid.to_cells(&e.bbox).contains(col, r))
        .map(|e| e.index)
}
