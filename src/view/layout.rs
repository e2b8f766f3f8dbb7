//! Equal-area grid layout for player panels.
//!
//! All arithmetic is integral so a given window size and player count
//! always produce the same grid, with no dependence on float rounding
//! at exact-aspect boundaries.

/// Grid shape and cell size for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub cols: u32,
    pub rows: u32,
    pub cell_w: u32,
    pub cell_h: u32,
}

impl Layout {
    /// Split a window into `count` cells of equal size.
    ///
    /// Rows grow with the window's inverse aspect ratio so cells keep
    /// roughly the window's own proportions. `count` and both size axes
    /// must be non-zero; the renderer short-circuits to a fallback
    /// screen before asking for an empty grid.
    pub fn compute(size: (u32, u32), count: u32) -> Self {
        let (w, h) = size;
        let rows = (count * h).div_ceil(w);
        let cols = count.div_ceil(rows);
        Self {
            cols,
            rows,
            cell_w: w / cols,
            cell_h: h / rows,
        }
    }

    pub fn cell_size(&self) -> (u32, u32) {
        (self.cell_w, self.cell_h)
    }

    /// Pixel origin of the cell for panel index `i`, filling row-major.
    pub fn cell_origin(&self, i: u32) -> (i64, i64) {
        let col = i % self.cols;
        let row = i / self.cols;
        (i64::from(col * self.cell_w), i64::from(row * self.cell_h))
    }
}
