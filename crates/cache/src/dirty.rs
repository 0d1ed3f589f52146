//! Per-tile dirty-region tracking.
//!
//! A cache tile's `region` is divided into fixed-size cells; `DirtyRegion`
//! tracks which cells still need repaint before the tile may satisfy a
//! `paint_from_cache` request. `Full` is kept as a distinct variant rather
//! than "all cells set" so a freshly allocated tile doesn't pay for a
//! bitvec allocation it will discard on the first `mark_clean`.

use bitvec::prelude::{BitVec, Lsb0};
use geom::IntRect;

/// Cell edge length, in device pixels, of the dirty-tracking grid.
pub const CELL_SIZE: i32 = 32;

#[derive(Debug, Clone)]
pub enum DirtyRegion {
    Full,
    Clean,
    Partial {
        cols: usize,
        rows: usize,
        cells: BitVec<usize, Lsb0>,
    },
}

impl DirtyRegion {
    pub fn full() -> Self {
        DirtyRegion::Full
    }

    fn grid_dims(region: IntRect) -> (usize, usize) {
        let cols = ((region.width() + CELL_SIZE - 1) / CELL_SIZE).max(1) as usize;
        let rows = ((region.height() + CELL_SIZE - 1) / CELL_SIZE).max(1) as usize;
        (cols, rows)
    }

    fn cell_range(region: IntRect, rect: IntRect) -> Option<(usize, usize, usize, usize)> {
        let clipped = region.intersect(&rect);
        if clipped.is_empty() {
            return None;
        }
        let (cols, rows) = Self::grid_dims(region);
        let to_col = |x: i32| -> usize {
            (((x - region.min_x) / CELL_SIZE).clamp(0, cols as i32 - 1)) as usize
        };
        let to_row = |y: i32| -> usize {
            (((y - region.min_y) / CELL_SIZE).clamp(0, rows as i32 - 1)) as usize
        };
        let col_start = to_col(clipped.min_x);
        let col_end = to_col(clipped.max_x - 1);
        let row_start = to_row(clipped.min_y);
        let row_end = to_row(clipped.max_y - 1);
        Some((col_start, col_end, row_start, row_end))
    }

    pub fn mark_dirty(&mut self, region: IntRect, rect: IntRect) {
        let Some((col_start, col_end, row_start, row_end)) = Self::cell_range(region, rect) else {
            return;
        };
        match self {
            DirtyRegion::Full => {}
            DirtyRegion::Clean => {
                let (cols, rows) = Self::grid_dims(region);
                let mut cells = BitVec::repeat(false, cols * rows);
                for row in row_start..=row_end {
                    for col in col_start..=col_end {
                        cells.set(row * cols + col, true);
                    }
                }
                *self = DirtyRegion::Partial { cols, rows, cells };
            }
            DirtyRegion::Partial { cols, cells, .. } => {
                let cols = *cols;
                for row in row_start..=row_end {
                    for col in col_start..=col_end {
                        cells.set(row * cols + col, true);
                    }
                }
            }
        }
    }

    pub fn mark_clean(&mut self, region: IntRect, rect: IntRect) {
        match self {
            DirtyRegion::Clean => {}
            DirtyRegion::Full => {
                let (cols, rows) = Self::grid_dims(region);
                let mut cells = BitVec::repeat(true, cols * rows);
                if let Some((col_start, col_end, row_start, row_end)) =
                    Self::cell_range(region, rect)
                {
                    for row in row_start..=row_end {
                        for col in col_start..=col_end {
                            cells.set(row * cols + col, false);
                        }
                    }
                }
                if cells.not_any() {
                    *self = DirtyRegion::Clean;
                } else {
                    *self = DirtyRegion::Partial { cols, rows, cells };
                }
            }
            DirtyRegion::Partial { cols, cells, .. } => {
                let cols = *cols;
                if let Some((col_start, col_end, row_start, row_end)) =
                    Self::cell_range(region, rect)
                {
                    for row in row_start..=row_end {
                        for col in col_start..=col_end {
                            cells.set(row * cols + col, false);
                        }
                    }
                }
                if cells.not_any() {
                    *self = DirtyRegion::Clean;
                }
            }
        }
    }

    /// True when every cell intersecting `rect` is clean, meaning
    /// `paint_from_cache` may satisfy a request over `rect`.
    pub fn is_clean_over(&self, region: IntRect, rect: IntRect) -> bool {
        match self {
            DirtyRegion::Clean => true,
            DirtyRegion::Full => region.intersect(&rect).is_empty(),
            DirtyRegion::Partial { cols, cells, .. } => {
                let Some((col_start, col_end, row_start, row_end)) =
                    Self::cell_range(region, rect)
                else {
                    return true;
                };
                for row in row_start..=row_end {
                    for col in col_start..=col_end {
                        if cells[row * cols + col] {
                            return false;
                        }
                    }
                }
                true
            }
        }
    }
}
