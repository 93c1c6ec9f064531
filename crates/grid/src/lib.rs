//! # Puzzle Grid
//!
//! Deterministic decomposition of a reference image's dimensions into a grid
//! of overlapping, fixed-size regions. The grid is the indexing skeleton of a
//! puzzle: each cell later receives a descriptor and becomes a candidate
//! location during matching.
//!
//! ## Contract
//!
//! - The output is a pure function of `(width, height, config)` with no I/O
//!   and no reliance on global process state.
//! - Cells are generated in row-major order; the position of a cell in
//!   [`PuzzleGrid::cells`] is its discovery index, which downstream ranking
//!   uses as a deterministic tie-breaker.
//! - Every cell is exactly `window_size × window_size` and lies fully inside
//!   the image. Trailing strips narrower than one window are dropped, so the
//!   right/bottom edges of an image whose dimensions are not window-aligned
//!   are not covered.
//!
//! ## Example
//!
//! ```
//! use grid::{build_grid, GridConfig};
//!
//! let grid = build_grid(300, 200, &GridConfig::default()).unwrap();
//! assert_eq!((grid.rows, grid.cols), (3, 5));
//! assert_eq!(grid.cells.len(), 15);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while validating grid parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("invalid grid config: window_size must be > 0")]
    InvalidWindowSize,
    #[error("invalid grid config: overlap {overlap} must be < window_size {window_size}")]
    InvalidOverlap { window_size: u32, overlap: u32 },
}

/// Window geometry for grid construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridConfig {
    /// Side length of each square region, in pixels.
    #[serde(default = "GridConfig::default_window_size")]
    pub window_size: u32,
    /// Overlap between adjacent regions, in pixels. The stride between region
    /// origins is `window_size - overlap`.
    #[serde(default = "GridConfig::default_overlap")]
    pub overlap: u32,
}

impl GridConfig {
    pub(crate) fn default_window_size() -> u32 {
        100
    }

    pub(crate) fn default_overlap() -> u32 {
        50
    }

    pub fn with_window_size(mut self, window_size: u32) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_overlap(mut self, overlap: u32) -> Self {
        self.overlap = overlap;
        self
    }

    /// Distance between origins of adjacent regions.
    ///
    /// Meaningful only for configs that pass [`validate`](Self::validate).
    pub fn stride(&self) -> u32 {
        self.window_size.saturating_sub(self.overlap)
    }

    /// Check the window/overlap relationship.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.window_size == 0 {
            return Err(GridError::InvalidWindowSize);
        }
        if self.overlap >= self.window_size {
            return Err(GridError::InvalidOverlap {
                window_size: self.window_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            window_size: Self::default_window_size(),
            overlap: Self::default_overlap(),
        }
    }
}

/// Placement of one region inside the source image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RegionGeometry {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The full set of region placements for one image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PuzzleGrid {
    pub rows: usize,
    pub cols: usize,
    /// Region placements in row-major discovery order.
    pub cells: Vec<RegionGeometry>,
}

impl PuzzleGrid {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Partition `width × height` into overlapping regions.
///
/// An image smaller than one window in either dimension yields an empty grid
/// rather than an error; whether an empty descriptor set is acceptable is the
/// caller's decision.
pub fn build_grid(width: u32, height: u32, cfg: &GridConfig) -> Result<PuzzleGrid, GridError> {
    cfg.validate()?;

    let window = cfg.window_size;
    let stride = window - cfg.overlap;

    if width < window || height < window {
        return Ok(PuzzleGrid {
            rows: 0,
            cols: 0,
            cells: Vec::new(),
        });
    }

    let rows = ((height - window) / stride + 1) as usize;
    let cols = ((width - window) / stride + 1) as usize;

    let mut cells = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        let y = row as u32 * stride;
        for col in 0..cols {
            let x = col as u32 * stride;
            cells.push(RegionGeometry {
                x,
                y,
                width: window,
                height: window,
            });
        }
    }

    Ok(PuzzleGrid { rows, cols, cells })
}
