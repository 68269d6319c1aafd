//! Raster geometry shared by all grid-backed map types.
//!
//! The geometry fixes cell dimensions, per-axis scale and origin offset
//! at construction; every band (or patch stack) of a map indexes cells
//! through the same geometry. Cell `(col, row)` covers the local
//! coordinate range starting at `(offset_x + col * scale_x,
//! offset_y + row * scale_y)`.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::core::Bounds2;

/// Integer cell address inside a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellIndex {
    /// Column index (x axis).
    pub col: usize,
    /// Row index (y axis).
    pub row: usize,
}

impl CellIndex {
    /// Create a new cell index
    #[inline]
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// Immutable raster geometry: dimensions, scale and origin offset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    width: usize,
    height: usize,
    scale_x: f64,
    scale_y: f64,
    offset_x: f64,
    offset_y: f64,
}

impl GridGeometry {
    /// Create a geometry with its origin cell at the local origin.
    ///
    /// # Panics
    /// Panics if either scale is not strictly positive.
    pub fn new(width: usize, height: usize, scale_x: f64, scale_y: f64) -> Self {
        Self::with_offset(width, height, scale_x, scale_y, 0.0, 0.0)
    }

    /// Create a geometry whose cell (0, 0) starts at the given offset.
    ///
    /// # Panics
    /// Panics if either scale is not strictly positive.
    pub fn with_offset(
        width: usize,
        height: usize,
        scale_x: f64,
        scale_y: f64,
        offset_x: f64,
        offset_y: f64,
    ) -> Self {
        assert!(
            scale_x > 0.0 && scale_y > 0.0,
            "grid scale must be strictly positive"
        );
        Self {
            width,
            height,
            scale_x,
            scale_y,
            offset_x,
            offset_y,
        }
    }

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell size along x (meters per cell)
    #[inline]
    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    /// Cell size along y (meters per cell)
    #[inline]
    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Local x coordinate of the grid's first cell edge
    #[inline]
    pub fn offset_x(&self) -> f64 {
        self.offset_x
    }

    /// Local y coordinate of the grid's first cell edge
    #[inline]
    pub fn offset_y(&self) -> f64 {
        self.offset_y
    }

    /// Total number of cells
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Map a local-frame coordinate to its containing cell.
    ///
    /// Returns `None` when the coordinate falls outside the raster.
    #[inline]
    pub fn to_cell(&self, x: f64, y: f64) -> Option<CellIndex> {
        let col = ((x - self.offset_x) / self.scale_x).floor();
        let row = ((y - self.offset_y) / self.scale_y).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col < self.width && row < self.height {
            Some(CellIndex::new(col, row))
        } else {
            None
        }
    }

    /// Local coordinate of a cell's low corner.
    #[inline]
    pub fn cell_origin(&self, cell: CellIndex) -> Point2<f64> {
        Point2::new(
            self.offset_x + cell.col as f64 * self.scale_x,
            self.offset_y + cell.row as f64 * self.scale_y,
        )
    }

    /// Local coordinate of a cell's center.
    #[inline]
    pub fn cell_center(&self, cell: CellIndex) -> Point2<f64> {
        Point2::new(
            self.offset_x + (cell.col as f64 + 0.5) * self.scale_x,
            self.offset_y + (cell.row as f64 + 0.5) * self.scale_y,
        )
    }

    /// Flat row-major index of a cell.
    ///
    /// # Panics
    /// Panics (in debug builds) if the cell lies outside the raster.
    #[inline]
    pub fn index(&self, cell: CellIndex) -> usize {
        debug_assert!(cell.col < self.width && cell.row < self.height);
        cell.row * self.width + cell.col
    }

    /// Check if a local-frame coordinate lies inside the raster.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.to_cell(x, y).is_some()
    }

    /// Footprint of the raster in its own local frame.
    pub fn extents(&self) -> Bounds2 {
        Bounds2::new(
            Point2::new(self.offset_x, self.offset_y),
            Point2::new(
                self.offset_x + self.width as f64 * self.scale_x,
                self.offset_y + self.height as f64 * self.scale_y,
            ),
        )
    }
}
