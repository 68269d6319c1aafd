//! Multi-level surface grid: per-cell stacks of horizontal patches.
//!
//! Each cell holds an ordered list of [`SurfacePatch`] entries, one per
//! distinct surface crossing that cell's vertical column (e.g. floor
//! and tabletop). Patches are kept sorted ascending by mean height.

use serde::{Deserialize, Serialize};

use super::geometry::{CellIndex, GridGeometry};

/// One horizontal surface patch in a cell's vertical column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfacePatch {
    /// Mean height of the points forming the patch.
    pub mean: f64,
    /// Standard deviation of the contributing heights.
    pub stdev: f64,
    /// Vertical half-thickness assigned to the patch.
    pub thickness: f64,
}

/// Grid of per-cell surface patch stacks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceGrid {
    geometry: GridGeometry,
    cells: Vec<Vec<SurfacePatch>>,
}

impl SurfaceGrid {
    /// Create an empty surface grid over the given geometry.
    pub fn new(geometry: GridGeometry) -> Self {
        let cells = vec![Vec::new(); geometry.cell_count()];
        Self { geometry, cells }
    }

    /// Raster geometry of the grid
    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Patch stack of one cell, ascending by mean height.
    ///
    /// Out-of-range cells have no patches.
    pub fn patches(&self, cell: CellIndex) -> &[SurfacePatch] {
        if cell.col >= self.geometry.width() || cell.row >= self.geometry.height() {
            return &[];
        }
        &self.cells[self.geometry.index(cell)]
    }

    /// Patch stack of the cell containing a local-frame coordinate.
    pub fn patches_at(&self, x: f64, y: f64) -> &[SurfacePatch] {
        match self.geometry.to_cell(x, y) {
            Some(cell) => self.patches(cell),
            None => &[],
        }
    }

    /// Insert a patch, keeping the cell's stack sorted by mean height.
    ///
    /// # Panics
    /// Panics if the cell lies outside the raster.
    pub fn insert(&mut self, cell: CellIndex, patch: SurfacePatch) {
        let index = self.geometry.index(cell);
        let stack = &mut self.cells[index];
        let pos = stack.partition_point(|p| p.mean < patch.mean);
        stack.insert(pos, patch);
    }

    /// Total number of patches across all cells.
    pub fn patch_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Drop all patches.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Replace the whole patch field at once.
    ///
    /// # Panics
    /// Panics if `cells` does not match the geometry's cell count.
    pub(crate) fn set_cells(&mut self, cells: Vec<Vec<SurfacePatch>>) {
        assert_eq!(cells.len(), self.geometry.cell_count());
        self.cells = cells;
    }
}
