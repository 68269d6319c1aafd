//! Multi-band raster storage with per-band no-data sentinels.
//!
//! A [`BandGrid`] keeps any number of named layers ("bands") over one
//! shared [`GridGeometry`]. Bands are allocated lazily on first write
//! at the shared dimensions, so every band of a grid always has the
//! same size. A band may carry a no-data sentinel: cells equal to the
//! sentinel mean "unknown", distinct from any valid measurement. A
//! band without a sentinel has no unknown cells, and callers must
//! check for the sentinel's presence before relying on it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::geometry::{CellIndex, GridGeometry};

/// Element types usable as band storage.
pub trait BandValue: Copy + PartialEq + Default {}

impl BandValue for f32 {}
impl BandValue for f64 {}
impl BandValue for u8 {}
impl BandValue for i32 {}

/// One named raster layer: dense row-major data plus an optional
/// no-data sentinel.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct Band<T> {
    data: Vec<T>,
    no_data: Option<T>,
}

/// Multi-band 2D raster.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BandGrid<T: BandValue> {
    geometry: GridGeometry,
    bands: BTreeMap<String, Band<T>>,
}

impl<T: BandValue> BandGrid<T> {
    /// Create an empty grid over the given geometry.
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            bands: BTreeMap::new(),
        }
    }

    /// Raster geometry shared by all bands
    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Names of the allocated bands, in lexical order.
    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.keys().map(String::as_str)
    }

    /// Check whether a band has been allocated.
    #[inline]
    pub fn has_band(&self, name: &str) -> bool {
        self.bands.contains_key(name)
    }

    /// Read-only access to a band's row-major data.
    ///
    /// Returns `None` if the band has never been written.
    pub fn band(&self, name: &str) -> Option<&[T]> {
        self.bands.get(name).map(|b| b.data.as_slice())
    }

    /// Mutable access to a band's row-major data, allocating it at the
    /// grid dimensions (filled with `T::default()`) on first use.
    pub fn band_mut(&mut self, name: &str) -> &mut [T] {
        let count = self.geometry.cell_count();
        self.bands
            .entry(name.to_owned())
            .or_insert_with(|| Band {
                data: vec![T::default(); count],
                no_data: None,
            })
            .data
            .as_mut_slice()
    }

    /// No-data sentinel of a band, if one was configured.
    pub fn no_data(&self, name: &str) -> Option<T> {
        self.bands.get(name).and_then(|b| b.no_data)
    }

    /// Configure the no-data sentinel of a band, allocating the band
    /// if necessary.
    pub fn set_no_data(&mut self, name: &str, value: T) {
        let count = self.geometry.cell_count();
        self.bands
            .entry(name.to_owned())
            .or_insert_with(|| Band {
                data: vec![T::default(); count],
                no_data: None,
            })
            .no_data = Some(value);
    }

    /// Read one cell of a band.
    ///
    /// Returns `None` if the band is absent or the cell is out of
    /// range.
    pub fn get(&self, name: &str, cell: CellIndex) -> Option<T> {
        if cell.col >= self.geometry.width() || cell.row >= self.geometry.height() {
            return None;
        }
        self.bands
            .get(name)
            .map(|b| b.data[self.geometry.index(cell)])
    }

    /// Write one cell of a band, allocating the band on first use.
    ///
    /// # Panics
    /// Panics if the cell lies outside the raster.
    pub fn set(&mut self, name: &str, cell: CellIndex, value: T) {
        let index = self.geometry.index(cell);
        self.band_mut(name)[index] = value;
    }

    /// Check whether a cell holds the band's no-data sentinel.
    ///
    /// A band without a configured sentinel reports every cell as
    /// valid data.
    pub fn is_no_data(&self, name: &str, cell: CellIndex) -> bool {
        match (self.no_data(name), self.get(name, cell)) {
            (Some(sentinel), Some(value)) => value == sentinel,
            _ => false,
        }
    }

    /// Fill an entire band with one value, allocating it on first use.
    pub fn fill(&mut self, name: &str, value: T) {
        self.band_mut(name).fill(value);
    }
}
