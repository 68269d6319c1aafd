//! Map data types: grid-backed and point-set-backed spatial layers.
//!
//! All map payloads are plain values until attached to an
//! [`Environment`](crate::environment::Environment); the environment
//! then owns them and binds each to at most one frame.

pub mod band_grid;
pub mod bands;
pub mod geometry;
pub mod point_cloud;
pub mod surface;

use serde::{Deserialize, Serialize};

pub use band_grid::{BandGrid, BandValue};
pub use geometry::{CellIndex, GridGeometry};
pub use point_cloud::PointCloud;
pub use surface::{SurfaceGrid, SurfacePatch};

use crate::environment::MapId;

/// The closed set of map payloads.
///
/// Each variant carries a stable class name used by the persistence
/// layer.
#[derive(Clone, Debug)]
pub enum MapData {
    /// Scalar raster (elevation, slope, distance, confidence, ...).
    GridF32(BandGrid<f32>),
    /// Discrete raster (traversability classes, image channels, ...).
    GridU8(BandGrid<u8>),
    /// Multi-level surface grid.
    Surface(SurfaceGrid),
    /// 3D point set.
    Cloud(PointCloud),
}

impl MapData {
    /// Stable class name used as the persistence key.
    pub fn class_name(&self) -> &'static str {
        match self {
            MapData::GridF32(_) => "grid.f32",
            MapData::GridU8(_) => "grid.u8",
            MapData::Surface(_) => "surface",
            MapData::Cloud(_) => "cloud",
        }
    }

    /// Raster geometry, for the grid-backed variants.
    pub fn geometry(&self) -> Option<&GridGeometry> {
        match self {
            MapData::GridF32(g) => Some(g.geometry()),
            MapData::GridU8(g) => Some(g.geometry()),
            MapData::Surface(s) => Some(s.geometry()),
            MapData::Cloud(_) => None,
        }
    }
}

/// Reference to one band of one grid map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandRef {
    /// The grid map.
    pub map: MapId,
    /// Band name within the map.
    pub band: String,
}

impl BandRef {
    /// Create a band reference
    pub fn new(map: MapId, band: impl Into<String>) -> Self {
        Self {
            map,
            band: band.into(),
        }
    }
}
