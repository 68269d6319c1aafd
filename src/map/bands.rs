//! Standard band names and constructors for the stock map types.
//!
//! Downstream code addresses grid layers by these names; the
//! constructors pre-allocate the bands each map type is expected to
//! carry.

use super::band_grid::BandGrid;
use super::geometry::GridGeometry;
use super::MapData;
use crate::operators::traversability::CLASS_UNKNOWN;

/// Lower envelope of the elevation measurements per cell.
pub const ELEVATION_MIN: &str = "elevation_min";
/// Upper envelope of the elevation measurements per cell.
pub const ELEVATION_MAX: &str = "elevation_max";
/// Default elevation band (references the max band).
pub const ELEVATION: &str = ELEVATION_MAX;

/// Discrete traversability class per cell.
pub const TRAVERSABILITY: &str = "traversability";
/// Measurement confidence per cell.
pub const CONFIDENCE: &str = "confidence";
/// Range measurement per cell.
pub const DISTANCE: &str = "distance";
/// Occupancy likelihood per cell.
pub const OCCUPANCY: &str = "occupancy";

/// Terrain slope angle (radians) per cell.
pub const SLOPE: &str = "slope";
/// Largest vertical step within a cell.
pub const MAX_STEP: &str = "max_step";
/// Maximum tractive force available in a cell.
pub const MAX_FORCE: &str = "max_force";

/// Red image channel.
pub const RED: &str = "r";
/// Green image channel.
pub const GREEN: &str = "g";
/// Blue image channel.
pub const BLUE: &str = "b";

/// Elevation map with min/max envelope bands.
pub fn elevation_grid(geometry: GridGeometry) -> MapData {
    let mut grid = BandGrid::new(geometry);
    grid.band_mut(ELEVATION_MIN);
    grid.band_mut(ELEVATION_MAX);
    MapData::GridF32(grid)
}

/// Discrete traversability-class map. The class band's no-data
/// sentinel is the unknown class.
pub fn traversability_grid(geometry: GridGeometry) -> MapData {
    let mut grid = BandGrid::new(geometry);
    grid.band_mut(TRAVERSABILITY);
    grid.set_no_data(TRAVERSABILITY, CLASS_UNKNOWN);
    MapData::GridU8(grid)
}

/// Confidence map.
pub fn confidence_grid(geometry: GridGeometry) -> MapData {
    let mut grid = BandGrid::new(geometry);
    grid.band_mut(CONFIDENCE);
    MapData::GridF32(grid)
}

/// Range map with a confidence companion band.
pub fn distance_grid(geometry: GridGeometry) -> MapData {
    let mut grid = BandGrid::new(geometry);
    grid.band_mut(DISTANCE);
    grid.band_mut(CONFIDENCE);
    MapData::GridF32(grid)
}

/// Occupancy map.
pub fn occupancy_grid(geometry: GridGeometry) -> MapData {
    let mut grid = BandGrid::new(geometry);
    grid.band_mut(OCCUPANCY);
    MapData::GridF32(grid)
}

/// RGB raster with one byte band per channel.
pub fn rgb_image(geometry: GridGeometry) -> MapData {
    let mut grid = BandGrid::new(geometry);
    grid.band_mut(RED);
    grid.band_mut(GREEN);
    grid.band_mut(BLUE);
    MapData::GridU8(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevation_grid_bands() {
        let map = elevation_grid(GridGeometry::new(4, 4, 0.5, 0.5));
        let MapData::GridF32(grid) = map else {
            panic!("expected f32 grid");
        };
        assert!(grid.has_band(ELEVATION_MIN));
        assert!(grid.has_band(ELEVATION_MAX));
        assert!(grid.no_data(ELEVATION_MAX).is_none());
    }

    #[test]
    fn test_traversability_grid_sentinel() {
        let map = traversability_grid(GridGeometry::new(4, 4, 0.5, 0.5));
        let MapData::GridU8(grid) = map else {
            panic!("expected u8 grid");
        };
        assert_eq!(grid.no_data(TRAVERSABILITY), Some(CLASS_UNKNOWN));
    }

    #[test]
    fn test_rgb_image_bands() {
        let map = rgb_image(GridGeometry::new(2, 2, 1.0, 1.0));
        let MapData::GridU8(grid) = map else {
            panic!("expected u8 grid");
        };
        assert_eq!(grid.band_names().count(), 3);
    }
}
