//! Cross-frame scalar lookup over a set of candidate grid maps.
//!
//! Candidates are registered once and then queried with points
//! expressed in the root frame. Each query transforms the point into
//! every candidate's local frame in registration order and returns the
//! first grid whose footprint contains it. Overlaps are deliberately
//! resolved by registration order, not by any notion of a "best" grid.

use nalgebra::Point3;

use crate::environment::{Environment, MapId};
use crate::error::{Error, Result};
use crate::map::{BandRef, CellIndex, MapData};

/// Successful resolution of a query point.
#[derive(Clone, Debug, PartialEq)]
pub struct GridHit {
    /// The grid that contains the point.
    pub map: MapId,
    /// Containing cell within that grid.
    pub cell: CellIndex,
    /// Band value at the cell.
    pub value: f64,
}

/// Registration-ordered list of queryable grid bands.
#[derive(Clone, Debug, Default)]
pub struct GridAccess {
    candidates: Vec<BandRef>,
}

impl GridAccess {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered candidates
    #[inline]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Check if no candidates are registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Append a candidate grid band.
    ///
    /// The map must be grid-backed, bound to a frame and carry the
    /// requested band.
    pub fn register(&mut self, env: &Environment, map: MapId, band: &str) -> Result<()> {
        let has_band = match env.map(map)? {
            MapData::GridF32(grid) => grid.has_band(band),
            MapData::GridU8(grid) => grid.has_band(band),
            _ => {
                return Err(Error::MapType {
                    map,
                    expected: "grid.f32 or grid.u8",
                })
            }
        };
        if !has_band {
            return Err(Error::BandMissing {
                map,
                band: band.to_owned(),
            });
        }
        if env.map_frame(map)?.is_none() {
            return Err(Error::MapNotBound(map));
        }
        self.candidates.push(BandRef::new(map, band));
        Ok(())
    }

    /// Resolve a point given in the root frame against the candidates.
    ///
    /// Returns the first containing grid in registration order, or
    /// `None` when no candidate contains the point. Candidates whose
    /// map or frame has been detached since registration surface as
    /// errors rather than being skipped.
    pub fn resolve(&self, env: &Environment, point: &Point3<f64>) -> Result<Option<GridHit>> {
        let root = env.root();
        for candidate in &self.candidates {
            let frame = env
                .map_frame(candidate.map)?
                .ok_or(Error::MapNotBound(candidate.map))?;
            let to_grid = env.relative_transform(frame, root)?;
            let local = to_grid * point;

            let resolved = match env.map(candidate.map)? {
                MapData::GridF32(grid) => grid
                    .geometry()
                    .to_cell(local.x, local.y)
                    .map(|cell| (cell, grid.get(&candidate.band, cell).map(f64::from))),
                MapData::GridU8(grid) => grid
                    .geometry()
                    .to_cell(local.x, local.y)
                    .map(|cell| (cell, grid.get(&candidate.band, cell).map(f64::from))),
                _ => {
                    return Err(Error::MapType {
                        map: candidate.map,
                        expected: "grid.f32 or grid.u8",
                    })
                }
            };
            if let Some((cell, value)) = resolved {
                let value = value.ok_or_else(|| Error::BandMissing {
                    map: candidate.map,
                    band: candidate.band.clone(),
                })?;
                return Ok(Some(GridHit {
                    map: candidate.map,
                    cell,
                    value,
                }));
            }
        }
        Ok(None)
    }

    /// Resolve a point and patch its z coordinate with the band value
    /// (elevation-style lookup). Returns whether a grid contained the
    /// point.
    pub fn resolve_elevation(&self, env: &Environment, point: &mut Point3<f64>) -> Result<bool> {
        match self.resolve(env, point)? {
            Some(hit) => {
                point.z = hit.value;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
