//! Projects a point cloud into a multi-level surface grid.
//!
//! Each point is transformed into the output grid's frame and binned
//! into its cell; within a cell, points close in height form one
//! surface patch, and a vertical gap larger than the configured gap
//! size starts a new patch. A cell crossed by both a floor and a
//! tabletop therefore ends up with two patches.

use serde::{Deserialize, Serialize};

use crate::environment::{Environment, MapId};
use crate::error::{Error, Result};
use crate::map::SurfacePatch;

/// Patch-grouping parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SurfaceProjectionConfig {
    /// Vertical separation above which two point clusters in the same
    /// cell become distinct patches (world units).
    /// Default: 1.0
    pub gap_size: f64,

    /// Vertical half-thickness assigned to each produced patch
    /// (world units).
    /// Default: 0.05
    pub patch_thickness: f64,
}

impl Default for SurfaceProjectionConfig {
    fn default() -> Self {
        Self {
            gap_size: 1.0,
            patch_thickness: 0.05,
        }
    }
}

/// Point cloud → multi-level surface grid operator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceProjection {
    /// Patch grouping parameters; may be retuned between runs.
    pub config: SurfaceProjectionConfig,
    input: Option<MapId>,
    output: Option<MapId>,
}

impl SurfaceProjection {
    /// Create an unwired projection operator.
    pub fn new(config: SurfaceProjectionConfig) -> Self {
        Self {
            config,
            input: None,
            output: None,
        }
    }

    /// Wire the input point-cloud map.
    pub fn set_input(&mut self, cloud: MapId) {
        self.input = Some(cloud);
    }

    /// Wire the output surface-grid map.
    pub fn set_output(&mut self, surface: MapId) {
        self.output = Some(surface);
    }

    /// The wired input map
    #[inline]
    pub fn input(&self) -> Option<MapId> {
        self.input
    }

    /// The wired output map
    #[inline]
    pub fn output(&self) -> Option<MapId> {
        self.output
    }

    pub(crate) fn input_maps(&self) -> Vec<MapId> {
        self.input.into_iter().collect()
    }

    pub(crate) fn output_maps(&self) -> Vec<MapId> {
        self.output.into_iter().collect()
    }
}

impl Default for SurfaceProjection {
    fn default() -> Self {
        Self::new(SurfaceProjectionConfig::default())
    }
}

pub(crate) fn update(env: &mut Environment, op: &SurfaceProjection) -> Result<()> {
    let input = op
        .input
        .ok_or_else(|| Error::Configuration("no input point cloud wired".into()))?;
    let output = op
        .output
        .ok_or_else(|| Error::Configuration("no output surface grid wired".into()))?;

    let cloud_frame = env.map_frame(input)?.ok_or(Error::MapNotBound(input))?;
    let grid_frame = env.map_frame(output)?.ok_or(Error::MapNotBound(output))?;
    let to_grid = env.relative_transform(grid_frame, cloud_frame)?;
    let geometry = *env.surface(output)?.geometry();

    let mut binned: Vec<Vec<f64>> = vec![Vec::new(); geometry.cell_count()];
    let mut point_count = 0usize;
    {
        let cloud = env.cloud(input)?;
        for point in cloud.points() {
            let p = to_grid * point;
            if let Some(cell) = geometry.to_cell(p.x, p.y) {
                binned[geometry.index(cell)].push(p.z);
                point_count += 1;
            }
        }
    }

    let mut patch_count = 0usize;
    let mut cells: Vec<Vec<SurfacePatch>> = Vec::with_capacity(binned.len());
    for mut heights in binned {
        // ascending height fixes the summation order, so repeated runs
        // over unchanged input produce identical patches
        heights.sort_by(f64::total_cmp);

        let mut stack = Vec::new();
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut count = 0usize;
        let mut previous = 0.0;
        for &z in &heights {
            if count > 0 && z - previous > op.config.gap_size {
                stack.push(make_patch(sum, sum_sq, count, op.config.patch_thickness));
                sum = 0.0;
                sum_sq = 0.0;
                count = 0;
            }
            sum += z;
            sum_sq += z * z;
            count += 1;
            previous = z;
        }
        if count > 0 {
            stack.push(make_patch(sum, sum_sq, count, op.config.patch_thickness));
        }
        patch_count += stack.len();
        cells.push(stack);
    }

    env.surface_mut(output)?.set_cells(cells);
    log::debug!(
        "surface projection: {} points binned into {} patches",
        point_count,
        patch_count
    );
    Ok(())
}

fn make_patch(sum: f64, sum_sq: f64, count: usize, thickness: f64) -> SurfacePatch {
    let n = count as f64;
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);
    SurfacePatch {
        mean,
        stdev: variance.sqrt(),
        thickness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transform;
    use crate::map::{CellIndex, GridGeometry, MapData, PointCloud, SurfaceGrid};
    use nalgebra::Point3;

    fn setup(points: Vec<Point3<f64>>, config: SurfaceProjectionConfig) -> (Environment, MapId) {
        let mut env = Environment::new();
        let frame = env.create_frame(Transform::identity());

        let cloud = env.attach_map(MapData::Cloud(PointCloud::from_points(points)));
        env.set_frame(cloud, frame).unwrap();

        let surface = env.attach_map(MapData::Surface(SurfaceGrid::new(GridGeometry::new(
            10, 10, 1.0, 1.0,
        ))));
        env.set_frame(surface, frame).unwrap();

        let mut op = SurfaceProjection::new(config);
        op.set_input(cloud);
        op.set_output(surface);
        let op = env.attach_operator(op.into());
        env.update_all(op).unwrap();
        (env, surface)
    }

    #[test]
    fn test_close_points_merge_into_one_patch() {
        let config = SurfaceProjectionConfig {
            gap_size: 0.5,
            patch_thickness: 0.05,
        };
        let (env, surface) = setup(
            vec![Point3::new(2.5, 2.5, 1.0), Point3::new(2.7, 2.3, 1.2)],
            config,
        );

        let patches = env.surface(surface).unwrap().patches(CellIndex::new(2, 2));
        assert_eq!(patches.len(), 1);
        assert!((patches[0].mean - 1.1).abs() < 1e-12);
        assert!((patches[0].stdev - 0.1).abs() < 1e-12);
        assert!((patches[0].thickness - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_gap_splits_patches() {
        let config = SurfaceProjectionConfig {
            gap_size: 0.5,
            patch_thickness: 0.05,
        };
        let (env, surface) = setup(
            vec![Point3::new(2.5, 2.5, 0.0), Point3::new(2.5, 2.5, 0.8)],
            config,
        );

        let patches = env.surface(surface).unwrap().patches(CellIndex::new(2, 2));
        assert_eq!(patches.len(), 2);
        assert!((patches[0].mean - 0.0).abs() < 1e-12);
        assert!((patches[1].mean - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_points_outside_grid_skipped() {
        let (env, surface) = setup(
            vec![Point3::new(-1.0, 0.0, 0.0), Point3::new(20.0, 0.0, 0.0)],
            SurfaceProjectionConfig::default(),
        );
        assert_eq!(env.surface(surface).unwrap().patch_count(), 0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut env = Environment::new();
        let frame = env.create_frame(Transform::identity());
        let cloud = env.attach_map(MapData::Cloud(PointCloud::from_points(vec![
            Point3::new(0.5, 0.5, 0.3),
            Point3::new(0.5, 0.5, 0.4),
            Point3::new(3.5, 3.5, 2.0),
        ])));
        env.set_frame(cloud, frame).unwrap();
        let surface = env.attach_map(MapData::Surface(SurfaceGrid::new(GridGeometry::new(
            5, 5, 1.0, 1.0,
        ))));
        env.set_frame(surface, frame).unwrap();

        let mut op = SurfaceProjection::default();
        op.set_input(cloud);
        op.set_output(surface);
        let op = env.attach_operator(op.into());

        env.update_all(op).unwrap();
        let first: Vec<_> = env
            .surface(surface)
            .unwrap()
            .patches(CellIndex::new(0, 0))
            .to_vec();
        env.update_all(op).unwrap();
        let second: Vec<_> = env
            .surface(surface)
            .unwrap()
            .patches(CellIndex::new(0, 0))
            .to_vec();
        assert_eq!(first, second);
        assert_eq!(env.surface(surface).unwrap().patch_count(), 2);
    }

    #[test]
    fn test_unwired_operator_rejected() {
        let mut env = Environment::new();
        let op = env.attach_operator(SurfaceProjection::default().into());
        assert!(matches!(
            env.update_all(op),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_cloud_transformed_into_grid_frame() {
        let mut env = Environment::new();
        let cloud_frame = env.create_frame(crate::core::transform::translation(2.0, 0.0, 1.0));
        let grid_frame = env.create_frame(Transform::identity());

        let cloud = env.attach_map(MapData::Cloud(PointCloud::from_points(vec![Point3::new(
            0.5, 0.5, 0.0,
        )])));
        env.set_frame(cloud, cloud_frame).unwrap();
        let surface = env.attach_map(MapData::Surface(SurfaceGrid::new(GridGeometry::new(
            10, 10, 1.0, 1.0,
        ))));
        env.set_frame(surface, grid_frame).unwrap();

        let mut op = SurfaceProjection::default();
        op.set_input(cloud);
        op.set_output(surface);
        let op = env.attach_operator(op.into());
        env.update_all(op).unwrap();

        // the point lands in the cell shifted by the cloud frame's
        // translation, at the translated height
        let patches = env.surface(surface).unwrap().patches(CellIndex::new(2, 0));
        assert_eq!(patches.len(), 1);
        assert!((patches[0].mean - 1.0).abs() < 1e-12);
    }
}
