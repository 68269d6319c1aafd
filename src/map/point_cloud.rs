//! 3D point sets with optional per-point attributes.
//!
//! Point order is meaningful: the optional color, normal and variance
//! channels are index-aligned with the point list. Extents are derived
//! on demand rather than cached; recomputing is cheap relative to the
//! work done per point elsewhere.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::core::{Bounds3, Transform};

/// Dynamic list of 3D samples.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PointCloud {
    points: Vec<Point3<f64>>,
    colors: Vec<Vector3<f64>>,
    normals: Vec<Vector3<f64>>,
    variances: Vec<f64>,
}

impl PointCloud {
    /// Create an empty point cloud.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cloud from bare points.
    pub fn from_points(points: Vec<Point3<f64>>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Number of points
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the cloud holds no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point list
    #[inline]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Append a point.
    #[inline]
    pub fn push(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }

    /// Per-point colors, if the channel is populated.
    pub fn colors(&self) -> Option<&[Vector3<f64>]> {
        (!self.colors.is_empty()).then_some(self.colors.as_slice())
    }

    /// Per-point normals, if the channel is populated.
    pub fn normals(&self) -> Option<&[Vector3<f64>]> {
        (!self.normals.is_empty()).then_some(self.normals.as_slice())
    }

    /// Per-point height variances, if the channel is populated.
    pub fn variances(&self) -> Option<&[f64]> {
        (!self.variances.is_empty()).then_some(self.variances.as_slice())
    }

    /// Attach an index-aligned color channel.
    ///
    /// # Panics
    /// Panics if the channel length differs from the point count.
    pub fn set_colors(&mut self, colors: Vec<Vector3<f64>>) {
        assert_eq!(colors.len(), self.points.len());
        self.colors = colors;
    }

    /// Attach an index-aligned normal channel.
    ///
    /// # Panics
    /// Panics if the channel length differs from the point count.
    pub fn set_normals(&mut self, normals: Vec<Vector3<f64>>) {
        assert_eq!(normals.len(), self.points.len());
        self.normals = normals;
    }

    /// Attach an index-aligned variance channel.
    ///
    /// # Panics
    /// Panics if the channel length differs from the point count.
    pub fn set_variances(&mut self, variances: Vec<f64>) {
        assert_eq!(variances.len(), self.points.len());
        self.variances = variances;
    }

    /// Drop all points and attribute channels.
    pub fn clear(&mut self) {
        self.points.clear();
        self.colors.clear();
        self.normals.clear();
        self.variances.clear();
    }

    /// Bounding box of the points, recomputed on demand.
    pub fn extents(&self) -> Bounds3 {
        let mut bounds = Bounds3::empty();
        for p in &self.points {
            bounds.expand_to_include(p);
        }
        bounds
    }

    /// Copy of the cloud with points (and normals) mapped through a
    /// rigid transform. Colors and variances are carried unchanged.
    pub fn transformed(&self, t: &Transform) -> PointCloud {
        PointCloud {
            points: self.points.iter().map(|p| t * p).collect(),
            colors: self.colors.clone(),
            normals: self.normals.iter().map(|n| t.rotation * n).collect(),
            variances: self.variances.clone(),
        }
    }
}
