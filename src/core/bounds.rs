//! Axis-aligned bounding boxes for spatial operations.
//!
//! [`Bounds2`] describes grid footprints in a map's local frame;
//! [`Bounds3`] tracks point-cloud extents. Both use the empty-box
//! convention (min > max) so that `expand_to_include` works without a
//! separate "first point" case.

use nalgebra::{Point2, Point3};

/// Axis-aligned bounding box in 2D.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2 {
    /// Minimum corner (smallest x and y values).
    pub min: Point2<f64>,
    /// Maximum corner (largest x and y values).
    pub max: Point2<f64>,
}

impl Bounds2 {
    /// Create a bounding box from min and max corners.
    #[inline]
    pub fn new(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self { min, max }
    }

    /// Create an empty (invalid) bounding box.
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Check if the bounds are empty (invalid).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Width of the bounding box (x extent).
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the bounding box (y extent).
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Center of the bounding box.
    #[inline]
    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Check if a point is inside the bounding box.
    #[inline]
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Grow the bounds to include a point.
    #[inline]
    pub fn expand_to_include(&mut self, point: &Point2<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }
}

/// Axis-aligned bounding box in 3D.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds3 {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Bounds3 {
    /// Create a bounding box from min and max corners.
    #[inline]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Create an empty (invalid) bounding box.
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Check if the bounds are empty (invalid).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Center of the bounding box.
    #[inline]
    pub fn center(&self) -> Point3<f64> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Check if a point is inside the bounding box.
    #[inline]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Grow the bounds to include a point.
    #[inline]
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_expands_to_point() {
        let mut b = Bounds2::empty();
        assert!(b.is_empty());

        b.expand_to_include(&Point2::new(1.0, 2.0));
        assert!(!b.is_empty());
        assert_eq!(b.min, Point2::new(1.0, 2.0));
        assert_eq!(b.max, Point2::new(1.0, 2.0));

        b.expand_to_include(&Point2::new(-1.0, 3.0));
        assert_eq!(b.min, Point2::new(-1.0, 2.0));
        assert_eq!(b.max, Point2::new(1.0, 3.0));
    }

    #[test]
    fn test_contains() {
        let b = Bounds2::new(Point2::new(0.0, 0.0), Point2::new(10.0, 8.0));
        assert!(b.contains(&Point2::new(5.0, 4.0)));
        assert!(b.contains(&Point2::new(0.0, 0.0)));
        assert!(!b.contains(&Point2::new(10.1, 4.0)));
    }

    #[test]
    fn test_bounds3_expand() {
        let mut b = Bounds3::empty();
        b.expand_to_include(&Point3::new(1.0, 2.0, 3.0));
        b.expand_to_include(&Point3::new(-1.0, 0.0, 5.0));
        assert_eq!(b.min, Point3::new(-1.0, 0.0, 3.0));
        assert_eq!(b.max, Point3::new(1.0, 2.0, 5.0));
        assert!((b.center().z - 4.0).abs() < 1e-12);
    }
}
