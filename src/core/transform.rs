//! Rigid-body transforms for the frame tree.
//!
//! A frame's local transform maps coordinates expressed in that frame
//! into its parent's frame. Composition along tree paths therefore
//! reads right-to-left: `t(parent) * t(child)` takes a point from the
//! child all the way up.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

/// SE(3) rigid transform (rotation + translation, f64).
pub type Transform = Isometry3<f64>;

/// Build a pure-translation transform.
#[inline]
pub fn translation(x: f64, y: f64, z: f64) -> Transform {
    Transform::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity())
}

/// Build a transform from a translation vector and a rotation.
#[inline]
pub fn from_parts(translation: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Transform {
    Transform::from_parts(Translation3::from(translation), rotation)
}

/// Check whether a transform is the identity within `eps`.
///
/// Used to skip per-point work when copying data between frames that
/// happen to coincide.
#[inline]
pub fn is_approx_identity(t: &Transform, eps: f64) -> bool {
    t.translation.vector.norm() <= eps && t.rotation.angle() <= eps
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;

    #[test]
    fn test_translation_builder() {
        let t = translation(1.0, 2.0, 3.0);
        let p = t * nalgebra::Point3::new(0.0, 0.0, 0.0);
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
        assert!((p.z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_identity_check() {
        assert!(is_approx_identity(&Transform::identity(), 1e-9));
        assert!(!is_approx_identity(&translation(0.1, 0.0, 0.0), 1e-9));

        let r = from_parts(
            Vector3::zeros(),
            UnitQuaternion::from_euler_angles(0.0, 0.0, 0.3),
        );
        assert!(!is_approx_identity(&r, 1e-9));
    }

    #[test]
    fn test_compose_inverse_is_identity() {
        let t = from_parts(
            Vector3::new(1.0, -2.0, 0.5),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        );
        let id = t * t.inverse();
        assert!(relative_eq!(id, Transform::identity(), epsilon = 1e-10));
    }
}
