//! Fundamental geometric types shared across the crate.

pub mod bounds;
pub mod transform;

pub use bounds::{Bounds2, Bounds3};
pub use transform::{is_approx_identity, Transform};
