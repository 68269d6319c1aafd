//! Spatial queries against attached maps.

pub mod grid_access;

pub use grid_access::{GridAccess, GridHit};
