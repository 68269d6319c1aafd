//! # Kshetra-Env: Spatial Environment Model for Robot Navigation
//!
//! An environment representation library for robotics: a tree of
//! coordinate frames, typed map data attached to those frames, and
//! operators that derive new maps from existing ones. Downstream
//! planning and perception code asks questions like "what is the
//! elevation or traversability at world point P" against the model.
//!
//! ## Features
//!
//! - **Frame Tree**: SE(3) frames with cycle-safe reparenting and
//!   relative-transform composition between arbitrary frames
//! - **Multi-Band Grids**: named raster layers over a shared geometry,
//!   with per-band no-data sentinels
//! - **Point Clouds**: 3D samples with optional per-point attributes
//!   and frame-aware copies
//! - **Operators**: declared-arity derivation steps with idempotent
//!   full recomputation — surface projection (point cloud →
//!   multi-level surface grid) and traversability classification with
//!   narrow-passage closing
//! - **Spatial Queries**: first-match resolution of world points
//!   against overlapping, differently-posed grids
//!
//! ## Quick Start
//!
//! ```rust
//! use kshetra_env::{bands, Environment, GridAccess, GridGeometry};
//! use kshetra_env::core::transform;
//! use nalgebra::Point3;
//!
//! # fn main() -> kshetra_env::Result<()> {
//! let mut env = Environment::new();
//!
//! // a frame 1 m in front of the root, carrying an elevation map
//! let frame = env.create_frame(transform::translation(1.0, 0.0, 0.0));
//! let map = env.attach_map(bands::elevation_grid(GridGeometry::new(100, 100, 0.1, 0.1)));
//! env.set_frame(map, frame)?;
//!
//! // resolve a world point against all registered grids
//! let mut access = GridAccess::new();
//! access.register(&env, map, bands::ELEVATION)?;
//! let hit = access.resolve(&env, &Point3::new(1.5, 0.5, 0.0))?;
//! assert!(hit.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: transforms and bounding boxes
//! - [`environment`]: the registry — frame tree, item ownership,
//!   relations, change notifications
//! - [`map`]: map payloads (band grids, surface grids, point clouds)
//! - [`operators`]: the operator contract and the shipped operators
//! - [`query`]: cross-frame spatial resolution
//! - [`io`]: persistence and text interchange
//!
//! ## Concurrency
//!
//! Everything is single-threaded and synchronous: operations run to
//! completion on the caller's thread and the environment does no
//! internal locking. Wrap an [`Environment`] in your own mutex to
//! share it across threads.

pub mod core;
pub mod environment;
pub mod error;
pub mod io;
pub mod map;
pub mod operators;
pub mod query;

pub use environment::{
    Environment, EnvironmentEvent, EnvironmentListener, FrameId, ItemRef, MapId, OperatorId,
};
pub use error::{Error, Result};
pub use map::{
    bands, BandGrid, BandRef, CellIndex, GridGeometry, MapData, PointCloud, SurfaceGrid,
    SurfacePatch,
};
pub use operators::{
    OperatorKind, SurfaceProjection, SurfaceProjectionConfig, TraversabilityClassifier,
    TraversabilityConfig,
};
pub use query::{GridAccess, GridHit};
