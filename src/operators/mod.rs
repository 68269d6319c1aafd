//! Map-derivation operators.
//!
//! An operator reads a fixed set of input maps and recomputes a fixed
//! set of output maps on demand. The wiring (which maps, which bands)
//! is part of the operator value and is mirrored into ordered edge
//! lists on the registry node when the operator is attached or
//! reconfigured. `update_all` performs one full recomputation; results
//! are staged and committed at the end, so a failing run never leaves
//! a partially rewritten output.

pub mod surface_projection;
pub mod traversability;

use serde::{Deserialize, Serialize};

use crate::environment::MapId;

pub use surface_projection::{SurfaceProjection, SurfaceProjectionConfig};
pub use traversability::{TraversabilityClassifier, TraversabilityConfig};

/// The closed set of operator implementations.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum OperatorKind {
    /// Point cloud → multi-level surface grid.
    #[serde(rename = "surface_projection")]
    SurfaceProjection(SurfaceProjection),
    /// Scalar terrain layers → discrete traversability classes.
    #[serde(rename = "traversability")]
    Traversability(TraversabilityClassifier),
}

impl OperatorKind {
    /// Stable class name used as the persistence key.
    pub fn class_name(&self) -> &'static str {
        match self {
            OperatorKind::SurfaceProjection(_) => "surface_projection",
            OperatorKind::Traversability(_) => "traversability",
        }
    }

    /// Maximum number of input maps, `None` for unbounded.
    pub fn input_arity(&self) -> Option<usize> {
        match self {
            OperatorKind::SurfaceProjection(_) => Some(1),
            OperatorKind::Traversability(_) => None,
        }
    }

    /// Maximum number of output maps.
    pub fn output_arity(&self) -> Option<usize> {
        match self {
            OperatorKind::SurfaceProjection(_) => Some(1),
            OperatorKind::Traversability(_) => Some(1),
        }
    }

    pub(crate) fn input_maps(&self) -> Vec<MapId> {
        match self {
            OperatorKind::SurfaceProjection(op) => op.input_maps(),
            OperatorKind::Traversability(op) => op.input_maps(),
        }
    }

    pub(crate) fn output_maps(&self) -> Vec<MapId> {
        match self {
            OperatorKind::SurfaceProjection(op) => op.output_maps(),
            OperatorKind::Traversability(op) => op.output_maps(),
        }
    }
}

impl From<SurfaceProjection> for OperatorKind {
    fn from(op: SurfaceProjection) -> Self {
        OperatorKind::SurfaceProjection(op)
    }
}

impl From<TraversabilityClassifier> for OperatorKind {
    fn from(op: TraversabilityClassifier) -> Self {
        OperatorKind::Traversability(op)
    }
}

/// Registry node for an attached operator: the operator value plus the
/// recorded input/output edges.
#[derive(Clone, Debug)]
pub struct OperatorNode {
    pub(crate) kind: OperatorKind,
    pub(crate) inputs: Vec<MapId>,
    pub(crate) outputs: Vec<MapId>,
}

impl OperatorNode {
    pub(crate) fn new(kind: OperatorKind) -> Self {
        let inputs = kind.input_maps();
        let outputs = kind.output_maps();
        Self {
            kind,
            inputs,
            outputs,
        }
    }

    /// The operator value
    #[inline]
    pub fn kind(&self) -> &OperatorKind {
        &self.kind
    }

    /// Ordered input map edges
    #[inline]
    pub fn inputs(&self) -> &[MapId] {
        &self.inputs
    }

    /// Ordered output map edges
    #[inline]
    pub fn outputs(&self) -> &[MapId] {
        &self.outputs
    }

    pub(crate) fn reconfigure(&mut self, mutate: impl FnOnce(&mut OperatorKind)) {
        mutate(&mut self.kind);
        self.inputs = self.kind.input_maps();
        self.outputs = self.kind.output_maps();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_arity_bounds() {
        let projection: OperatorKind = SurfaceProjection::default().into();
        assert_eq!(projection.input_arity(), Some(1));
        assert_eq!(projection.output_arity(), Some(1));
        assert_eq!(projection.class_name(), "surface_projection");

        let classifier: OperatorKind = TraversabilityClassifier::default().into();
        assert_eq!(classifier.input_arity(), None);
        assert_eq!(classifier.output_arity(), Some(1));
        assert_eq!(classifier.class_name(), "traversability");
    }

    #[test]
    fn test_node_edges_follow_wiring() {
        let node = OperatorNode::new(SurfaceProjection::default().into());
        assert!(node.inputs().is_empty());
        assert!(node.outputs().is_empty());
    }
}
