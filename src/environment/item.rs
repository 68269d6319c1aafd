//! Item identifiers.
//!
//! Every entity owned by an environment (frame, map, operator) gets a
//! unique id from one shared counter at attach time. Ids are stable for
//! the environment's lifetime and survive persistence round-trips.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a frame in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameId(pub(crate) u64);

/// Identifier of an attached map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(pub(crate) u64);

/// Identifier of an attached operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperatorId(pub(crate) u64);

impl FrameId {
    /// Raw id value
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl MapId {
    /// Raw id value
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl OperatorId {
    /// Raw id value
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to any owned item, for detach notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemRef {
    /// A frame
    Frame(FrameId),
    /// A map
    Map(MapId),
    /// An operator
    Operator(OperatorId),
}
