//! Error types for kshetra-env.

use crate::environment::{FrameId, MapId, OperatorId};

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Environment error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reparenting would turn the frame tree into a graph
    #[error("reparenting frame {frame} under {new_parent} would create a cycle")]
    Cycle {
        /// Frame that was being reparented
        frame: FrameId,
        /// Requested new parent
        new_parent: FrameId,
    },

    /// Operator invoked with missing or inconsistent configuration
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Referenced frame id is not attached to the environment
    #[error("no frame with id {0}")]
    FrameNotFound(FrameId),

    /// Referenced map id is not attached to the environment
    #[error("no map with id {0}")]
    MapNotFound(MapId),

    /// Referenced operator id is not attached to the environment
    #[error("no operator with id {0}")]
    OperatorNotFound(OperatorId),

    /// A map exists but is not the kind the caller asked for
    #[error("map {map} is not backed by {expected}")]
    MapType {
        /// Offending map
        map: MapId,
        /// Expected storage class
        expected: &'static str,
    },

    /// A required band has not been allocated on a grid map
    #[error("map {map} has no band named \"{band}\"")]
    BandMissing {
        /// Grid map that was queried
        map: MapId,
        /// Requested band name
        band: String,
    },

    /// The operation needs the map to be bound to a frame
    #[error("map {0} is not bound to a frame")]
    MapNotBound(MapId),

    /// Frames can only be detached once they are leaves without maps
    #[error("frame {0} still has children or bound maps")]
    FrameInUse(FrameId),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed persisted data
    #[error("invalid format: {0}")]
    Format(String),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No loader registered for a persisted map class
    #[error("no loader registered for map class \"{0}\"")]
    UnknownClass(String),
}
