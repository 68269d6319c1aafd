//! Structural-change notifications.
//!
//! Listeners observe mutations of the environment: tree edits, map
//! frame bindings and item removal. Events are delivered synchronously,
//! inside the mutating call, after the mutation is complete. Listeners
//! receive ids only and must not re-enter mutating environment calls
//! from within a callback.

use super::item::{FrameId, ItemRef, MapId};

/// One structural change of the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvironmentEvent {
    /// A frame was inserted under a parent.
    ChildAdded {
        /// Parent frame
        parent: FrameId,
        /// Inserted child
        child: FrameId,
    },
    /// A frame was removed from a parent's child set.
    ChildRemoved {
        /// Parent frame
        parent: FrameId,
        /// Removed child
        child: FrameId,
    },
    /// An item was detached from the environment.
    ItemDetached(ItemRef),
    /// A map was bound to a frame.
    FrameSet {
        /// The map
        map: MapId,
        /// The newly bound frame
        frame: FrameId,
    },
    /// A map's frame binding was removed.
    FrameDetached {
        /// The map
        map: MapId,
        /// The previously bound frame
        frame: FrameId,
    },
    /// Reported to a newly registered listener: the tree root.
    RootSet(FrameId),
    /// The environment (and with it the root) is going away.
    RootRemoved(FrameId),
}

/// Observer of structural environment changes.
///
/// All methods have empty default implementations; implement the ones
/// of interest. [`handle`](EnvironmentListener::handle) routes an event
/// to the matching method and is what the environment invokes.
pub trait EnvironmentListener {
    /// A frame gained a child.
    fn child_added(&mut self, _parent: FrameId, _child: FrameId) {}
    /// A frame lost a child.
    fn child_removed(&mut self, _parent: FrameId, _child: FrameId) {}
    /// An item left the environment.
    fn item_detached(&mut self, _item: ItemRef) {}
    /// A map was bound to a frame.
    fn frame_set(&mut self, _map: MapId, _frame: FrameId) {}
    /// A map's frame binding was removed.
    fn frame_detached(&mut self, _map: MapId, _frame: FrameId) {}
    /// The tree root, reported on listener registration.
    fn root_set(&mut self, _root: FrameId) {}
    /// The environment is being torn down.
    fn root_removed(&mut self, _root: FrameId) {}

    /// Route an event to the matching callback.
    fn handle(&mut self, event: &EnvironmentEvent) {
        match *event {
            EnvironmentEvent::ChildAdded { parent, child } => self.child_added(parent, child),
            EnvironmentEvent::ChildRemoved { parent, child } => self.child_removed(parent, child),
            EnvironmentEvent::ItemDetached(item) => self.item_detached(item),
            EnvironmentEvent::FrameSet { map, frame } => self.frame_set(map, frame),
            EnvironmentEvent::FrameDetached { map, frame } => self.frame_detached(map, frame),
            EnvironmentEvent::RootSet(root) => self.root_set(root),
            EnvironmentEvent::RootRemoved(root) => self.root_removed(root),
        }
    }
}
