//! The environment registry: frame tree, attached maps and operators.
//!
//! An [`Environment`] exclusively owns every frame, map and operator,
//! addresses them by stable ids, and records the relations between
//! them: the parent/child tree over frames, the map→frame bindings,
//! and the operator input/output edges. Structural mutations notify
//! registered [`EnvironmentListener`]s synchronously.
//!
//! The environment is single-threaded by design: every operation runs
//! to completion on the caller's thread and no internal locking is
//! provided. Callers sharing one environment across threads must add
//! their own mutual exclusion.

pub mod event;
pub mod frame;
pub mod item;

use std::collections::HashMap;

use crate::core::transform::is_approx_identity;
use crate::core::Transform;
use crate::error::{Error, Result};
use crate::map::{BandGrid, MapData, PointCloud, SurfaceGrid};
use crate::operators::{OperatorKind, OperatorNode};

pub use event::{EnvironmentEvent, EnvironmentListener};
pub use frame::FrameNode;
pub use item::{FrameId, ItemRef, MapId, OperatorId};

/// An attached map and its optional frame binding.
#[derive(Clone, Debug)]
pub(crate) struct MapNode {
    pub(crate) data: MapData,
    pub(crate) frame: Option<FrameId>,
}

/// Registry owning frames, maps and operators.
pub struct Environment {
    pub(crate) next_id: u64,
    pub(crate) root: FrameId,
    pub(crate) frames: HashMap<FrameId, FrameNode>,
    pub(crate) maps: HashMap<MapId, MapNode>,
    pub(crate) operators: HashMap<OperatorId, OperatorNode>,
    pub(crate) listeners: Vec<Box<dyn EnvironmentListener>>,
}

impl Environment {
    /// Create an environment with a fresh root frame at the identity
    /// transform.
    pub fn new() -> Self {
        let root = FrameId(1);
        let mut frames = HashMap::new();
        frames.insert(root, FrameNode::new(Transform::identity(), None));
        Self {
            next_id: 2,
            root,
            frames,
            maps: HashMap::new(),
            operators: HashMap::new(),
            listeners: Vec::new(),
        }
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn emit(&mut self, event: EnvironmentEvent) {
        if self.listeners.is_empty() {
            return;
        }
        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in listeners.iter_mut() {
            listener.handle(&event);
        }
        // keep any listeners registered during dispatch
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }

    /// Register a listener. It immediately receives the current root
    /// via `root_set`.
    pub fn add_listener(&mut self, mut listener: Box<dyn EnvironmentListener>) {
        listener.handle(&EnvironmentEvent::RootSet(self.root));
        self.listeners.push(listener);
    }

    // === Frames ===

    /// The root frame
    #[inline]
    pub fn root(&self) -> FrameId {
        self.root
    }

    /// Create a frame under the root and return its id.
    pub fn create_frame(&mut self, transform: Transform) -> FrameId {
        let id = FrameId(self.alloc_id());
        self.frames.insert(id, FrameNode::new(transform, Some(self.root)));
        let root = self.root;
        if let Some(node) = self.frames.get_mut(&root) {
            node.children.push(id);
        }
        self.emit(EnvironmentEvent::ChildAdded {
            parent: root,
            child: id,
        });
        id
    }

    /// Look up a frame node.
    pub fn frame(&self, id: FrameId) -> Result<&FrameNode> {
        self.frames.get(&id).ok_or(Error::FrameNotFound(id))
    }

    /// Local transform of a frame into its parent.
    pub fn transform_to_parent(&self, id: FrameId) -> Result<Transform> {
        Ok(self.frame(id)?.transform())
    }

    /// Replace a frame's local transform.
    pub fn set_transform(&mut self, id: FrameId, transform: Transform) -> Result<()> {
        let node = self.frames.get_mut(&id).ok_or(Error::FrameNotFound(id))?;
        node.transform = transform;
        Ok(())
    }

    /// Children of a frame, in attach order.
    pub fn children(&self, id: FrameId) -> Result<&[FrameId]> {
        Ok(self.frame(id)?.children())
    }

    /// Parent of a frame, `None` only for the root.
    pub fn parent(&self, id: FrameId) -> Result<Option<FrameId>> {
        Ok(self.frame(id)?.parent())
    }

    /// All frame ids, ascending.
    pub fn frame_ids(&self) -> Vec<FrameId> {
        let mut ids: Vec<FrameId> = self.frames.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Move a frame under a new parent.
    ///
    /// The frame is removed from its old parent's child set and
    /// inserted under the new parent. Fails with [`Error::Cycle`] if
    /// the new parent is the frame itself or one of its descendants;
    /// the tree is left untouched on failure. Reparenting to the
    /// current parent is a no-op.
    pub fn set_parent(&mut self, frame: FrameId, new_parent: FrameId) -> Result<()> {
        if !self.frames.contains_key(&frame) {
            return Err(Error::FrameNotFound(frame));
        }
        if !self.frames.contains_key(&new_parent) {
            return Err(Error::FrameNotFound(new_parent));
        }
        if frame == self.root {
            return Err(Error::Configuration(
                "the root frame cannot be reparented".into(),
            ));
        }

        // cycle check before any mutation: the new parent must not sit
        // in the subtree rooted at `frame`
        let mut cursor = Some(new_parent);
        while let Some(f) = cursor {
            if f == frame {
                return Err(Error::Cycle { frame, new_parent });
            }
            cursor = self.frames[&f].parent;
        }

        let old_parent = self.frames[&frame].parent;
        if old_parent == Some(new_parent) {
            return Ok(());
        }

        if let Some(old) = old_parent {
            if let Some(node) = self.frames.get_mut(&old) {
                node.children.retain(|&c| c != frame);
            }
            self.emit(EnvironmentEvent::ChildRemoved {
                parent: old,
                child: frame,
            });
        }
        if let Some(node) = self.frames.get_mut(&frame) {
            node.parent = Some(new_parent);
        }
        if let Some(node) = self.frames.get_mut(&new_parent) {
            node.children.push(frame);
        }
        self.emit(EnvironmentEvent::ChildAdded {
            parent: new_parent,
            child: frame,
        });
        Ok(())
    }

    /// Remove a leaf frame with no bound maps from the environment.
    pub fn detach_frame(&mut self, frame: FrameId) -> Result<()> {
        let node = self.frames.get(&frame).ok_or(Error::FrameNotFound(frame))?;
        if frame == self.root {
            return Err(Error::Configuration(
                "the root frame cannot be detached".into(),
            ));
        }
        if !node.children.is_empty() || self.maps.values().any(|m| m.frame == Some(frame)) {
            return Err(Error::FrameInUse(frame));
        }
        let parent = node.parent;
        if let Some(p) = parent {
            if let Some(pn) = self.frames.get_mut(&p) {
                pn.children.retain(|&c| c != frame);
            }
            self.emit(EnvironmentEvent::ChildRemoved {
                parent: p,
                child: frame,
            });
        }
        self.frames.remove(&frame);
        self.emit(EnvironmentEvent::ItemDetached(ItemRef::Frame(frame)));
        Ok(())
    }

    fn path_to_root(&self, frame: FrameId) -> Result<Vec<FrameId>> {
        let mut path = vec![frame];
        let mut node = self.frames.get(&frame).ok_or(Error::FrameNotFound(frame))?;
        while let Some(parent) = node.parent {
            path.push(parent);
            node = self.frames.get(&parent).ok_or(Error::FrameNotFound(parent))?;
        }
        Ok(path)
    }

    /// Rigid transform mapping coordinates expressed in `b` into `a`.
    ///
    /// Both frames are walked up to their nearest common ancestor and
    /// the local transform chains are composed:
    /// `T(a←b) = T(a←ancestor) * T(ancestor←b)`.
    pub fn relative_transform(&self, a: FrameId, b: FrameId) -> Result<Transform> {
        let path_a = self.path_to_root(a)?;
        if a == b {
            return Ok(Transform::identity());
        }
        let path_b = self.path_to_root(b)?;

        let depth_a: HashMap<FrameId, usize> = path_a
            .iter()
            .enumerate()
            .map(|(depth, &f)| (f, depth))
            .collect();
        let mut ancestor = None;
        for (depth_b, f) in path_b.iter().enumerate() {
            if let Some(&depth) = depth_a.get(f) {
                ancestor = Some((depth, depth_b));
                break;
            }
        }
        // two frames of one tree always meet, at the root at the latest
        let (anc_a, anc_b) = match ancestor {
            Some(found) => found,
            None => return Err(Error::FrameNotFound(b)),
        };

        let mut a_to_anc = Transform::identity();
        for f in &path_a[..anc_a] {
            a_to_anc = self.frames[f].transform * a_to_anc;
        }
        let mut b_to_anc = Transform::identity();
        for f in &path_b[..anc_b] {
            b_to_anc = self.frames[f].transform * b_to_anc;
        }
        Ok(a_to_anc.inverse() * b_to_anc)
    }

    // === Maps ===

    /// Attach a map payload and return its id.
    pub fn attach_map(&mut self, data: MapData) -> MapId {
        let id = MapId(self.alloc_id());
        self.maps.insert(id, MapNode { data, frame: None });
        id
    }

    /// Look up a map payload.
    pub fn map(&self, id: MapId) -> Result<&MapData> {
        self.maps
            .get(&id)
            .map(|node| &node.data)
            .ok_or(Error::MapNotFound(id))
    }

    /// Mutable access to a map payload.
    pub fn map_mut(&mut self, id: MapId) -> Result<&mut MapData> {
        self.maps
            .get_mut(&id)
            .map(|node| &mut node.data)
            .ok_or(Error::MapNotFound(id))
    }

    /// The scalar grid behind a map.
    pub fn grid_f32(&self, id: MapId) -> Result<&BandGrid<f32>> {
        match self.map(id)? {
            MapData::GridF32(grid) => Ok(grid),
            _ => Err(Error::MapType {
                map: id,
                expected: "grid.f32",
            }),
        }
    }

    /// Mutable scalar grid behind a map.
    pub fn grid_f32_mut(&mut self, id: MapId) -> Result<&mut BandGrid<f32>> {
        match self.map_mut(id)? {
            MapData::GridF32(grid) => Ok(grid),
            _ => Err(Error::MapType {
                map: id,
                expected: "grid.f32",
            }),
        }
    }

    /// The discrete grid behind a map.
    pub fn grid_u8(&self, id: MapId) -> Result<&BandGrid<u8>> {
        match self.map(id)? {
            MapData::GridU8(grid) => Ok(grid),
            _ => Err(Error::MapType {
                map: id,
                expected: "grid.u8",
            }),
        }
    }

    /// Mutable discrete grid behind a map.
    pub fn grid_u8_mut(&mut self, id: MapId) -> Result<&mut BandGrid<u8>> {
        match self.map_mut(id)? {
            MapData::GridU8(grid) => Ok(grid),
            _ => Err(Error::MapType {
                map: id,
                expected: "grid.u8",
            }),
        }
    }

    /// The surface grid behind a map.
    pub fn surface(&self, id: MapId) -> Result<&SurfaceGrid> {
        match self.map(id)? {
            MapData::Surface(grid) => Ok(grid),
            _ => Err(Error::MapType {
                map: id,
                expected: "surface",
            }),
        }
    }

    /// Mutable surface grid behind a map.
    pub fn surface_mut(&mut self, id: MapId) -> Result<&mut SurfaceGrid> {
        match self.map_mut(id)? {
            MapData::Surface(grid) => Ok(grid),
            _ => Err(Error::MapType {
                map: id,
                expected: "surface",
            }),
        }
    }

    /// The point cloud behind a map.
    pub fn cloud(&self, id: MapId) -> Result<&PointCloud> {
        match self.map(id)? {
            MapData::Cloud(cloud) => Ok(cloud),
            _ => Err(Error::MapType {
                map: id,
                expected: "cloud",
            }),
        }
    }

    /// Mutable point cloud behind a map.
    pub fn cloud_mut(&mut self, id: MapId) -> Result<&mut PointCloud> {
        match self.map_mut(id)? {
            MapData::Cloud(cloud) => Ok(cloud),
            _ => Err(Error::MapType {
                map: id,
                expected: "cloud",
            }),
        }
    }

    /// Bind a map to a frame. A previous binding is detached first.
    pub fn set_frame(&mut self, map: MapId, frame: FrameId) -> Result<()> {
        if !self.frames.contains_key(&frame) {
            return Err(Error::FrameNotFound(frame));
        }
        let node = self.maps.get_mut(&map).ok_or(Error::MapNotFound(map))?;
        let previous = node.frame.replace(frame);
        if let Some(old) = previous {
            if old == frame {
                return Ok(());
            }
            self.emit(EnvironmentEvent::FrameDetached { map, frame: old });
        }
        self.emit(EnvironmentEvent::FrameSet { map, frame });
        Ok(())
    }

    /// Frame a map is bound to, if any.
    pub fn map_frame(&self, map: MapId) -> Result<Option<FrameId>> {
        self.maps
            .get(&map)
            .map(|node| node.frame)
            .ok_or(Error::MapNotFound(map))
    }

    /// Maps bound to a frame, ascending by id.
    pub fn maps_of(&self, frame: FrameId) -> Vec<MapId> {
        let mut ids: Vec<MapId> = self
            .maps
            .iter()
            .filter(|(_, node)| node.frame == Some(frame))
            .map(|(&id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    /// All map ids, ascending.
    pub fn map_ids(&self) -> Vec<MapId> {
        let mut ids: Vec<MapId> = self.maps.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Remove a map from the environment.
    ///
    /// Operator edges referencing the map are left in place; a later
    /// `update_all` on such an operator reports the dangling id.
    pub fn detach_map(&mut self, map: MapId) -> Result<()> {
        let node = self.maps.remove(&map).ok_or(Error::MapNotFound(map))?;
        if let Some(frame) = node.frame {
            self.emit(EnvironmentEvent::FrameDetached { map, frame });
        }
        self.emit(EnvironmentEvent::ItemDetached(ItemRef::Map(map)));
        Ok(())
    }

    /// Replace the target cloud with the source cloud expressed in the
    /// target's frame.
    ///
    /// Both maps must be cloud-backed and bound to frames. The
    /// per-point transform is skipped when the two frames coincide.
    pub fn copy_cloud(&mut self, source: MapId, target: MapId) -> Result<()> {
        let source_frame = self.map_frame(source)?.ok_or(Error::MapNotBound(source))?;
        let target_frame = self.map_frame(target)?.ok_or(Error::MapNotBound(target))?;
        let t = self.relative_transform(target_frame, source_frame)?;
        let src = self.cloud(source)?;
        let copied = if is_approx_identity(&t, 1e-12) {
            src.clone()
        } else {
            src.transformed(&t)
        };
        *self.cloud_mut(target)? = copied;
        Ok(())
    }

    // === Operators ===

    /// Attach an operator and record its input/output edges.
    pub fn attach_operator(&mut self, kind: OperatorKind) -> OperatorId {
        let id = OperatorId(self.alloc_id());
        self.operators.insert(id, OperatorNode::new(kind));
        id
    }

    /// Look up an operator node.
    pub fn operator(&self, id: OperatorId) -> Result<&OperatorNode> {
        self.operators.get(&id).ok_or(Error::OperatorNotFound(id))
    }

    /// Ordered input map edges of an operator.
    pub fn operator_inputs(&self, id: OperatorId) -> Result<&[MapId]> {
        Ok(self.operator(id)?.inputs())
    }

    /// Ordered output map edges of an operator.
    pub fn operator_outputs(&self, id: OperatorId) -> Result<&[MapId]> {
        Ok(self.operator(id)?.outputs())
    }

    /// All operator ids, ascending.
    pub fn operator_ids(&self) -> Vec<OperatorId> {
        let mut ids: Vec<OperatorId> = self.operators.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Rewire or retune an operator in place; the registry edge lists
    /// are refreshed from the new wiring. The change takes effect on
    /// the next `update_all`.
    pub fn reconfigure_operator(
        &mut self,
        id: OperatorId,
        mutate: impl FnOnce(&mut OperatorKind),
    ) -> Result<()> {
        let node = self
            .operators
            .get_mut(&id)
            .ok_or(Error::OperatorNotFound(id))?;
        node.reconfigure(mutate);
        Ok(())
    }

    /// Remove an operator from the environment.
    pub fn detach_operator(&mut self, id: OperatorId) -> Result<()> {
        self.operators
            .remove(&id)
            .ok_or(Error::OperatorNotFound(id))?;
        self.emit(EnvironmentEvent::ItemDetached(ItemRef::Operator(id)));
        Ok(())
    }

    /// Run one full recomputation of an operator's outputs.
    ///
    /// Each call is independent: the operator carries no state between
    /// runs besides its configuration, and configuration changes made
    /// since the previous call are honored.
    pub fn update_all(&mut self, id: OperatorId) -> Result<()> {
        let kind = self.operator(id)?.kind().clone();
        match kind {
            OperatorKind::SurfaceProjection(op) => {
                crate::operators::surface_projection::update(self, &op)
            }
            OperatorKind::Traversability(op) => {
                crate::operators::traversability::update(self, &op)
            }
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        let root = self.root;
        self.emit(EnvironmentEvent::RootRemoved(root));
    }
}
