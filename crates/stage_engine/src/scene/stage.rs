//! The stage: node tree, assets and hierarchy notifications
//!
//! ## Ownership
//!
//! ```text
//! Stage
//!  ├─ nodes      NodeId -> StageNode (parent/children by id)
//!  ├─ assets     AssetManager (meshes counted per node using them)
//!  ├─ watches    WatchController
//!  └─ signals    node created / destroyed
//! ```
//!
//! Every structural change is reported to the watch controller: creation and
//! attachment with the node's new path, detachment and destruction with its
//! old path. Moving a node reports the detach first, then the attach.

use std::collections::HashMap;

use crate::assets::manager::AssetManager;
use crate::events::Signal;
use crate::foundation::ids::{ConnectionId, IdGenerator, MeshId, NodeId};
use crate::foundation::math::Mat4;
use crate::render::priority::RenderPriority;

use super::node::{NodeKind, StageNode};
use super::path::StageNodePath;
use super::watch::{WatchController, WatchEvent};
use super::StageError;

/// Scene graph root
#[derive(Debug, Default)]
pub struct Stage {
    ids: IdGenerator,
    nodes: HashMap<NodeId, StageNode>,
    roots: Vec<NodeId>,
    assets: AssetManager,
    watches: WatchController,
    node_created: Signal<NodeId>,
    node_destroyed: Signal<NodeId>,
    default_priority: RenderPriority,
}

impl Stage {
    /// Empty stage with its own asset manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a top-level node
    pub fn new_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.insert_node(kind);
        self.roots.push(id);
        log::trace!("Created {id} ({kind:?})");

        self.watches.notify_attached(&StageNodePath::new().child(id));
        self.node_created.emit(&id);
        id
    }

    /// Create a node under `parent`
    pub fn new_child(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, StageError> {
        if !self.nodes.contains_key(&parent) {
            return Err(StageError::NodeNotFound(parent));
        }
        let id = self.insert_node(kind);
        self.link(id, Some(parent));
        log::trace!("Created {id} ({kind:?}) under {parent}");

        if let Some(path) = self.path(id) {
            self.watches.notify_attached(&path);
        }
        self.node_created.emit(&id);
        Ok(id)
    }

    /// Create a top-level actor
    pub fn new_actor(&mut self) -> NodeId {
        self.new_node(NodeKind::Actor)
    }

    /// Create a top-level actor drawing `mesh`
    pub fn new_actor_with_mesh(&mut self, mesh: MeshId) -> Result<NodeId, StageError> {
        if self.assets.mesh(mesh).is_none() {
            return Err(StageError::MeshNotFound(mesh));
        }
        let id = self.new_actor();
        self.set_mesh(id, Some(mesh))?;
        Ok(id)
    }

    /// Create a top-level camera
    pub fn new_camera(&mut self) -> NodeId {
        self.new_node(NodeKind::Camera)
    }

    /// Create a top-level light
    pub fn new_light(&mut self) -> NodeId {
        self.new_node(NodeKind::Light)
    }

    /// Change the mesh a node draws, keeping asset user counts in step
    pub fn set_mesh(&mut self, node: NodeId, mesh: Option<MeshId>) -> Result<(), StageError> {
        if !self.nodes.contains_key(&node) {
            return Err(StageError::NodeNotFound(node));
        }
        if let Some(new) = mesh {
            self.assets
                .acquire_mesh(new)
                .map_err(|_| StageError::MeshNotFound(new))?;
        }

        let old = self.nodes.get_mut(&node).and_then(|n| std::mem::replace(&mut n.mesh, mesh));
        if let Some(old) = old {
            self.assets.release_mesh(old);
        }
        Ok(())
    }

    /// Destroy a node and its whole subtree
    pub fn destroy_node(&mut self, id: NodeId) -> Result<(), StageError> {
        let old_path = self.path(id).ok_or(StageError::NodeNotFound(id))?;
        self.unlink(id);

        let subtree = self.subtree(id);
        for node in &subtree {
            if let Some(removed) = self.nodes.remove(node) {
                if let Some(mesh) = removed.mesh {
                    self.assets.release_mesh(mesh);
                }
            }
        }
        log::trace!("Destroyed {id} and {} descendant(s)", subtree.len() - 1);

        self.watches.notify_detached(&old_path);
        for node in &subtree {
            self.node_destroyed.emit(node);
        }
        Ok(())
    }

    /// Move `child` (and its subtree) under `parent`
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<(), StageError> {
        let child_path = self.path(child).ok_or(StageError::NodeNotFound(child))?;
        let parent_path = self.path(parent).ok_or(StageError::NodeNotFound(parent))?;

        if parent_path.starts_with(&child_path) {
            return Err(StageError::CycleDetected { child, parent });
        }
        if self.parent(child) == Some(parent) {
            return Ok(());
        }

        self.unlink(child);
        self.watches.notify_detached(&child_path);

        self.link(child, Some(parent));
        self.watches.notify_attached(&parent_path.child(child));
        Ok(())
    }

    /// Move `child` to the top level
    pub fn detach(&mut self, child: NodeId) -> Result<(), StageError> {
        let old_path = self.path(child).ok_or(StageError::NodeNotFound(child))?;
        if self.parent(child).is_none() {
            return Ok(());
        }

        self.unlink(child);
        self.watches.notify_detached(&old_path);

        self.link(child, None);
        self.watches.notify_attached(&StageNodePath::new().child(child));
        Ok(())
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&StageNode> {
        self.nodes.get(&id)
    }

    /// Look up a node for editing
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut StageNode> {
        self.nodes.get_mut(&id)
    }

    /// Whether `id` resolves
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(StageNode::parent)
    }

    /// Top-level nodes in creation order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Path from the top of the stage to `id`
    pub fn path(&self, id: NodeId) -> Option<StageNodePath> {
        let mut ids = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let entry = self.nodes.get(&node)?;
            ids.push(node);
            current = entry.parent;
        }
        ids.reverse();
        Some(StageNodePath::from(ids))
    }

    /// Product of the local transforms from the top of the stage down
    pub fn world_transform(&self, id: NodeId) -> Option<Mat4> {
        let path = self.path(id)?;
        Some(path.nodes().iter().fold(Mat4::identity(), |world, node| {
            self.nodes
                .get(node)
                .map_or(world, |n| world * n.transform.to_matrix())
        }))
    }

    /// Depth-first pre-order walk over visible nodes with their world
    /// transforms. A hidden node hides its subtree.
    pub fn visit_visible<F>(&self, mut visitor: F)
    where
        F: FnMut(&StageNode, &Mat4),
    {
        let identity = Mat4::identity();
        for &root in &self.roots {
            self.visit_from(root, &identity, &mut visitor);
        }
    }

    fn visit_from<F>(&self, id: NodeId, parent_world: &Mat4, visitor: &mut F)
    where
        F: FnMut(&StageNode, &Mat4),
    {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let world = parent_world * node.transform.to_matrix();
        visitor(node, &world);
        for &child in &node.children {
            self.visit_from(child, &world, visitor);
        }
    }

    /// Watch hierarchy changes at, above or below `path`
    pub fn watch(
        &mut self,
        path: StageNodePath,
        callback: impl FnMut(WatchEvent, &StageNodePath) + 'static,
    ) -> ConnectionId {
        self.watches.watch(path, callback)
    }

    /// Cancel a watch. Returns false if it was already cancelled.
    pub fn unwatch(&mut self, id: ConnectionId) -> bool {
        self.watches.disconnect(id)
    }

    /// Watch registry
    pub const fn watches(&self) -> &WatchController {
        &self.watches
    }

    /// Emitted after a node is created
    pub fn signal_node_created(&mut self) -> &mut Signal<NodeId> {
        &mut self.node_created
    }

    /// Emitted for every node of a destroyed subtree
    pub fn signal_node_destroyed(&mut self) -> &mut Signal<NodeId> {
        &mut self.node_destroyed
    }

    /// Meshes and materials
    pub const fn assets(&self) -> &AssetManager {
        &self.assets
    }

    /// Meshes and materials for editing
    pub fn assets_mut(&mut self) -> &mut AssetManager {
        &mut self.assets
    }

    /// Priority given to nodes created from now on
    pub fn set_default_priority(&mut self, priority: RenderPriority) {
        self.default_priority = priority;
    }

    /// Priority given to new nodes
    pub const fn default_priority(&self) -> RenderPriority {
        self.default_priority
    }

    fn insert_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.ids.next();
        let mut node = StageNode::new(id, kind);
        node.render_priority = self.default_priority;
        self.nodes.insert(id, node);
        id
    }

    fn link(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = parent;
        }
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let parent = self.nodes.get_mut(&id).and_then(|n| n.parent.take());
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent) => parent.children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }
    }

    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            if let Some(entry) = self.nodes.get(&node) {
                stack.extend(entry.children.iter().rev());
            }
        }
        out
    }
}
