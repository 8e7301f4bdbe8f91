//! Stage nodes
//!
//! A node is a positioned, transformable entry of the stage tree. Actors may
//! carry a mesh; cameras and lights are positional only. The mesh reference
//! is owned by the [`Stage`](super::stage::Stage) so it can keep asset user
//! counts right; everything else is freely editable through
//! [`Stage::node_mut`](super::stage::Stage::node_mut).

use crate::foundation::ids::{MeshId, NodeId};
use crate::foundation::math::Transform;
use crate::foundation::user_data::UserData;
use crate::render::priority::RenderPriority;

/// What a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Drawable object
    Actor,
    /// Viewpoint
    Camera,
    /// Light source
    Light,
}

/// One node of the stage tree
#[derive(Debug)]
pub struct StageNode {
    id: NodeId,
    kind: NodeKind,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    pub(super) mesh: Option<MeshId>,
    /// Display name
    pub name: String,
    /// Transform relative to the parent
    pub transform: Transform,
    /// Hidden nodes and their subtrees are not collected for drawing
    pub visible: bool,
    /// Tier the node's geometry is queued in
    pub render_priority: RenderPriority,
    /// Application data
    pub user_data: UserData,
}

impl StageNode {
    pub(super) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            parent: None,
            children: Vec::new(),
            mesh: None,
            name: String::new(),
            transform: Transform::identity(),
            visible: true,
            render_priority: RenderPriority::default(),
            user_data: UserData::new(),
        }
    }

    /// Node id
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Node kind
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Parent node, `None` at the top of the stage
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in attach order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Mesh drawn for this node
    pub const fn mesh(&self) -> Option<MeshId> {
        self.mesh
    }

    /// True for nodes that contribute geometry
    pub const fn is_renderable(&self) -> bool {
        matches!(self.kind, NodeKind::Actor) && self.mesh.is_some()
    }
}
