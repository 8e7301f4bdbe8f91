//! State-grouping tree (the batcher)
//!
//! Every pass root of a [`RenderQueue`](super::queue::RenderQueue) grows a
//! tree of [`RenderGroup`]s, one level per [`StateKey`] in a submission's
//! chain. Groups live in a [`slotmap`] arena owned by the queue and refer to
//! each other by [`GroupKey`].
//!
//! ```text
//! pass root
//!   Shader(1)
//!     Depth{..}
//!       Blend(None)
//!         RenderSettings(Fill)
//!           Texture{0, tex 5}   <- leaf: [a, b]
//!           Texture{0, tex 7}   <- leaf: [c]
//! ```
//!
//! Children are keyed by state value, so a second submission with the same
//! chain under the same parent lands in the same leaf. Siblings are visited
//! in ascending key order; entries in a leaf keep submission order.

use std::collections::BTreeMap;

use slotmap::{new_key_type, SlotMap};

use crate::assets::material::IterationType;
use crate::assets::mesh::MeshArrangement;
use crate::foundation::ids::{MaterialId, MeshId, NodeId};
use crate::foundation::math::Mat4;

use super::sink::{DrawStats, RenderSink};
use super::state::{StateChain, StateKey};

new_key_type! {
    /// Arena key of a [`RenderGroup`]
    pub struct GroupKey;
}

/// Non-owning reference to one submesh draw, plus its world transform
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRef {
    /// Node that submitted the draw
    pub node: NodeId,
    /// Mesh holding the geometry
    pub mesh: MeshId,
    /// Submesh index inside the mesh
    pub submesh: usize,
    /// Material the pass belongs to
    pub material: MaterialId,
    /// Primitive arrangement
    pub arrangement: MeshArrangement,
    /// Indices (or vertices for range-based submeshes) to draw
    pub draw_count: u32,
    /// Node world transform
    pub transform: Mat4,
    /// Draws per pass
    pub iteration: IterationType,
}

/// One node of the grouping tree
#[derive(Debug)]
pub struct RenderGroup {
    state: Option<StateKey>,
    parent: Option<GroupKey>,
    children: BTreeMap<StateKey, GroupKey>,
    batch: Vec<GeometryRef>,
}

impl RenderGroup {
    const fn root() -> Self {
        Self {
            state: None,
            parent: None,
            children: BTreeMap::new(),
            batch: Vec::new(),
        }
    }

    const fn child(parent: GroupKey, state: StateKey) -> Self {
        Self {
            state: Some(state),
            parent: Some(parent),
            children: BTreeMap::new(),
            batch: Vec::new(),
        }
    }

    /// State bound by this group, `None` for a pass root
    pub const fn state(&self) -> Option<&StateKey> {
        self.state.as_ref()
    }

    /// Enclosing group
    pub const fn parent(&self) -> Option<GroupKey> {
        self.parent
    }

    /// Child groups in walk order
    pub fn children(&self) -> impl Iterator<Item = (&StateKey, GroupKey)> {
        self.children.iter().map(|(state, &key)| (state, key))
    }

    /// Child bound to `state`, if any
    pub fn child_for(&self, state: &StateKey) -> Option<GroupKey> {
        self.children.get(state).copied()
    }

    /// Geometry batched directly on this group
    pub fn batch(&self) -> &[GeometryRef] {
        &self.batch
    }
}

/// Arena holding every group of one queue
#[derive(Debug, Default)]
pub struct GroupTree {
    groups: SlotMap<GroupKey, RenderGroup>,
}

impl GroupTree {
    /// Empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// New pass root
    pub fn new_root(&mut self) -> GroupKey {
        self.groups.insert(RenderGroup::root())
    }

    /// Existing child of `parent` bound to `state`, or a new one
    pub fn find_or_create_child(&mut self, parent: GroupKey, state: StateKey) -> GroupKey {
        if let Some(existing) = self.groups.get(parent).and_then(|g| g.child_for(&state)) {
            return existing;
        }

        let child = self.groups.insert(RenderGroup::child(parent, state));
        if let Some(group) = self.groups.get_mut(parent) {
            group.children.insert(state, child);
        }
        log::trace!("New render group {state:?}");
        child
    }

    /// Walk `chain` down from `root`, creating groups as needed, and return the leaf
    pub fn resolve(&mut self, root: GroupKey, chain: &StateChain) -> GroupKey {
        chain
            .keys()
            .iter()
            .fold(root, |parent, &state| self.find_or_create_child(parent, state))
    }

    /// Append geometry to a leaf's batch
    pub fn push(&mut self, leaf: GroupKey, geometry: GeometryRef) {
        if let Some(group) = self.groups.get_mut(leaf) {
            group.batch.push(geometry);
        }
    }

    /// Look up a group
    pub fn get(&self, key: GroupKey) -> Option<&RenderGroup> {
        self.groups.get(key)
    }

    /// Number of groups, roots included
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no group exists
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups holding at least one geometry entry
    pub fn batch_count(&self) -> usize {
        self.groups.values().filter(|g| !g.batch.is_empty()).count()
    }

    /// Total geometry entries
    pub fn entry_count(&self) -> usize {
        self.groups.values().map(|g| g.batch.len()).sum()
    }

    /// Drop every group
    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Depth-first walk from `root`: apply state on entry, draw the batch,
    /// visit children, restore state on exit
    pub fn walk(&self, root: GroupKey, sink: &mut dyn RenderSink, stats: &mut DrawStats) {
        let Some(group) = self.groups.get(root) else {
            return;
        };

        if let Some(state) = &group.state {
            sink.apply_state(state);
            stats.state_changes += 1;
        }

        if !group.batch.is_empty() {
            stats.batches += 1;
            for geometry in &group.batch {
                for iteration in 0..geometry.iteration.count() {
                    sink.draw(geometry, iteration);
                    stats.draw_calls += 1;
                }
            }
        }

        for &child in group.children.values() {
            self.walk(child, sink, stats);
        }

        if let Some(state) = &group.state {
            sink.restore_state(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::ids::{ShaderId, TextureId};
    use crate::render::sink::{DrawCommand, RecordingSink};

    fn geometry(node: u64) -> GeometryRef {
        GeometryRef {
            node: NodeId::from_raw(node),
            mesh: MeshId::from_raw(1),
            submesh: 0,
            material: MaterialId::from_raw(1),
            arrangement: MeshArrangement::Triangles,
            draw_count: 3,
            transform: Mat4::identity(),
            iteration: IterationType::Once,
        }
    }

    fn textured(texture: u64) -> StateChain {
        StateChain::new()
            .then(StateKey::Shader(ShaderId::from_raw(1)))
            .then(StateKey::Texture { unit: 0, texture: TextureId::from_raw(texture) })
    }

    #[test]
    fn test_equal_chains_share_leaf() {
        let mut tree = GroupTree::new();
        let root = tree.new_root();

        let a = tree.resolve(root, &textured(5));
        let b = tree.resolve(root, &textured(7));
        let c = tree.resolve(root, &textured(5));

        assert_eq!(a, c);
        assert_ne!(a, b);
        // root + shader + two textures
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.get(a).unwrap().parent(), tree.get(b).unwrap().parent());
    }

    #[test]
    fn test_walk_sets_shared_state_once() {
        let mut tree = GroupTree::new();
        let root = tree.new_root();
        for (node, texture) in [(1, 7), (2, 5), (3, 5)] {
            let leaf = tree.resolve(root, &textured(texture));
            tree.push(leaf, geometry(node));
        }

        let mut sink = RecordingSink::new();
        let mut stats = DrawStats::default();
        tree.walk(root, &mut sink, &mut stats);

        let shader = StateKey::Shader(ShaderId::from_raw(1));
        let tex = |t| StateKey::Texture { unit: 0, texture: TextureId::from_raw(t) };
        let draw = |n| DrawCommand::Draw {
            node: NodeId::from_raw(n),
            mesh: MeshId::from_raw(1),
            submesh: 0,
            iteration: 0,
        };
        assert_eq!(
            sink.commands(),
            &[
                DrawCommand::Apply(shader),
                DrawCommand::Apply(tex(5)),
                draw(2),
                draw(3),
                DrawCommand::Restore(tex(5)),
                DrawCommand::Apply(tex(7)),
                draw(1),
                DrawCommand::Restore(tex(7)),
                DrawCommand::Restore(shader),
            ]
        );
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.state_changes, 3);
    }

    #[test]
    fn test_iterations_draw_repeatedly() {
        let mut tree = GroupTree::new();
        let root = tree.new_root();
        let mut entry = geometry(1);
        entry.iteration = IterationType::N(3);
        tree.push(root, entry);

        let mut sink = RecordingSink::new();
        let mut stats = DrawStats::default();
        tree.walk(root, &mut sink, &mut stats);

        assert_eq!(stats.draw_calls, 3);
        assert_eq!(sink.draw_count(), 3);
    }
}
