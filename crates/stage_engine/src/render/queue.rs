//! Per-priority render queue
//!
//! Holds one group tree root per material pass. Rebuilt every frame.

use super::group::{GeometryRef, GroupKey, GroupTree, RenderGroup};
use super::priority::RenderPriority;
use super::sink::{DrawStats, RenderSink};
use super::state::StateChain;

/// Passes a material may have
pub const MAX_MATERIAL_PASSES: usize = 25;

/// Group trees for one priority tier, indexed by pass
#[derive(Debug)]
pub struct RenderQueue {
    priority: RenderPriority,
    tree: GroupTree,
    passes: [Option<GroupKey>; MAX_MATERIAL_PASSES],
}

impl RenderQueue {
    /// Empty queue for `priority`
    pub fn new(priority: RenderPriority) -> Self {
        Self {
            priority,
            tree: GroupTree::new(),
            passes: [None; MAX_MATERIAL_PASSES],
        }
    }

    /// Tier this queue draws
    pub const fn priority(&self) -> RenderPriority {
        self.priority
    }

    /// Root group for `pass`, created on first use
    ///
    /// # Panics
    ///
    /// If `pass >= MAX_MATERIAL_PASSES`. Only a malformed material can get here.
    pub fn get_or_create_pass(&mut self, pass: usize) -> GroupKey {
        assert!(
            pass < MAX_MATERIAL_PASSES,
            "material pass {pass} exceeds the limit of {MAX_MATERIAL_PASSES}"
        );
        if let Some(root) = self.passes[pass] {
            return root;
        }
        let root = self.tree.new_root();
        self.passes[pass] = Some(root);
        root
    }

    /// Root group for `pass` if anything was submitted to it
    pub fn pass_root(&self, pass: usize) -> Option<GroupKey> {
        self.passes.get(pass).copied().flatten()
    }

    /// Route one submission to its leaf and return the leaf
    pub fn submit(&mut self, pass: usize, chain: &StateChain, geometry: GeometryRef) -> GroupKey {
        let root = self.get_or_create_pass(pass);
        let leaf = self.tree.resolve(root, chain);
        self.tree.push(leaf, geometry);
        leaf
    }

    /// Look up a group of this queue
    pub fn group(&self, key: GroupKey) -> Option<&RenderGroup> {
        self.tree.get(key)
    }

    /// Passes with a root
    pub fn pass_count(&self) -> usize {
        self.passes.iter().flatten().count()
    }

    /// Groups in this queue, roots included
    pub fn group_count(&self) -> usize {
        self.tree.len()
    }

    /// Leaves with geometry
    pub fn batch_count(&self) -> usize {
        self.tree.batch_count()
    }

    /// Submissions held
    pub fn entry_count(&self) -> usize {
        self.tree.entry_count()
    }

    /// True if nothing was submitted
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Drop every group. Meshes are untouched.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.passes = [None; MAX_MATERIAL_PASSES];
    }

    /// Draw pass 0 for everything, then pass 1, and so on
    pub fn draw(&self, sink: &mut dyn RenderSink) -> DrawStats {
        let mut stats = DrawStats::default();
        for (pass, root) in self.passes.iter().enumerate() {
            let Some(root) = *root else {
                continue;
            };
            sink.begin_pass(self.priority, pass);
            self.tree.walk(root, sink, &mut stats);
            sink.end_pass(self.priority, pass);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::material::IterationType;
    use crate::assets::mesh::MeshArrangement;
    use crate::foundation::ids::{MaterialId, MeshId, NodeId};
    use crate::foundation::math::Mat4;
    use crate::render::sink::RecordingSink;

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

    #[test]
    fn test_get_or_create_pass_is_idempotent() {
        let mut queue = RenderQueue::new(RenderPriority::MAIN);
        for pass in 0..MAX_MATERIAL_PASSES {
            let first = queue.get_or_create_pass(pass);
            assert_eq!(queue.get_or_create_pass(pass), first);
        }
        assert_eq!(queue.pass_count(), MAX_MATERIAL_PASSES);
    }

    #[test]
    #[should_panic(expected = "exceeds the limit")]
    fn test_pass_past_limit_is_fatal() {
        let mut queue = RenderQueue::new(RenderPriority::MAIN);
        queue.get_or_create_pass(MAX_MATERIAL_PASSES);
    }

    #[test]
    fn test_passes_draw_in_ascending_order() {
        let mut queue = RenderQueue::new(RenderPriority::MAIN);
        queue.submit(3, &StateChain::new(), geometry(1));
        queue.submit(0, &StateChain::new(), geometry(2));

        let mut sink = RecordingSink::new();
        let stats = queue.draw(&mut sink);

        assert_eq!(
            sink.passes(),
            vec![(RenderPriority::MAIN, 0), (RenderPriority::MAIN, 3)]
        );
        assert_eq!(stats.draw_calls, 2);
    }

    #[test]
    fn test_clear_drops_groups() {
        let mut queue = RenderQueue::new(RenderPriority::MAIN);
        let leaf = queue.submit(0, &StateChain::new(), geometry(1));
        queue.clear();

        assert!(queue.is_empty());
        assert!(queue.group(leaf).is_none());
        assert!(queue.pass_root(0).is_none());

        let mut sink = RecordingSink::new();
        queue.draw(&mut sink);
        assert!(sink.commands().is_empty());
    }
}
