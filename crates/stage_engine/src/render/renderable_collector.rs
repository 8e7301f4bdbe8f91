//! # Renderable Collector
//!
//! Walks the visible part of a stage once per frame and turns every
//! (submesh, material pass) pair of every actor into a submission for the
//! [`RenderPriorityQueue`]. Submissions that cannot be resolved are skipped
//! with a warning; the rest of the frame carries on.

use crate::assets::manager::AssetManager;
use crate::foundation::math::Mat4;
use crate::scene::{Stage, StageNode};

use super::group::GeometryRef;
use super::priority_queue::RenderPriorityQueue;

/// Result of one collection pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Submissions queued
    pub submissions: usize,
    /// Actors or submeshes that contributed nothing
    pub skipped: usize,
}

/// Stage traversal feeding the render queue
#[derive(Debug, Clone)]
pub struct RenderableCollector {
    skip_empty: bool,
    enabled: bool,
}

impl Default for RenderableCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderableCollector {
    /// Collector that skips submeshes with nothing to draw
    pub const fn new() -> Self {
        Self {
            skip_empty: true,
            enabled: true,
        }
    }

    /// Whether submeshes with a zero draw count are left out
    #[must_use]
    pub const fn with_skip_empty(mut self, skip: bool) -> Self {
        self.skip_empty = skip;
        self
    }

    /// Enable or disable the collector
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if the collector is enabled
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Queue every visible actor of `stage`
    pub fn collect(&self, stage: &Stage, queue: &mut RenderPriorityQueue) -> CollectStats {
        let mut stats = CollectStats::default();
        if !self.enabled {
            return stats;
        }

        stage.visit_visible(|node, world| {
            self.collect_node(stage.assets(), node, world, queue, &mut stats);
        });

        log::debug!(
            "Collected {} submission(s), skipped {}",
            stats.submissions,
            stats.skipped
        );
        stats
    }

    fn collect_node(
        &self,
        assets: &AssetManager,
        node: &StageNode,
        world: &Mat4,
        queue: &mut RenderPriorityQueue,
        stats: &mut CollectStats,
    ) {
        if !matches!(node.kind(), crate::scene::NodeKind::Actor) {
            return;
        }
        let Some(mesh_id) = node.mesh() else {
            log::debug!("{} has no mesh", node.id());
            stats.skipped += 1;
            return;
        };
        let Some(mesh) = assets.mesh(mesh_id) else {
            log::warn!("{} refers to missing {mesh_id}, skipping", node.id());
            stats.skipped += 1;
            return;
        };

        for (index, submesh) in mesh.submeshes().enumerate() {
            let submesh = submesh.submesh();
            let draw_count = submesh.draw_count();
            if self.skip_empty && draw_count == 0 {
                log::trace!("{mesh_id} submesh {index} is empty, skipping");
                stats.skipped += 1;
                continue;
            }

            let material_id = submesh.material();
            let Some(material) = assets.material(material_id) else {
                log::warn!("{mesh_id} submesh {index} uses missing {material_id}, skipping");
                stats.skipped += 1;
                continue;
            };

            for (pass_index, pass) in material.passes().iter().enumerate() {
                let geometry = GeometryRef {
                    node: node.id(),
                    mesh: mesh_id,
                    submesh: index,
                    material: material_id,
                    arrangement: submesh.arrangement(),
                    draw_count,
                    transform: *world,
                    iteration: pass.iteration,
                };
                queue.submit(node.render_priority, pass_index, &pass.state_chain(), geometry);
                log::trace!(
                    "Queued {} {mesh_id}/{index} pass {pass_index} at {}",
                    node.id(),
                    node.render_priority
                );
                stats.submissions += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{
        GarbageCollect, IndexType, MaterialPass, MeshArrangement, SubMeshData, VertexSpecification,
    };
    use crate::foundation::ids::{MaterialId, MeshId};
    use crate::render::priority::RenderPriority;

    fn triangle_mesh(stage: &mut Stage, material: MaterialId) -> MeshId {
        let assets = stage.assets_mut();
        let mesh_id = assets.new_mesh(GarbageCollect::Never);
        let mesh = assets.mesh_mut(mesh_id).unwrap();
        let sub = mesh
            .new_submesh(
                "tri",
                material,
                MeshArrangement::Triangles,
                SubMeshData::Owned(VertexSpecification::POSITION_NORMAL_UV),
                IndexType::U16,
            )
            .unwrap();
        mesh.submesh_mut(sub).unwrap().index_data_mut().extend(&[0, 1, 2]).unwrap();
        mesh_id
    }

    fn material(stage: &mut Stage, passes: usize) -> MaterialId {
        let shader = stage.assets_mut().new_shader_id();
        let id = stage.assets_mut().new_material(GarbageCollect::Never);
        let material = stage.assets_mut().material_mut(id).unwrap();
        for _ in 0..passes {
            material.add_pass(MaterialPass::new(shader)).unwrap();
        }
        id
    }

    #[test]
    fn test_one_submission_per_pass() {
        let mut stage = Stage::new();
        let mat = material(&mut stage, 2);
        let mesh = triangle_mesh(&mut stage, mat);
        let actor = stage.new_actor_with_mesh(mesh).unwrap();
        stage.node_mut(actor).unwrap().render_priority = RenderPriority::NEAR;

        let mut queue = RenderPriorityQueue::new();
        let stats = RenderableCollector::new().collect(&stage, &mut queue);

        assert_eq!(stats, CollectStats { submissions: 2, skipped: 0 });
        let near = queue.queue(RenderPriority::NEAR).unwrap();
        assert_eq!(near.pass_count(), 2);
    }

    #[test]
    fn test_stale_material_is_skipped() {
        let mut stage = Stage::new();
        let mesh = triangle_mesh(&mut stage, MaterialId::from_raw(999));
        stage.new_actor_with_mesh(mesh).unwrap();
        stage.new_actor();
        stage.new_camera();

        let mut queue = RenderPriorityQueue::new();
        let stats = RenderableCollector::new().collect(&stage, &mut queue);

        assert_eq!(stats, CollectStats { submissions: 0, skipped: 2 });
        assert!(queue.is_empty());
    }

    #[test]
    fn test_empty_submesh_handling() {
        let mut stage = Stage::new();
        let mat = material(&mut stage, 1);
        let mesh_id = stage.assets_mut().new_mesh(GarbageCollect::Never);
        stage
            .assets_mut()
            .mesh_mut(mesh_id)
            .unwrap()
            .new_submesh(
                "empty",
                mat,
                MeshArrangement::Triangles,
                SubMeshData::Owned(VertexSpecification::POSITION),
                IndexType::U16,
            )
            .unwrap();
        stage.new_actor_with_mesh(mesh_id).unwrap();

        let mut queue = RenderPriorityQueue::new();
        let skipping = RenderableCollector::new().collect(&stage, &mut queue);
        assert_eq!(skipping.skipped, 1);

        queue.clear();
        let keeping = RenderableCollector::new()
            .with_skip_empty(false)
            .collect(&stage, &mut queue);
        assert_eq!(keeping.submissions, 1);
    }
}
