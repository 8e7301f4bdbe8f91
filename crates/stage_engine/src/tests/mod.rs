//! Cross-module scenarios: stage → collector → queue → sink

mod batching;

use crate::assets::{
    GarbageCollect, IndexType, MaterialPass, MeshArrangement, SubMeshData, VertexSpecification,
};
use crate::foundation::ids::{MaterialId, MeshId, ShaderId, TextureId};
use crate::scene::Stage;

/// One-triangle mesh with owned vertex data
fn triangle_mesh(stage: &mut Stage, material: MaterialId) -> MeshId {
    let assets = stage.assets_mut();
    let mesh_id = assets.new_mesh(GarbageCollect::Never);
    let mesh = assets.mesh_mut(mesh_id).unwrap();
    let sub = mesh
        .new_submesh(
            "triangle",
            material,
            MeshArrangement::Triangles,
            SubMeshData::Owned(VertexSpecification::POSITION),
            IndexType::U16,
        )
        .unwrap();
    mesh.submesh_mut(sub).unwrap().index_data_mut().extend(&[0, 1, 2]).unwrap();
    mesh_id
}

/// Material with `passes` identical passes, each binding `texture` if given
fn material(stage: &mut Stage, shader: ShaderId, passes: usize, texture: Option<TextureId>) -> MaterialId {
    let assets = stage.assets_mut();
    let id = assets.new_material(GarbageCollect::Never);
    let material = assets.material_mut(id).unwrap();
    for _ in 0..passes {
        let mut pass = MaterialPass::new(shader);
        if let Some(texture) = texture {
            pass.add_texture(texture).unwrap();
        }
        material.add_pass(pass).unwrap();
    }
    id
}
