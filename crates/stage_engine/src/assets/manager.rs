//! Reference-counted asset registry
//!
//! Stage nodes hold ids, not assets. The manager counts how many nodes use each
//! mesh; a material is in use while a live mesh refers to it.
//! [`AssetManager::collect_garbage`] releases assets marked
//! [`GarbageCollect::Periodic`] once they have been used and let go. An asset
//! nobody has claimed yet is kept for a grace period after its creation, so a
//! loader can build it before a node picks it up. Released ids never resolve
//! again.

use std::collections::{HashMap, HashSet};

use crate::foundation::ids::{IdGenerator, MaterialId, MeshId, ShaderId, TextureId};

use super::material::Material;
use super::mesh::Mesh;
use super::vertex_data::VertexSpecification;
use super::AssetError;

/// Seconds an unclaimed periodic asset survives garbage collection
pub const DEFAULT_GRACE_PERIOD: f32 = 5.0;

/// Release policy for an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GarbageCollect {
    /// Keep until explicitly destroyed
    Never,
    /// Release when the asset is no longer used
    #[default]
    Periodic,
}

#[derive(Debug)]
struct Entry<T> {
    asset: T,
    users: usize,
    policy: GarbageCollect,
    claimed: bool,
    created_at: f32,
}

impl<T> Entry<T> {
    const fn new(asset: T, policy: GarbageCollect, created_at: f32) -> Self {
        Self {
            asset,
            users: 0,
            policy,
            claimed: false,
            created_at,
        }
    }

    fn is_garbage(&self, now: f32, grace_period: f32) -> bool {
        if self.users > 0 || !matches!(self.policy, GarbageCollect::Periodic) {
            return false;
        }
        self.claimed || now - self.created_at >= grace_period
    }
}

/// Owner of every mesh and material on a stage
#[derive(Debug)]
pub struct AssetManager {
    ids: IdGenerator,
    meshes: HashMap<MeshId, Entry<Mesh>>,
    materials: HashMap<MaterialId, Entry<Material>>,
    clock: f32,
    grace_period: f32,
}

impl Default for AssetManager {
    fn default() -> Self {
        Self {
            ids: IdGenerator::new(),
            meshes: HashMap::new(),
            materials: HashMap::new(),
            clock: 0.0,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl AssetManager {
    /// Empty manager with its own id sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mesh
    pub fn new_mesh(&mut self, policy: GarbageCollect) -> MeshId {
        let id = self.ids.next();
        self.meshes.insert(id, Entry::new(Mesh::new(id), policy, self.clock));
        log::trace!("Created {id}");
        id
    }

    /// Create a mesh with a shared vertex buffer
    pub fn new_mesh_with_shared_data(
        &mut self,
        specification: VertexSpecification,
        policy: GarbageCollect,
    ) -> MeshId {
        let id = self.ids.next();
        let mesh = Mesh::with_shared_data(id, specification);
        self.meshes.insert(id, Entry::new(mesh, policy, self.clock));
        log::trace!("Created {id} with shared data");
        id
    }

    /// Create a material with no passes
    pub fn new_material(&mut self, policy: GarbageCollect) -> MaterialId {
        let id = self.ids.next();
        self.materials
            .insert(id, Entry::new(Material::new(id), policy, self.clock));
        id
    }

    /// Reserve an id for a texture uploaded by the backend
    pub fn new_texture_id(&mut self) -> TextureId {
        self.ids.next()
    }

    /// Reserve an id for a shader compiled by the backend
    pub fn new_shader_id(&mut self) -> ShaderId {
        self.ids.next()
    }

    /// Look up a mesh
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(&id).map(|e| &e.asset)
    }

    /// Look up a mesh for editing
    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(&id).map(|e| &mut e.asset)
    }

    /// Look up a material
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id).map(|e| &e.asset)
    }

    /// Look up a material for editing
    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(&id).map(|e| &mut e.asset)
    }

    /// Point a submesh at a material, checking that both exist
    pub fn assign_material(
        &mut self,
        mesh: MeshId,
        submesh: usize,
        material: MaterialId,
    ) -> Result<(), AssetError> {
        let entry = self
            .materials
            .get_mut(&material)
            .ok_or(AssetError::MaterialNotFound(material))?;
        self.meshes
            .get_mut(&mesh)
            .ok_or(AssetError::MeshNotFound(mesh))?
            .asset
            .set_submesh_material(submesh, material)?;
        entry.claimed = true;
        Ok(())
    }

    /// Register one more user of a mesh
    pub fn acquire_mesh(&mut self, id: MeshId) -> Result<(), AssetError> {
        let entry = self.meshes.get_mut(&id).ok_or(AssetError::MeshNotFound(id))?;
        entry.users += 1;
        entry.claimed = true;
        Ok(())
    }

    /// Drop one user of a mesh. Unknown ids are ignored.
    pub fn release_mesh(&mut self, id: MeshId) {
        if let Some(entry) = self.meshes.get_mut(&id) {
            entry.users = entry.users.saturating_sub(1);
        }
    }

    /// Current user count of a mesh
    pub fn mesh_users(&self, id: MeshId) -> Option<usize> {
        self.meshes.get(&id).map(|e| e.users)
    }

    /// Number of live submeshes drawing with a material
    pub fn material_users(&self, id: MaterialId) -> Option<usize> {
        self.materials.get(&id)?;
        Some(
            self.meshes
                .values()
                .flat_map(|e| e.asset.submeshes())
                .filter(|s| s.submesh().material() == id)
                .count(),
        )
    }

    /// Destroy a mesh regardless of policy or users
    pub fn destroy_mesh(&mut self, id: MeshId) -> bool {
        self.meshes.remove(&id).is_some()
    }

    /// Destroy a material regardless of policy or users
    pub fn destroy_material(&mut self, id: MaterialId) -> bool {
        self.materials.remove(&id).is_some()
    }

    /// Advance the clock that measures the grace period
    pub fn advance_clock(&mut self, dt: f32) {
        self.clock += dt;
    }

    /// Seconds of asset time elapsed
    pub const fn clock(&self) -> f32 {
        self.clock
    }

    /// How long unclaimed periodic assets are kept
    pub fn set_grace_period(&mut self, seconds: f32) {
        self.grace_period = seconds.max(0.0);
    }

    /// Current grace period in seconds
    pub const fn grace_period(&self) -> f32 {
        self.grace_period
    }

    /// Release every unused periodic asset. Returns how many were released.
    ///
    /// Meshes go first. A material referenced by any mesh counts as claimed,
    /// and one still referenced by a surviving mesh is kept.
    pub fn collect_garbage(&mut self) -> usize {
        let before = self.meshes.len() + self.materials.len();
        let (now, grace) = (self.clock, self.grace_period);

        for id in self.referenced_materials() {
            if let Some(entry) = self.materials.get_mut(&id) {
                entry.claimed = true;
            }
        }
        self.meshes.retain(|_, e| !e.is_garbage(now, grace));

        let referenced = self.referenced_materials();
        self.materials
            .retain(|id, e| referenced.contains(id) || !e.is_garbage(now, grace));

        let released = before - (self.meshes.len() + self.materials.len());
        if released > 0 {
            log::debug!("Released {released} unused asset(s)");
        }
        released
    }

    fn referenced_materials(&self) -> HashSet<MaterialId> {
        self.meshes
            .values()
            .flat_map(|e| e.asset.materials())
            .collect()
    }

    /// Number of live meshes
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Number of live materials
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{IndexType, MeshArrangement, SubMeshData};

    fn textured_mesh(assets: &mut AssetManager, material: MaterialId, policy: GarbageCollect) -> MeshId {
        let mesh = assets.new_mesh_with_shared_data(VertexSpecification::POSITION_NORMAL_UV, policy);
        assets
            .mesh_mut(mesh)
            .unwrap()
            .new_submesh("body", material, MeshArrangement::Triangles, SubMeshData::Shared, IndexType::U16)
            .unwrap();
        mesh
    }

    #[test]
    fn test_unused_periodic_assets_are_collected() {
        let mut assets = AssetManager::new();
        let kept = assets.new_mesh(GarbageCollect::Never);
        let used = assets.new_mesh(GarbageCollect::Periodic);
        assets.acquire_mesh(used).unwrap();

        assert_eq!(assets.collect_garbage(), 0);
        assets.release_mesh(used);
        assert_eq!(assets.collect_garbage(), 1);
        assert!(assets.mesh(kept).is_some());
        assert!(assets.mesh(used).is_none());
    }

    #[test]
    fn test_unclaimed_assets_survive_grace_period() {
        let mut assets = AssetManager::new();
        let mesh = assets.new_mesh(GarbageCollect::Periodic);
        let material = assets.new_material(GarbageCollect::Periodic);

        assets.advance_clock(0.016);
        assert_eq!(assets.collect_garbage(), 0);
        assets.advance_clock(DEFAULT_GRACE_PERIOD - 1.0);
        assert_eq!(assets.collect_garbage(), 0);
        assert!(assets.mesh(mesh).is_some());

        assets.advance_clock(1.0);
        assert_eq!(assets.collect_garbage(), 2);
        assert!(assets.mesh(mesh).is_none());
        assert!(assets.material(material).is_none());
    }

    #[test]
    fn test_claimed_asset_released_before_grace_period() {
        let mut assets = AssetManager::new();
        let mesh = assets.new_mesh(GarbageCollect::Periodic);
        assets.acquire_mesh(mesh).unwrap();
        assets.release_mesh(mesh);

        assets.advance_clock(0.016);
        assert_eq!(assets.collect_garbage(), 1);
    }

    #[test]
    fn test_stale_ids_never_resolve_to_new_assets() {
        let mut assets = AssetManager::new();
        assets.set_grace_period(0.0);
        let old = assets.new_material(GarbageCollect::Periodic);
        assets.collect_garbage();
        let fresh = assets.new_material(GarbageCollect::Periodic);

        assert_ne!(old, fresh);
        assert!(assets.material(old).is_none());
        assert!(assets.material(fresh).is_some());
        let mesh = assets.new_mesh(GarbageCollect::Never);
        assert!(matches!(
            assets.assign_material(mesh, 0, old),
            Err(AssetError::MaterialNotFound(id)) if id == old
        ));
    }

    #[test]
    fn test_material_kept_while_a_mesh_uses_it() {
        let mut assets = AssetManager::new();
        let material = assets.new_material(GarbageCollect::Periodic);
        let mesh = textured_mesh(&mut assets, material, GarbageCollect::Never);

        assert_eq!(assets.material_users(material), Some(1));
        assert_eq!(assets.collect_garbage(), 0);
        assert!(assets.material(material).is_some());

        assets.destroy_mesh(mesh);
        assert_eq!(assets.material_users(material), Some(0));
        // claimed while the mesh referenced it, so no grace period applies
        assert_eq!(assets.collect_garbage(), 1);
        assert!(assets.material(material).is_none());
    }

    #[test]
    fn test_assign_material_moves_users() {
        let mut assets = AssetManager::new();
        let first = assets.new_material(GarbageCollect::Periodic);
        let second = assets.new_material(GarbageCollect::Periodic);
        let mesh = textured_mesh(&mut assets, first, GarbageCollect::Never);

        assets.assign_material(mesh, 0, second).unwrap();
        assert_eq!(assets.material_users(first), Some(0));
        assert_eq!(assets.material_users(second), Some(1));
        assert!(matches!(
            assets.assign_material(mesh, 3, second),
            Err(AssetError::SubMeshOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_release_saturates() {
        let mut assets = AssetManager::new();
        let mesh = assets.new_mesh(GarbageCollect::Never);
        assets.release_mesh(mesh);
        assert_eq!(assets.mesh_users(mesh), Some(0));
    }
}
