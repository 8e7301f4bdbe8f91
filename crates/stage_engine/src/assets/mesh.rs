//! Meshes and submeshes
//!
//! A [`Mesh`] owns its submeshes in creation order plus an optional shared
//! vertex buffer. A submesh either draws from that shared buffer or owns a
//! private one. Shared data is only ever reached through the parent mesh, so
//! editing it never creates a hidden per-submesh copy.

use crate::foundation::ids::{MaterialId, MeshId};

use super::vertex_data::{IndexData, IndexType, VertexData, VertexRangeList, VertexSpecification};
use super::AssetError;

/// How indices are assembled into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum MeshArrangement {
    /// Point list
    Points,
    /// Independent triangles
    #[default]
    Triangles,
    /// Triangle fan
    TriangleFan,
    /// Triangle strip
    TriangleStrip,
    /// Independent lines
    Lines,
    /// Line strip
    LineStrip,
}

/// Where a submesh reads its vertices from
#[derive(Debug, Clone, PartialEq)]
enum VertexStorage {
    Shared,
    Owned(VertexData),
}

/// One drawable part of a mesh with its own material and index list
#[derive(Debug, Clone)]
pub struct SubMesh {
    name: String,
    material: MaterialId,
    arrangement: MeshArrangement,
    storage: VertexStorage,
    index_data: IndexData,
    ranges: VertexRangeList,
    bounds: Option<([f32; 3], [f32; 3])>,
}

impl SubMesh {
    /// Submesh name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Material used to draw this submesh
    pub const fn material(&self) -> MaterialId {
        self.material
    }

    /// Primitive arrangement
    pub const fn arrangement(&self) -> MeshArrangement {
        self.arrangement
    }

    /// Whether vertices come from the parent mesh
    pub const fn uses_shared_data(&self) -> bool {
        matches!(self.storage, VertexStorage::Shared)
    }

    /// Index list
    pub const fn index_data(&self) -> &IndexData {
        &self.index_data
    }

    /// Mutable index list
    pub fn index_data_mut(&mut self) -> &mut IndexData {
        &mut self.index_data
    }

    /// Private vertex buffer, `None` when the submesh uses shared data
    pub const fn owned_vertex_data(&self) -> Option<&VertexData> {
        match &self.storage {
            VertexStorage::Owned(data) => Some(data),
            VertexStorage::Shared => None,
        }
    }

    /// Index ranges for range-based drawing
    pub const fn ranges(&self) -> &VertexRangeList {
        &self.ranges
    }

    /// Add an index range
    pub fn add_range(&mut self, start: u32, count: u32) {
        self.ranges.add(start, count);
    }

    /// Bounds computed by the last [`Mesh::recalc_bounds`]
    pub const fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        self.bounds
    }

    /// Number of indices that will be drawn
    pub fn draw_count(&self) -> u32 {
        if self.ranges.is_empty() {
            u32::try_from(self.index_data.count()).unwrap_or(u32::MAX)
        } else {
            self.ranges.total_count()
        }
    }

    /// Visit each triangle `(a, b, c)` of a triangle or line list.
    /// For lines the third index repeats the first.
    pub fn each_triangle(&self, mut f: impl FnMut(u32, u32, u32)) {
        let indices = self.index_data.indices();
        match self.arrangement {
            MeshArrangement::Triangles => {
                for tri in indices.chunks_exact(3) {
                    f(tri[0], tri[1], tri[2]);
                }
            }
            MeshArrangement::TriangleStrip => {
                for (i, tri) in indices.windows(3).enumerate() {
                    if i % 2 == 0 {
                        f(tri[0], tri[1], tri[2]);
                    } else {
                        f(tri[1], tri[0], tri[2]);
                    }
                }
            }
            MeshArrangement::TriangleFan => {
                if let Some((&hub, rest)) = indices.split_first() {
                    for pair in rest.windows(2) {
                        f(hub, pair[0], pair[1]);
                    }
                }
            }
            MeshArrangement::Lines => {
                for line in indices.chunks_exact(2) {
                    f(line[0], line[1], line[0]);
                }
            }
            MeshArrangement::LineStrip => {
                for line in indices.windows(2) {
                    f(line[0], line[1], line[0]);
                }
            }
            MeshArrangement::Points => {}
        }
    }

    /// Flip triangle winding. Only meaningful for triangle lists.
    pub fn reverse_winding(&mut self) -> Result<(), AssetError> {
        if self.arrangement != MeshArrangement::Triangles {
            return Err(AssetError::UnsupportedArrangement(self.arrangement));
        }
        for tri in self.index_data.indices_mut().chunks_exact_mut(3) {
            tri.swap(0, 2);
        }
        self.index_data.done();
        Ok(())
    }
}

/// Borrowed view of a submesh that resolves shared vertex data through its mesh
#[derive(Debug, Clone, Copy)]
pub struct SubMeshRef<'a> {
    mesh: &'a Mesh,
    submesh: &'a SubMesh,
}

impl<'a> SubMeshRef<'a> {
    /// The submesh itself
    pub const fn submesh(&self) -> &'a SubMesh {
        self.submesh
    }

    /// Vertices this submesh draws from.
    ///
    /// `None` only when the submesh is marked shared but the mesh has no
    /// shared buffer, which [`Mesh::new_submesh`] prevents.
    pub fn vertex_data(&self) -> Option<&'a VertexData> {
        match &self.submesh.storage {
            VertexStorage::Owned(data) => Some(data),
            VertexStorage::Shared => self.mesh.shared_data.as_ref(),
        }
    }

    /// Index list
    pub const fn index_data(&self) -> &'a IndexData {
        &self.submesh.index_data
    }
}

/// Whether a submesh shares the mesh's vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubMeshData {
    /// Draw from the mesh's shared buffer
    Shared,
    /// Own a private buffer with the given attributes
    Owned(VertexSpecification),
}

/// Collection of submeshes plus an optional shared vertex buffer
#[derive(Debug, Clone)]
pub struct Mesh {
    id: MeshId,
    shared_data: Option<VertexData>,
    submeshes: Vec<SubMesh>,
}

impl Mesh {
    /// Empty mesh without shared data
    pub const fn new(id: MeshId) -> Self {
        Self {
            id,
            shared_data: None,
            submeshes: Vec::new(),
        }
    }

    /// Empty mesh with an (empty) shared vertex buffer
    pub fn with_shared_data(id: MeshId, specification: VertexSpecification) -> Self {
        Self {
            id,
            shared_data: Some(VertexData::new(specification)),
            submeshes: Vec::new(),
        }
    }

    /// Mesh id
    pub const fn id(&self) -> MeshId {
        self.id
    }

    /// Shared vertex buffer
    pub const fn shared_data(&self) -> Option<&VertexData> {
        self.shared_data.as_ref()
    }

    /// Mutable shared vertex buffer. Every submesh using shared data sees the
    /// edits.
    pub fn shared_data_mut(&mut self) -> Option<&mut VertexData> {
        self.shared_data.as_mut()
    }

    /// Create a submesh and return its index
    pub fn new_submesh(
        &mut self,
        name: impl Into<String>,
        material: MaterialId,
        arrangement: MeshArrangement,
        data: SubMeshData,
        index_type: IndexType,
    ) -> Result<usize, AssetError> {
        let storage = match data {
            SubMeshData::Shared => {
                if self.shared_data.is_none() {
                    return Err(AssetError::NoSharedData(self.id));
                }
                VertexStorage::Shared
            }
            SubMeshData::Owned(spec) => VertexStorage::Owned(VertexData::new(spec)),
        };

        self.submeshes.push(SubMesh {
            name: name.into(),
            material,
            arrangement,
            storage,
            index_data: IndexData::new(index_type),
            ranges: VertexRangeList::new(),
            bounds: None,
        });
        Ok(self.submeshes.len() - 1)
    }

    /// Number of submeshes
    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// View of the submesh at `index`
    pub fn submesh(&self, index: usize) -> Option<SubMeshRef<'_>> {
        self.submeshes.get(index).map(|submesh| SubMeshRef {
            mesh: self,
            submesh,
        })
    }

    /// Mutable submesh (indices, ranges, material)
    pub fn submesh_mut(&mut self, index: usize) -> Option<&mut SubMesh> {
        self.submeshes.get_mut(index)
    }

    /// All submeshes in creation order
    pub fn submeshes(&self) -> impl Iterator<Item = SubMeshRef<'_>> {
        self.submeshes.iter().map(move |submesh| SubMeshRef {
            mesh: self,
            submesh,
        })
    }

    /// Vertices of a submesh, writable. Shared data is edited in place on the
    /// mesh, owned data on the submesh.
    pub fn submesh_vertex_data_mut(&mut self, index: usize) -> Result<&mut VertexData, AssetError> {
        let id = self.id;
        let submesh = self
            .submeshes
            .get_mut(index)
            .ok_or(AssetError::SubMeshOutOfRange { mesh: id, index })?;
        match &mut submesh.storage {
            VertexStorage::Owned(data) => Ok(data),
            VertexStorage::Shared => self.shared_data.as_mut().ok_or(AssetError::NoSharedData(id)),
        }
    }

    /// Reassign a submesh's material
    pub fn set_submesh_material(&mut self, index: usize, material: MaterialId) -> Result<(), AssetError> {
        let id = self.id;
        let submesh = self
            .submeshes
            .get_mut(index)
            .ok_or(AssetError::SubMeshOutOfRange { mesh: id, index })?;
        submesh.material = material;
        Ok(())
    }

    /// Materials referenced by the submeshes, in submesh order, deduplicated
    pub fn materials(&self) -> Vec<MaterialId> {
        let mut out: Vec<MaterialId> = Vec::new();
        for submesh in &self.submeshes {
            if !out.contains(&submesh.material) {
                out.push(submesh.material);
            }
        }
        out
    }

    /// Recolour every vertex referenced by a submesh's indices
    pub fn set_submesh_diffuse(&mut self, index: usize, colour: [f32; 4]) -> Result<(), AssetError> {
        let indices: Vec<u32> = self
            .submeshes
            .get(index)
            .ok_or(AssetError::SubMeshOutOfRange { mesh: self.id, index })?
            .index_data
            .indices()
            .to_vec();

        let data = self.submesh_vertex_data_mut(index)?;
        for i in indices {
            data.set_diffuse(i as usize, colour)?;
        }
        data.done();
        Ok(())
    }

    /// Recompute per-submesh bounds from the indexed vertices
    pub fn recalc_bounds(&mut self) {
        let shared = self.shared_data.as_ref();
        for submesh in &mut self.submeshes {
            let data = match &submesh.storage {
                VertexStorage::Owned(data) => Some(data),
                VertexStorage::Shared => shared,
            };
            submesh.bounds = data.and_then(|d| d.bounds_of(submesh.index_data.indices()));
        }
    }

    /// Bounds enclosing every submesh, after [`recalc_bounds`](Self::recalc_bounds)
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        self.submeshes
            .iter()
            .filter_map(|s| s.bounds)
            .reduce(|(amin, amax), (bmin, bmax)| {
                (
                    [amin[0].min(bmin[0]), amin[1].min(bmin[1]), amin[2].min(bmin[2])],
                    [amax[0].max(bmax[0]), amax[1].max(bmax[1]), amax[2].max(bmax[2])],
                )
            })
    }

    /// Check every submesh's indices against its vertex count
    pub fn validate(&self) -> Result<(), AssetError> {
        for submesh in self.submeshes() {
            let count = submesh.vertex_data().map_or(0, VertexData::count);
            submesh.index_data().validate(count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::vertex_data::Vertex;

    fn quad_mesh() -> Mesh {
        let mut mesh = Mesh::with_shared_data(MeshId::from_raw(1), VertexSpecification::POSITION_NORMAL_UV);
        {
            let data = mesh.shared_data_mut().unwrap();
            for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]] {
                data.push(Vertex::at(p));
            }
            data.done();
        }
        let sm = mesh
            .new_submesh("quad", MaterialId::from_raw(1), MeshArrangement::Triangles, SubMeshData::Shared, IndexType::U16)
            .unwrap();
        mesh.submesh_mut(sm).unwrap().index_data_mut().extend(&[0, 1, 2, 0, 2, 3]).unwrap();
        mesh
    }

    #[test]
    fn test_shared_edits_visible_through_submesh() {
        let mut mesh = quad_mesh();
        let before = mesh.shared_data().unwrap().buffer().as_ptr();

        mesh.shared_data_mut().unwrap().set_position(0, [9.0, 9.0, 9.0]).unwrap();

        let submesh = mesh.submesh(0).unwrap();
        assert!(submesh.submesh().uses_shared_data());
        assert!(submesh.submesh().owned_vertex_data().is_none());
        let data = submesh.vertex_data().unwrap();
        assert_eq!(data.vertex(0).unwrap().position, [9.0, 9.0, 9.0]);
        // Sole owner: edited in place, no private copy anywhere
        assert!(mesh.shared_data().unwrap().buffer().is_unique());
        assert_eq!(mesh.shared_data().unwrap().buffer().as_ptr(), before);
    }

    #[test]
    fn test_shared_submesh_requires_shared_data() {
        let mut mesh = Mesh::new(MeshId::from_raw(2));
        let err = mesh
            .new_submesh("x", MaterialId::from_raw(1), MeshArrangement::Triangles, SubMeshData::Shared, IndexType::U16)
            .unwrap_err();
        assert!(matches!(err, AssetError::NoSharedData(_)));
    }

    #[test]
    fn test_owned_submesh_edits_stay_private() {
        let mut mesh = quad_mesh();
        let owned = mesh
            .new_submesh(
                "owned",
                MaterialId::from_raw(2),
                MeshArrangement::Points,
                SubMeshData::Owned(VertexSpecification::POSITION),
                IndexType::U16,
            )
            .unwrap();
        mesh.submesh_vertex_data_mut(owned).unwrap().push(Vertex::at([3.0, 3.0, 3.0]));

        assert_eq!(mesh.shared_data().unwrap().count(), 4);
        assert_eq!(mesh.submesh(owned).unwrap().vertex_data().unwrap().count(), 1);
        assert_eq!(mesh.materials(), vec![MaterialId::from_raw(1), MaterialId::from_raw(2)]);
    }

    #[test]
    fn test_reverse_winding_and_triangles() {
        let mut mesh = quad_mesh();
        mesh.submesh_mut(0).unwrap().reverse_winding().unwrap();

        let mut tris = Vec::new();
        mesh.submesh(0).unwrap().submesh().each_triangle(|a, b, c| tris.push((a, b, c)));
        assert_eq!(tris, vec![(2, 1, 0), (3, 2, 0)]);
    }

    #[test]
    fn test_set_diffuse_and_bounds() {
        let mut mesh = quad_mesh();
        mesh.set_submesh_diffuse(0, [1.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(mesh.shared_data().unwrap().vertex(3).unwrap().diffuse, [1.0, 0.0, 0.0, 1.0]);

        mesh.recalc_bounds();
        assert_eq!(mesh.bounds(), Some(([0.0, 0.0, 0.0], [1.0, 1.0, 0.0])));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_draw_count_prefers_ranges() {
        let mut mesh = quad_mesh();
        assert_eq!(mesh.submesh(0).unwrap().submesh().draw_count(), 6);
        mesh.submesh_mut(0).unwrap().add_range(0, 3);
        assert_eq!(mesh.submesh(0).unwrap().submesh().draw_count(), 3);
    }

    #[test]
    fn test_draw_count_saturates_on_huge_ranges() {
        let mut mesh = quad_mesh();
        let submesh = mesh.submesh_mut(0).unwrap();
        submesh.add_range(0, u32::MAX);
        submesh.add_range(0, 6);
        assert_eq!(mesh.submesh(0).unwrap().submesh().draw_count(), u32::MAX);
    }
}
