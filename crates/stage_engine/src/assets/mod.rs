//! Asset storage: geometry and materials
//!
//! File decoding lives outside the engine core. Loaders build [`Mesh`] and
//! [`Material`] values through the [`AssetManager`] API; the render path only
//! ever reads them by id.

pub mod cow_vec;
pub mod vertex_data;
pub mod mesh;
pub mod material;
pub mod manager;

pub use cow_vec::CowVec;
pub use vertex_data::{
    IndexData, IndexType, Vertex, VertexData, VertexRange, VertexRangeList, VertexSpecification,
};
pub use mesh::{Mesh, MeshArrangement, SubMesh, SubMeshData, SubMeshRef};
pub use material::{
    BlendMode, IterationType, Material, MaterialPass, PolygonMode, MAX_TEXTURE_UNITS,
};
pub use manager::{AssetManager, GarbageCollect, DEFAULT_GRACE_PERIOD};

use thiserror::Error;

use crate::foundation::ids::{MaterialId, MeshId};

/// Asset errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// No mesh with this id (never created or already released)
    #[error("Mesh not found: {0}")]
    MeshNotFound(MeshId),

    /// No material with this id
    #[error("Material not found: {0}")]
    MaterialNotFound(MaterialId),

    /// Submesh index past the end of the mesh
    #[error("Submesh {index} out of range for {mesh}")]
    SubMeshOutOfRange {
        /// Mesh that was indexed
        mesh: MeshId,
        /// Requested index
        index: usize,
    },

    /// A shared submesh was requested on a mesh without shared data
    #[error("{0} has no shared vertex data")]
    NoSharedData(MeshId),

    /// Element index outside a buffer or representable range
    #[error("Index {index} out of range (limit {max})")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Exclusive limit
        max: usize,
    },

    /// Index list refers past the end of the vertex buffer
    #[error("Index {index} refers past {vertex_count} vertices")]
    InvalidIndex {
        /// Offending index
        index: u32,
        /// Vertices available
        vertex_count: usize,
    },

    /// Operation needs a different primitive arrangement
    #[error("Unsupported arrangement: {0:?}")]
    UnsupportedArrangement(MeshArrangement),

    /// Pass binds more texture units than the hardware path supports
    #[error("Too many texture units: {count} (max {max})", max = MAX_TEXTURE_UNITS)]
    TooManyTextureUnits {
        /// Units requested
        count: usize,
    },

    /// Material has more passes than the render queue accepts
    #[error("{material} would have {count} passes")]
    TooManyPasses {
        /// Offending material
        material: MaterialId,
        /// Passes requested
        count: usize,
    },
}
