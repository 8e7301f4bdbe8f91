//! Vertex and index storage
//!
//! Both stores keep their elements in a [`CowVec`], so a mesh can hand the same
//! buffer to several consumers and only pays for a copy when one of them writes.

use bitflags::bitflags;

use super::cow_vec::CowVec;
use super::AssetError;

bitflags! {
    /// Attributes present in a vertex buffer
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VertexSpecification: u8 {
        /// Object-space position
        const POSITION = 1 << 0;
        /// Surface normal
        const NORMAL = 1 << 1;
        /// Per-vertex diffuse colour
        const DIFFUSE = 1 << 2;
        /// First texture coordinate set
        const TEXCOORD0 = 1 << 3;
        /// Second texture coordinate set
        const TEXCOORD1 = 1 << 4;
    }
}

impl VertexSpecification {
    /// Position, normal and one UV set
    pub const POSITION_NORMAL_UV: Self = Self::POSITION.union(Self::NORMAL).union(Self::TEXCOORD0);
}

impl Default for VertexSpecification {
    fn default() -> Self {
        Self::POSITION_NORMAL_UV
    }
}

/// One vertex record. Attributes missing from the buffer's specification keep
/// their default values and are ignored by the backend.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in object space
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Diffuse colour (RGBA)
    pub diffuse: [f32; 4],
    /// First texture coordinate set
    pub tex_coord0: [f32; 2],
    /// Second texture coordinate set
    pub tex_coord1: [f32; 2],
}

// Safe: only f32 arrays, repr(C), no padding (14 * 4 bytes)
unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0, 0.0, 1.0],
            diffuse: [1.0; 4],
            tex_coord0: [0.0; 2],
            tex_coord1: [0.0; 2],
        }
    }
}

impl Vertex {
    /// Vertex at a position with default attributes
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Builder-style UV override
    #[must_use]
    pub const fn with_tex_coord0(mut self, uv: [f32; 2]) -> Self {
        self.tex_coord0 = uv;
        self
    }

    /// Builder-style normal override
    #[must_use]
    pub const fn with_normal(mut self, normal: [f32; 3]) -> Self {
        self.normal = normal;
        self
    }
}

/// Vertex buffer with copy-on-write storage
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    specification: VertexSpecification,
    vertices: CowVec<Vertex>,
    version: u64,
}

impl Default for VertexData {
    fn default() -> Self {
        Self::new(VertexSpecification::default())
    }
}

impl VertexData {
    /// Empty buffer for the given attribute set
    pub fn new(specification: VertexSpecification) -> Self {
        Self {
            specification,
            vertices: CowVec::new(),
            version: 0,
        }
    }

    /// Buffer built from existing vertices
    pub fn from_vertices(specification: VertexSpecification, vertices: Vec<Vertex>) -> Self {
        Self {
            specification,
            vertices: CowVec::from_vec(vertices),
            version: 0,
        }
    }

    /// Attributes present in this buffer
    pub const fn specification(&self) -> VertexSpecification {
        self.specification
    }

    /// Number of vertices
    pub fn count(&self) -> usize {
        self.vertices.len()
    }

    /// True when there are no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex at `index`
    pub fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices.at(index)
    }

    /// All vertices
    pub fn vertices(&self) -> &[Vertex] {
        self.vertices.as_slice()
    }

    /// Underlying copy-on-write buffer
    pub const fn buffer(&self) -> &CowVec<Vertex> {
        &self.vertices
    }

    /// Raw bytes for upload to a GPU buffer
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.vertices.as_slice())
    }

    /// Size of one vertex record in bytes
    pub const fn stride() -> usize {
        std::mem::size_of::<Vertex>()
    }

    /// Append a vertex and return its index
    pub fn push(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// Replace the vertex at `index`
    pub fn set(&mut self, index: usize, vertex: Vertex) -> Result<(), AssetError> {
        let count = self.count();
        let slot = self
            .vertices
            .at_mut(index)
            .ok_or(AssetError::IndexOutOfRange { index, max: count })?;
        *slot = vertex;
        Ok(())
    }

    /// Set the position of the vertex at `index`
    pub fn set_position(&mut self, index: usize, position: [f32; 3]) -> Result<(), AssetError> {
        self.modify(index, |v| v.position = position)
    }

    /// Set the normal of the vertex at `index`
    pub fn set_normal(&mut self, index: usize, normal: [f32; 3]) -> Result<(), AssetError> {
        self.modify(index, |v| v.normal = normal)
    }

    /// Set the diffuse colour of the vertex at `index`
    pub fn set_diffuse(&mut self, index: usize, colour: [f32; 4]) -> Result<(), AssetError> {
        self.modify(index, |v| v.diffuse = colour)
    }

    /// Set the first UV set of the vertex at `index`
    pub fn set_tex_coord0(&mut self, index: usize, uv: [f32; 2]) -> Result<(), AssetError> {
        self.modify(index, |v| v.tex_coord0 = uv)
    }

    fn modify(&mut self, index: usize, f: impl FnOnce(&mut Vertex)) -> Result<(), AssetError> {
        let count = self.count();
        let vertex = self
            .vertices
            .at_mut(index)
            .ok_or(AssetError::IndexOutOfRange { index, max: count })?;
        f(vertex);
        Ok(())
    }

    /// Resize, filling new slots with default vertices
    pub fn resize(&mut self, count: usize) {
        self.vertices.resize(count, Vertex::default());
    }

    /// Reserve room for more vertices
    pub fn reserve(&mut self, additional: usize) {
        self.vertices.reserve(additional);
    }

    /// Remove every vertex
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Mark the current contents as complete. Backends re-upload a buffer
    /// whose version changed since their last upload.
    pub fn done(&mut self) {
        self.version += 1;
    }

    /// Upload generation, bumped by [`done`](Self::done)
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Axis-aligned bounds of the vertices selected by `indices`
    pub fn bounds_of(&self, indices: &[u32]) -> Option<([f32; 3], [f32; 3])> {
        let mut iter = indices
            .iter()
            .filter_map(|&i| self.vertex(i as usize))
            .map(|v| v.position);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(mut min, mut max), p| {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
            (min, max)
        }))
    }
}

/// Width of the indices a backend should upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexType {
    /// 8-bit indices
    U8,
    /// 16-bit indices
    #[default]
    U16,
    /// 32-bit indices
    U32,
}

impl IndexType {
    /// Largest index value representable
    pub const fn max_index(self) -> u32 {
        match self {
            Self::U8 => u8::MAX as u32,
            Self::U16 => u16::MAX as u32,
            Self::U32 => u32::MAX,
        }
    }

    /// Bytes per index
    pub const fn stride(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Index list with copy-on-write storage
#[derive(Debug, Clone, PartialEq)]
pub struct IndexData {
    index_type: IndexType,
    indices: CowVec<u32>,
    version: u64,
}

impl Default for IndexData {
    fn default() -> Self {
        Self::new(IndexType::default())
    }
}

impl IndexData {
    /// Empty list of the given width
    pub fn new(index_type: IndexType) -> Self {
        Self {
            index_type,
            indices: CowVec::new(),
            version: 0,
        }
    }

    /// Index width
    pub const fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Append an index, rejecting values too wide for the index type
    pub fn push(&mut self, index: u32) -> Result<(), AssetError> {
        let max = self.index_type.max_index();
        if index > max {
            return Err(AssetError::IndexOutOfRange {
                index: index as usize,
                max: max as usize,
            });
        }
        self.indices.push(index);
        Ok(())
    }

    /// Append several indices
    pub fn extend(&mut self, indices: &[u32]) -> Result<(), AssetError> {
        let max = self.index_type.max_index();
        if let Some(&bad) = indices.iter().find(|&&i| i > max) {
            return Err(AssetError::IndexOutOfRange {
                index: bad as usize,
                max: max as usize,
            });
        }
        self.indices.extend_from_slice(indices);
        Ok(())
    }

    /// Index at position `i`
    pub fn at(&self, i: usize) -> Option<u32> {
        self.indices.at(i).copied()
    }

    /// Number of indices
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    /// True when the list is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// All indices
    pub fn indices(&self) -> &[u32] {
        self.indices.as_slice()
    }

    /// Mutable access, copying a shared buffer first
    pub fn indices_mut(&mut self) -> &mut [u32] {
        self.indices.as_mut_slice()
    }

    /// Underlying copy-on-write buffer
    pub const fn buffer(&self) -> &CowVec<u32> {
        &self.indices
    }

    /// Reserve room for more indices
    pub fn reserve(&mut self, additional: usize) {
        self.indices.reserve(additional);
    }

    /// Remove every index
    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Mark contents as complete
    pub fn done(&mut self) {
        self.version += 1;
    }

    /// Upload generation, bumped by [`done`](Self::done)
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Check every index against a vertex count
    pub fn validate(&self, vertex_count: usize) -> Result<(), AssetError> {
        match self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            Some(&index) => Err(AssetError::InvalidIndex {
                index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }
}

/// Contiguous slice of an index list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexRange {
    /// First index in the slice
    pub start: u32,
    /// Number of indices
    pub count: u32,
}

impl VertexRange {
    /// One past the last index, saturating at `u32::MAX`
    pub const fn end(&self) -> u32 {
        self.start.saturating_add(self.count)
    }
}

/// Ranges drawn by a range-based submesh. Ranges are immutable once added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexRangeList {
    ranges: Vec<VertexRange>,
}

impl VertexRangeList {
    /// Empty list
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Append a range
    pub fn add(&mut self, start: u32, count: u32) {
        self.ranges.push(VertexRange { start, count });
    }

    /// All ranges in insertion order
    pub fn ranges(&self) -> &[VertexRange] {
        &self.ranges
    }

    /// Total number of indices covered, saturating at `u32::MAX`
    pub fn total_count(&self) -> u32 {
        self.ranges.iter().fold(0, |total, r| total.saturating_add(r.count))
    }

    /// Number of ranges
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True when no range was added
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Remove every range
    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}
