//! Materials and their passes
//!
//! The batcher never interprets a material. It only reads the per-pass GPU
//! state (shader, depth, blending, fill mode, bound textures) to build a
//! state-key chain.

use serde::{Deserialize, Serialize};

use crate::foundation::ids::{MaterialId, ShaderId, TextureId};
use crate::render::queue::MAX_MATERIAL_PASSES;

use super::AssetError;

/// Texture units a single pass may bind
pub const MAX_TEXTURE_UNITS: usize = 8;

/// Framebuffer blending for a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Blending disabled
    #[default]
    None,
    /// `ONE, ONE`
    Add,
    /// `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`
    Alpha,
    /// `SRC_COLOR, ONE_MINUS_SRC_COLOR`
    Colour,
    /// `DST_COLOR, ZERO`
    Modulate,
    /// `ONE, ONE_MINUS_SRC_ALPHA`
    OneOneMinusAlpha,
}

impl BlendMode {
    /// Whether the pass blends with what is already in the framebuffer
    pub const fn is_blended(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Rasterisation fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum PolygonMode {
    /// Filled polygons
    #[default]
    Fill,
    /// Wireframe
    Line,
    /// Vertices only
    Point,
}

/// How many times a renderable is drawn in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IterationType {
    /// Draw once
    #[default]
    Once,
    /// Draw `n` times, passing the iteration index to the backend
    N(u8),
}

impl IterationType {
    /// Number of draws per renderable
    pub const fn count(self) -> u8 {
        match self {
            Self::Once => 1,
            Self::N(n) => n,
        }
    }
}

/// GPU state for one pass of a material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialPass {
    /// Shader program
    pub shader: ShaderId,
    /// Depth testing enabled
    pub depth_test: bool,
    /// Depth writes enabled
    pub depth_write: bool,
    /// Blending
    pub blend: BlendMode,
    /// Fill mode
    pub polygon_mode: PolygonMode,
    /// Iteration
    pub iteration: IterationType,
    texture_units: Vec<TextureId>,
}

impl MaterialPass {
    /// Opaque, depth-tested pass without textures
    pub const fn new(shader: ShaderId) -> Self {
        Self {
            shader,
            depth_test: true,
            depth_write: true,
            blend: BlendMode::None,
            polygon_mode: PolygonMode::Fill,
            iteration: IterationType::Once,
            texture_units: Vec::new(),
        }
    }

    /// Builder-style blend override
    #[must_use]
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// Builder-style depth override
    #[must_use]
    pub fn with_depth(mut self, test: bool, write: bool) -> Self {
        self.depth_test = test;
        self.depth_write = write;
        self
    }

    /// Builder-style iteration override
    #[must_use]
    pub fn with_iteration(mut self, iteration: IterationType) -> Self {
        self.iteration = iteration;
        self
    }

    /// Builder-style texture binding on the next free unit
    pub fn with_texture(mut self, texture: TextureId) -> Result<Self, AssetError> {
        self.add_texture(texture)?;
        Ok(self)
    }

    /// Bind a texture on the next free unit
    pub fn add_texture(&mut self, texture: TextureId) -> Result<u8, AssetError> {
        if self.texture_units.len() >= MAX_TEXTURE_UNITS {
            return Err(AssetError::TooManyTextureUnits {
                count: self.texture_units.len() + 1,
            });
        }
        self.texture_units.push(texture);
        Ok(u8::try_from(self.texture_units.len() - 1).unwrap_or(u8::MAX))
    }

    /// Replace the texture bound on `unit`
    pub fn set_texture(&mut self, unit: usize, texture: TextureId) -> Result<(), AssetError> {
        let count = self.texture_units.len();
        let slot = self
            .texture_units
            .get_mut(unit)
            .ok_or(AssetError::IndexOutOfRange { index: unit, max: count })?;
        *slot = texture;
        Ok(())
    }

    /// Textures in unit order
    pub fn texture_units(&self) -> &[TextureId] {
        &self.texture_units
    }
}

/// Ordered list of passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    id: MaterialId,
    passes: Vec<MaterialPass>,
}

impl Material {
    /// Material with no passes
    pub const fn new(id: MaterialId) -> Self {
        Self {
            id,
            passes: Vec::new(),
        }
    }

    /// Material id
    pub const fn id(&self) -> MaterialId {
        self.id
    }

    /// Append a pass and return its index
    pub fn add_pass(&mut self, pass: MaterialPass) -> Result<usize, AssetError> {
        if self.passes.len() >= MAX_MATERIAL_PASSES {
            return Err(AssetError::TooManyPasses {
                material: self.id,
                count: self.passes.len() + 1,
            });
        }
        self.passes.push(pass);
        Ok(self.passes.len() - 1)
    }

    /// Pass at `index`
    pub fn pass(&self, index: usize) -> Option<&MaterialPass> {
        self.passes.get(index)
    }

    /// Mutable pass at `index`
    pub fn pass_mut(&mut self, index: usize) -> Option<&mut MaterialPass> {
        self.passes.get_mut(index)
    }

    /// Passes in order
    pub fn passes(&self) -> &[MaterialPass] {
        &self.passes
    }

    /// Number of passes
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// True if any pass blends
    pub fn is_blended(&self) -> bool {
        self.passes.iter().any(|p| p.blend.is_blended())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_unit_limit() {
        let mut pass = MaterialPass::new(ShaderId::from_raw(1));
        for i in 0..MAX_TEXTURE_UNITS as u64 {
            pass.add_texture(TextureId::from_raw(i + 1)).unwrap();
        }
        assert!(matches!(
            pass.add_texture(TextureId::from_raw(99)),
            Err(AssetError::TooManyTextureUnits { count: 9 })
        ));
    }

    #[test]
    fn test_pass_limit() {
        let mut material = Material::new(MaterialId::from_raw(1));
        for _ in 0..MAX_MATERIAL_PASSES {
            material.add_pass(MaterialPass::new(ShaderId::from_raw(1))).unwrap();
        }
        assert!(material.add_pass(MaterialPass::new(ShaderId::from_raw(1))).is_err());
        assert_eq!(material.pass_count(), MAX_MATERIAL_PASSES);
    }

    #[test]
    fn test_blend_detection() {
        let mut material = Material::new(MaterialId::from_raw(1));
        material.add_pass(MaterialPass::new(ShaderId::from_raw(1))).unwrap();
        assert!(!material.is_blended());
        material
            .add_pass(MaterialPass::new(ShaderId::from_raw(1)).with_blend(BlendMode::Add))
            .unwrap();
        assert!(material.is_blended());
    }

    #[test]
    fn test_iteration_count() {
        assert_eq!(IterationType::Once.count(), 1);
        assert_eq!(IterationType::N(3).count(), 3);
    }
}
