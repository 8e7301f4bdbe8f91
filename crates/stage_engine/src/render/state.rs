//! GPU state discriminators used to route submissions into the group tree
//!
//! A [`StateChain`] lists, from the root of the tree down, the state each
//! level of [`RenderGroup`](super::group::RenderGroup) binds. The batcher
//! treats every key as an opaque comparable value.

use crate::assets::material::{BlendMode, MaterialPass, PolygonMode, MAX_TEXTURE_UNITS};
use crate::foundation::ids::{ShaderId, TextureId};

/// One level of GPU state
///
/// The derived ordering decides the sibling order of groups during the
/// draw walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateKey {
    /// Shader program bind
    Shader(ShaderId),
    /// Depth test and write flags
    Depth {
        /// Depth test enabled
        test: bool,
        /// Depth writes enabled
        write: bool,
    },
    /// Framebuffer blending
    Blend(BlendMode),
    /// Fill mode
    RenderSettings(PolygonMode),
    /// Texture bound on a unit
    Texture {
        /// Texture unit
        unit: u8,
        /// Bound texture
        texture: TextureId,
    },
}

/// Ordered state keys for one submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StateChain {
    keys: Vec<StateKey>,
}

impl StateChain {
    /// Empty chain; submissions land directly on the pass root
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Chain for a material pass:
    /// shader, depth, blend, fill mode, then one key per bound texture unit
    ///
    /// # Panics
    ///
    /// If the pass binds more than [`MAX_TEXTURE_UNITS`] textures.
    pub fn from_pass(pass: &MaterialPass) -> Self {
        let textures = pass.texture_units();
        assert!(
            textures.len() <= MAX_TEXTURE_UNITS,
            "pass binds {} texture units, at most {MAX_TEXTURE_UNITS} are supported",
            textures.len()
        );

        let mut keys = Vec::with_capacity(4 + textures.len());
        keys.push(StateKey::Shader(pass.shader));
        keys.push(StateKey::Depth {
            test: pass.depth_test,
            write: pass.depth_write,
        });
        keys.push(StateKey::Blend(pass.blend));
        keys.push(StateKey::RenderSettings(pass.polygon_mode));
        keys.extend(textures.iter().enumerate().map(|(unit, &texture)| StateKey::Texture {
            unit: u8::try_from(unit).unwrap_or(u8::MAX),
            texture,
        }));
        Self { keys }
    }

    /// Append a key at the deep end
    ///
    /// # Panics
    ///
    /// If the key names a texture unit past [`MAX_TEXTURE_UNITS`].
    #[must_use]
    pub fn then(mut self, key: StateKey) -> Self {
        if let StateKey::Texture { unit, .. } = key {
            assert!(
                usize::from(unit) < MAX_TEXTURE_UNITS,
                "texture unit {unit} out of range"
            );
        }
        self.keys.push(key);
        self
    }

    /// Keys from the root down
    pub fn keys(&self) -> &[StateKey] {
        &self.keys
    }

    /// Depth of the leaf this chain resolves to
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True for the empty chain
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl MaterialPass {
    /// State chain used to batch this pass
    pub fn state_chain(&self) -> StateChain {
        StateChain::from_pass(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_chain_layout() {
        let pass = MaterialPass::new(ShaderId::from_raw(3))
            .with_blend(BlendMode::Alpha)
            .with_texture(TextureId::from_raw(5))
            .unwrap()
            .with_texture(TextureId::from_raw(6))
            .unwrap();

        let chain = pass.state_chain();
        assert_eq!(
            chain.keys(),
            &[
                StateKey::Shader(ShaderId::from_raw(3)),
                StateKey::Depth { test: true, write: true },
                StateKey::Blend(BlendMode::Alpha),
                StateKey::RenderSettings(PolygonMode::Fill),
                StateKey::Texture { unit: 0, texture: TextureId::from_raw(5) },
                StateKey::Texture { unit: 1, texture: TextureId::from_raw(6) },
            ]
        );
    }

    #[test]
    fn test_equal_passes_give_equal_chains() {
        let a = MaterialPass::new(ShaderId::from_raw(1));
        let b = MaterialPass::new(ShaderId::from_raw(1));
        assert_eq!(a.state_chain(), b.state_chain());
    }

    #[test]
    #[should_panic(expected = "texture unit")]
    fn test_texture_unit_out_of_range_is_fatal() {
        let _ = StateChain::new().then(StateKey::Texture {
            unit: MAX_TEXTURE_UNITS as u8,
            texture: TextureId::from_raw(1),
        });
    }
}
