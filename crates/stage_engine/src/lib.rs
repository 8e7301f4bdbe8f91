//! # Stage Engine
//!
//! Scene graph and render-queue core of a small 3D engine.
//!
//! ## Features
//!
//! - **Stage**: hierarchy of actors, cameras and lights with path watchers
//! - **Assets**: meshes with shared or per-submesh vertex data, multi-pass materials
//! - **Render queue**: per-priority, per-pass state trees that minimise state changes
//! - **Idle tasks**: re-entrant per-frame callbacks and timeouts
//! - **Screens**: named, lazily loaded game states
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stage_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default());
//!
//!     let stage = engine.stage_mut();
//!     let shader = stage.assets_mut().new_shader_id();
//!     let material = stage.assets_mut().new_material(GarbageCollect::Periodic);
//!     if let Some(material) = stage.assets_mut().material_mut(material) {
//!         material.add_pass(MaterialPass::new(shader))?;
//!     }
//!
//!     let mut sink = RecordingSink::new();
//!     let stats = engine.frame(&mut sink, 1.0 / 60.0)?;
//!     println!("{} draw call(s)", stats.draw_calls);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod assets;
pub mod events;
pub mod scene;
pub mod render;
pub mod scheduler;
pub mod config;

mod engine;

pub use config::{Config, ConfigError, EngineConfig};
pub use engine::{Engine, EngineError, FrameStats};

#[cfg(test)]
mod tests;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{
            AssetError, AssetManager, BlendMode, GarbageCollect, IndexType, IterationType, Material,
            MaterialPass, Mesh, MeshArrangement, SubMeshData, Vertex, VertexSpecification,
        },
        config::{Config, EngineConfig},
        events::Signal,
        foundation::{
            ids::{ConnectionId, MaterialId, MeshId, NodeId, ShaderId, TextureId},
            math::{Mat4, Transform, Vec3},
            time::{FrameTimer, Stopwatch},
        },
        render::{DrawCommand, RecordingSink, RenderPriority, RenderSink, StateKey},
        scene::{NodeKind, Screen, ScreenError, Stage, StageError, StageNodePath, WatchEvent},
        scheduler::IdleTaskManager,
        Engine, EngineError, FrameStats,
    };
}
