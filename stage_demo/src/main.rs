//! Stage demo application
//!
//! Builds a small scene (a textured ground and two crates sharing one mesh
//! under a common yard node, plus a two-pass glowing marker in the
//! foreground), runs a few frames and logs the draw sequence the render
//! queue produces.
//!
//! Usage: `stage_demo [config.toml|config.ron]`

use stage_engine::foundation::logging;
use stage_engine::prelude::*;
use stage_engine::render::GeometryRef;
use thiserror::Error;

/// Sink that logs every call instead of talking to a GPU
#[derive(Default)]
struct LogSink {
    depth: usize,
}

impl RenderSink for LogSink {
    fn begin_pass(&mut self, priority: RenderPriority, pass: usize) {
        log::info!("begin pass {pass} of priority {priority}");
    }

    fn apply_state(&mut self, state: &StateKey) {
        self.depth += 1;
        log::info!("{:indent$}apply {state:?}", "", indent = self.depth * 2);
    }

    fn draw(&mut self, geometry: &GeometryRef, iteration: u8) {
        log::info!(
            "{:indent$}draw {} {} submesh {} ({} indices, iteration {iteration})",
            "",
            geometry.node,
            geometry.mesh,
            geometry.submesh,
            geometry.draw_count,
            indent = (self.depth + 1) * 2
        );
    }

    fn restore_state(&mut self, _state: &StateKey) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn end_pass(&mut self, priority: RenderPriority, pass: usize) {
        log::info!("end pass {pass} of priority {priority}");
    }
}

#[derive(Error, Debug)]
enum DemoError {
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Missing asset: {0}")]
    Missing(String),
}

impl From<DemoError> for ScreenError {
    fn from(error: DemoError) -> Self {
        Self::Custom(error.to_string())
    }
}

/// The demo scene
#[derive(Default)]
struct Yard {
    crates: Vec<NodeId>,
    marker: Option<NodeId>,
    spin: f32,
}

impl Yard {
    fn build(&mut self, stage: &mut Stage) -> Result<(), DemoError> {
        let assets = stage.assets_mut();
        let shader = assets.new_shader_id();
        let grass = assets.new_texture_id();
        let wood = assets.new_texture_id();

        let ground_material = textured_material(assets, shader, grass)?;
        let crate_material = textured_material(assets, shader, wood)?;
        let glow_material = assets.new_material(GarbageCollect::Periodic);
        {
            let material = assets
                .material_mut(glow_material)
                .ok_or_else(|| DemoError::Missing(glow_material.to_string()))?;
            material.add_pass(MaterialPass::new(shader))?;
            material.add_pass(
                MaterialPass::new(shader)
                    .with_blend(BlendMode::Add)
                    .with_depth(true, false)
                    .with_iteration(IterationType::N(2)),
            )?;
        }

        let quad = quad_mesh(assets, ground_material)?;
        let crate_mesh = quad_mesh(assets, crate_material)?;
        let marker_mesh = quad_mesh(assets, glow_material)?;

        // ground and crates share an unscaled parent so the ground's scale stays its own
        let yard = stage.new_actor();
        if let Some(node) = stage.node_mut(yard) {
            node.name = "yard".to_owned();
        }

        let ground = stage.new_child(yard, NodeKind::Actor)?;
        stage.set_mesh(ground, Some(quad))?;
        if let Some(node) = stage.node_mut(ground) {
            node.name = "ground".to_owned();
            node.render_priority = RenderPriority::BACKGROUND;
            node.transform.scale = Vec3::new(20.0, 1.0, 20.0);
        }

        for x in [-2.0, 2.0] {
            let id = stage.new_child(yard, NodeKind::Actor)?;
            stage.set_mesh(id, Some(crate_mesh))?;
            if let Some(node) = stage.node_mut(id) {
                node.transform.position = Vec3::new(x, 0.5, 0.0);
            }
            self.crates.push(id);
        }

        let marker = stage.new_actor_with_mesh(marker_mesh)?;
        if let Some(node) = stage.node_mut(marker) {
            node.name = "marker".to_owned();
            node.render_priority = RenderPriority::FOREGROUND;
        }
        self.marker = Some(marker);

        stage.new_camera();
        stage.new_light();
        Ok(())
    }
}

impl Screen for Yard {
    fn load(&mut self, stage: &mut Stage) -> Result<(), ScreenError> {
        log::info!("Loading yard...");
        self.build(stage)?;
        log::info!("Yard loaded with {} node(s)", stage.node_count());
        Ok(())
    }

    fn update(&mut self, stage: &mut Stage, dt: f32) -> Result<(), ScreenError> {
        self.spin += dt;
        for &id in &self.crates {
            if let Some(node) = stage.node_mut(id) {
                node.transform.position.y = 0.5 + self.spin.sin() * 0.1;
            }
        }
        Ok(())
    }
}

fn textured_material(
    assets: &mut AssetManager,
    shader: ShaderId,
    texture: TextureId,
) -> Result<MaterialId, DemoError> {
    let id = assets.new_material(GarbageCollect::Periodic);
    let material = assets
        .material_mut(id)
        .ok_or_else(|| DemoError::Missing(id.to_string()))?;
    material.add_pass(MaterialPass::new(shader).with_texture(texture)?)?;
    Ok(id)
}

fn quad_mesh(assets: &mut AssetManager, material: MaterialId) -> Result<MeshId, DemoError> {
    let id = assets.new_mesh_with_shared_data(VertexSpecification::POSITION_NORMAL_UV, GarbageCollect::Periodic);
    let mesh = assets.mesh_mut(id).ok_or_else(|| DemoError::Missing(id.to_string()))?;

    if let Some(vertices) = mesh.shared_data_mut() {
        for position in [[-0.5, 0.0, -0.5], [0.5, 0.0, -0.5], [0.5, 0.0, 0.5], [-0.5, 0.0, 0.5]] {
            vertices.push(Vertex::at(position));
        }
    }
    let sub = mesh.new_submesh("quad", material, MeshArrangement::Triangles, SubMeshData::Shared, IndexType::U16)?;
    if let Some(submesh) = mesh.submesh_mut(sub) {
        submesh.index_data_mut().extend(&[0, 1, 2, 0, 2, 3])?;
    }
    mesh.validate()?;
    Ok(id)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };
    logging::init_with_filter(&config.logging.filter);

    log::info!("Starting stage demo...");
    let mut engine = Engine::new(config);
    engine.register_screen("yard", Box::new(Yard::default()))?;
    engine.activate_screen("yard")?;

    let mut sink = LogSink::default();
    for frame in 0..3 {
        let stats = engine.frame(&mut sink, 1.0 / 60.0)?;
        log::info!(
            "Frame {frame}: {} submission(s), {} batch(es), {} draw call(s), {} state change(s) in {:?}",
            stats.submissions,
            stats.batches,
            stats.draw_calls,
            stats.state_changes,
            stats.build_time
        );
    }

    log::info!("Stage demo finished");
    Ok(())
}
