//! Core engine implementation
//!
//! One [`Engine::frame`] call:
//!
//! ```text
//! timer ─ idle tasks ─ screen fixed updates ─ screen update
//!       ─ asset GC ─ clear queue ─ collect stage ─ draw into sink
//! ```

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::assets::AssetError;
use crate::config::{Config, ConfigError, EngineConfig};
use crate::foundation::time::{FrameTimer, Stopwatch};
use crate::render::{RenderPriorityQueue, RenderSink, RenderableCollector};
use crate::scene::{Screen, ScreenError, ScreenManager, Stage, StageError};
use crate::scheduler::IdleTaskManager;

/// What one frame did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Submissions queued
    pub submissions: usize,
    /// Leaf batches drawn
    pub batches: usize,
    /// Draw calls issued
    pub draw_calls: usize,
    /// State applications issued
    pub state_changes: usize,
    /// Actors or submeshes skipped
    pub skipped: usize,
    /// Idle tasks called
    pub idle_tasks: usize,
    /// Fixed updates run
    pub fixed_steps: usize,
    /// Assets released by garbage collection
    pub released_assets: usize,
    /// Time spent building and walking the queue
    pub build_time: Duration,
}

/// Main engine struct
///
/// Owns the stage, the screen registry, the idle tasks and the render queue,
/// and runs them in a fixed order every frame.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    stage: Stage,
    screens: ScreenManager,
    idle: IdleTaskManager,
    timer: FrameTimer,
    queue: RenderPriorityQueue,
    collector: RenderableCollector,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Self {
        log::info!("Initializing engine...");

        let mut timer = FrameTimer::new();
        timer.set_max_frame_time(config.timer.max_frame_time);
        if let Some(hz) = config.timer.fixed_step_hz {
            timer.set_fixed(hz);
            log::info!("Fixed step at {hz} Hz");
        }

        let mut stage = Stage::new();
        stage.set_default_priority(config.render.default_priority);
        stage
            .assets_mut()
            .set_grace_period(config.assets.unclaimed_grace_period);

        Self {
            collector: RenderableCollector::new().with_skip_empty(config.render.skip_empty_batches),
            config,
            stage,
            screens: ScreenManager::new(),
            idle: IdleTaskManager::new(),
            timer,
            queue: RenderPriorityQueue::new(),
        }
    }

    /// Create an engine from a `.toml` or `.ron` config file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Ok(Self::new(EngineConfig::load_from_file(path)?))
    }

    /// Run one frame of `elapsed` seconds and draw it into `sink`
    pub fn frame(&mut self, sink: &mut dyn RenderSink, elapsed: f32) -> Result<FrameStats, EngineError> {
        let dt = self.timer.update_frame_time(elapsed);
        self.run_frame(sink, dt)
    }

    /// Run one frame timed by the wall clock
    pub fn tick(&mut self, sink: &mut dyn RenderSink) -> Result<FrameStats, EngineError> {
        let dt = self.timer.tick();
        self.run_frame(sink, dt)
    }

    fn run_frame(&mut self, sink: &mut dyn RenderSink, dt: f32) -> Result<FrameStats, EngineError> {
        let mut stats = FrameStats {
            idle_tasks: self.idle.execute_with_time(dt),
            ..FrameStats::default()
        };

        if let Some(step) = self.timer.fixed_step() {
            while self.timer.can_update() {
                self.screens.fixed_update(&mut self.stage, step)?;
                stats.fixed_steps += 1;
            }
        }
        self.screens.update(&mut self.stage, dt)?;

        self.stage.assets_mut().advance_clock(dt);
        if self.config.assets.collect_garbage_every_frame {
            stats.released_assets = self.stage.assets_mut().collect_garbage();
        }

        let stopwatch = Stopwatch::start_new();
        self.queue.clear();
        let collected = self.collector.collect(&self.stage, &mut self.queue);
        let drawn = self.queue.draw(sink);
        stats.build_time = stopwatch.elapsed();

        stats.submissions = collected.submissions;
        stats.skipped = collected.skipped;
        stats.batches = drawn.batches;
        stats.draw_calls = drawn.draw_calls;
        stats.state_changes = drawn.state_changes;

        log::debug!(
            "Frame {}: {} draw call(s) in {} batch(es), {} state change(s)",
            self.timer.frame_count(),
            stats.draw_calls,
            stats.batches,
            stats.state_changes
        );
        Ok(stats)
    }

    /// Register a screen under `name`
    pub fn register_screen(&mut self, name: impl Into<String>, screen: Box<dyn Screen>) -> Result<(), EngineError> {
        self.screens.register(name, screen)?;
        Ok(())
    }

    /// Make a registered screen current
    pub fn activate_screen(&mut self, name: &str) -> Result<(), EngineError> {
        self.screens.activate(name, &mut self.stage)?;
        Ok(())
    }

    /// Settings the engine was built with
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scene graph
    pub const fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Scene graph for editing
    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Screen registry
    pub fn screens_mut(&mut self) -> &mut ScreenManager {
        &mut self.screens
    }

    /// Idle tasks
    pub fn idle_mut(&mut self) -> &mut IdleTaskManager {
        &mut self.idle
    }

    /// Frame timer
    pub const fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Queue built by the last frame
    pub const fn queue(&self) -> &RenderPriorityQueue {
        &self.queue
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A screen failed
    #[error("Screen error: {0}")]
    Screen(#[from] ScreenError),

    /// Invalid stage operation
    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    /// Invalid asset operation
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}
