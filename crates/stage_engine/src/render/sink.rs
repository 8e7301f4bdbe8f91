//! Backend-facing draw interface
//!
//! The queue walk drives a [`RenderSink`]. A graphics backend implements it
//! by binding state and issuing draw calls; [`RecordingSink`] keeps the
//! command stream for tests and debugging.

use crate::foundation::ids::{MeshId, NodeId};

use super::group::GeometryRef;
use super::priority::RenderPriority;
use super::state::StateKey;

/// Receiver of the ordered draw sequence
pub trait RenderSink {
    /// A pass of a priority tier starts
    fn begin_pass(&mut self, _priority: RenderPriority, _pass: usize) {}

    /// Bind state for everything drawn until the matching restore
    fn apply_state(&mut self, state: &StateKey);

    /// Draw one geometry entry; `iteration` counts from 0 for multi-draw passes
    fn draw(&mut self, geometry: &GeometryRef, iteration: u8);

    /// Undo a previous [`apply_state`](Self::apply_state)
    fn restore_state(&mut self, state: &StateKey);

    /// The pass started by [`begin_pass`](Self::begin_pass) is finished
    fn end_pass(&mut self, _priority: RenderPriority, _pass: usize) {}
}

/// Counters gathered while walking a queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Leaf batches visited
    pub batches: usize,
    /// Draw calls issued
    pub draw_calls: usize,
    /// State applications issued
    pub state_changes: usize,
}

impl std::ops::AddAssign for DrawStats {
    fn add_assign(&mut self, rhs: Self) {
        self.batches += rhs.batches;
        self.draw_calls += rhs.draw_calls;
        self.state_changes += rhs.state_changes;
    }
}

/// One recorded sink call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    /// `begin_pass`
    BeginPass {
        /// Tier
        priority: RenderPriority,
        /// Pass index
        pass: usize,
    },
    /// `apply_state`
    Apply(StateKey),
    /// `draw`
    Draw {
        /// Submitting node
        node: NodeId,
        /// Mesh drawn
        mesh: MeshId,
        /// Submesh index
        submesh: usize,
        /// Iteration index
        iteration: u8,
    },
    /// `restore_state`
    Restore(StateKey),
    /// `end_pass`
    EndPass {
        /// Tier
        priority: RenderPriority,
        /// Pass index
        pass: usize,
    },
}

/// Sink that records every call
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    commands: Vec<DrawCommand>,
}

impl RecordingSink {
    /// Empty recording
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Recorded draws only
    pub fn draws(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Draw { .. }))
    }

    /// Number of draw calls
    pub fn draw_count(&self) -> usize {
        self.draws().count()
    }

    /// Number of state applications
    pub fn state_change_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Apply(_)))
            .count()
    }

    /// `(priority, pass)` pairs in the order they were drawn
    pub fn passes(&self) -> Vec<(RenderPriority, usize)> {
        self.commands
            .iter()
            .filter_map(|c| match *c {
                DrawCommand::BeginPass { priority, pass } => Some((priority, pass)),
                _ => None,
            })
            .collect()
    }

    /// Forget the recording
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl RenderSink for RecordingSink {
    fn begin_pass(&mut self, priority: RenderPriority, pass: usize) {
        self.commands.push(DrawCommand::BeginPass { priority, pass });
    }

    fn apply_state(&mut self, state: &StateKey) {
        self.commands.push(DrawCommand::Apply(*state));
    }

    fn draw(&mut self, geometry: &GeometryRef, iteration: u8) {
        self.commands.push(DrawCommand::Draw {
            node: geometry.node,
            mesh: geometry.mesh,
            submesh: geometry.submesh,
            iteration,
        });
    }

    fn restore_state(&mut self, state: &StateKey) {
        self.commands.push(DrawCommand::Restore(*state));
    }

    fn end_pass(&mut self, priority: RenderPriority, pass: usize) {
        self.commands.push(DrawCommand::EndPass { priority, pass });
    }
}
