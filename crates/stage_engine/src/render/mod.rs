//! # Render Queue and Batching
//!
//! Turns the visible contents of a stage into an ordered, state-grouped draw
//! sequence once per frame.
//!
//! ## Architecture
//!
//! ```text
//! RenderableCollector   stage walk → (priority, pass, state chain, geometry)
//!      ↓
//! RenderPriorityQueue   BTreeMap<RenderPriority, RenderQueue>
//!      ↓
//! RenderQueue           [Option<root>; MAX_MATERIAL_PASSES]
//!      ↓
//! GroupTree             one RenderGroup per distinct state value per level
//!      ↓
//! RenderSink            apply_state / draw / restore_state
//! ```
//!
//! Draw order is priority ascending, then pass ascending, then depth-first
//! through the group tree. The queue keeps nothing between frames; meshes are
//! only referenced by id.
//!
//! The render path is single threaded. Graphics backends plug in by
//! implementing [`RenderSink`].

pub mod priority;
pub mod state;
pub mod group;
pub mod queue;
pub mod priority_queue;
pub mod sink;
pub mod renderable_collector;

pub use group::{GeometryRef, GroupKey, GroupTree, RenderGroup};
pub use priority::{RenderPriority, PRIORITY_MAX, PRIORITY_MIN};
pub use priority_queue::{QueueStats, RenderPriorityQueue};
pub use queue::{RenderQueue, MAX_MATERIAL_PASSES};
pub use renderable_collector::{CollectStats, RenderableCollector};
pub use sink::{DrawCommand, DrawStats, RecordingSink, RenderSink};
pub use state::{StateChain, StateKey};
