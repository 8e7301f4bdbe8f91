//! Scene management
//!
//! The [`Stage`] owns a tree of [`StageNode`]s together with the assets they
//! draw. Screens ([`screen::Screen`]) populate and update stages; the render
//! collector walks them once per frame.
//!
//! ## Architecture
//!
//! ```text
//! ScreenManager (active screen)
//!      ↓ update(dt)
//! Stage (nodes, assets, watches)
//!      ↓ visit_visible
//! RenderableCollector → RenderPriorityQueue → RenderSink
//! ```

pub mod path;
pub mod watch;
pub mod node;
pub mod stage;
pub mod screen;

pub use node::{NodeKind, StageNode};
pub use path::StageNodePath;
pub use screen::{Screen, ScreenError, ScreenManager};
pub use stage::Stage;
pub use watch::{WatchController, WatchEvent};

use thiserror::Error;

use crate::foundation::ids::{MeshId, NodeId};

/// Stage errors
#[derive(Error, Debug)]
pub enum StageError {
    /// Id does not resolve to a live node
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Attaching would make a node its own ancestor
    #[error("Attaching {child} under {parent} would create a cycle")]
    CycleDetected {
        /// Node being moved
        child: NodeId,
        /// Requested parent
        parent: NodeId,
    },

    /// Id does not resolve to a live mesh
    #[error("Mesh not found: {0}")]
    MeshNotFound(MeshId),
}
