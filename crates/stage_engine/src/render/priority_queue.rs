//! All priority tiers of a frame

use std::collections::BTreeMap;

use super::group::{GeometryRef, GroupKey};
use super::priority::RenderPriority;
use super::queue::RenderQueue;
use super::sink::{DrawStats, RenderSink};
use super::state::StateChain;

/// Sizes of the current frame's queues
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Priority tiers in use
    pub queues: usize,
    /// Pass roots across all tiers
    pub passes: usize,
    /// Groups across all tiers, roots included
    pub groups: usize,
    /// Leaves holding geometry
    pub batches: usize,
    /// Submissions
    pub entries: usize,
}

/// One [`RenderQueue`] per priority in use, created lazily
#[derive(Debug, Default)]
pub struct RenderPriorityQueue {
    queues: BTreeMap<RenderPriority, RenderQueue>,
}

impl RenderPriorityQueue {
    /// No tiers
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue for `priority`, created on first use
    pub fn queue_mut(&mut self, priority: RenderPriority) -> &mut RenderQueue {
        self.queues.entry(priority).or_insert_with(|| {
            log::trace!("New render queue for priority {priority}");
            RenderQueue::new(priority)
        })
    }

    /// Queue for `priority` if it exists
    pub fn queue(&self, priority: RenderPriority) -> Option<&RenderQueue> {
        self.queues.get(&priority)
    }

    /// Route a submission and return the leaf it landed in
    ///
    /// # Panics
    ///
    /// If `pass` is not below [`MAX_MATERIAL_PASSES`](super::queue::MAX_MATERIAL_PASSES).
    pub fn submit(
        &mut self,
        priority: RenderPriority,
        pass: usize,
        chain: &StateChain,
        geometry: GeometryRef,
    ) -> GroupKey {
        self.queue_mut(priority).submit(pass, chain, geometry)
    }

    /// Priorities in draw order
    pub fn priorities(&self) -> impl Iterator<Item = RenderPriority> + '_ {
        self.queues.keys().copied()
    }

    /// Draw every tier in ascending priority
    pub fn draw(&self, sink: &mut dyn RenderSink) -> DrawStats {
        let mut stats = DrawStats::default();
        for queue in self.queues.values() {
            stats += queue.draw(sink);
        }
        stats
    }

    /// Drop every tier. The next frame starts from nothing.
    pub fn clear(&mut self) {
        self.queues.clear();
    }

    /// True if nothing was submitted this frame
    pub fn is_empty(&self) -> bool {
        self.queues.values().all(RenderQueue::is_empty)
    }

    /// Current sizes
    pub fn stats(&self) -> QueueStats {
        self.queues.values().fold(
            QueueStats {
                queues: self.queues.len(),
                ..QueueStats::default()
            },
            |mut acc, queue| {
                acc.passes += queue.pass_count();
                acc.groups += queue.group_count();
                acc.batches += queue.batch_count();
                acc.entries += queue.entry_count();
                acc
            },
        )
    }
}
