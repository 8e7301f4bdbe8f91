//! Hierarchy change notifications
//!
//! A watcher registers a [`StageNodePath`]. When a node is attached or
//! detached the stage reports the changed path: the new path for an attach,
//! the old one for a detach. Each watcher is told how the change relates to
//! its own path.
//!
//! ```text
//! watcher /1/2     changed /1/2      -> Target
//! watcher /1/2     changed /1/2/7    -> Descendant
//! watcher /1/2/7   changed /1/2      -> Ancestor
//! watcher /1/3     changed /1/2      -> (nothing)
//! ```
//!
//! Dispatch is synchronous. Callbacks must not touch the stage that is
//! dispatching; queue the work on the idle task manager instead.

use crate::foundation::ids::{ConnectionId, IdGenerator};

use super::path::StageNodePath;

/// Where the change happened relative to the watched path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEvent {
    /// The watched node itself was attached
    TargetAttached,
    /// The watched node itself was detached
    TargetDetached,
    /// A node above the watched one was attached
    AncestorAttached,
    /// A node above the watched one was detached
    AncestorDetached,
    /// A node below the watched one was attached
    DescendantAttached,
    /// A node below the watched one was detached
    DescendantDetached,
}

#[derive(Clone, Copy)]
enum Change {
    Attached,
    Detached,
}

type WatchCallback = Box<dyn FnMut(WatchEvent, &StageNodePath)>;

struct Watcher {
    id: ConnectionId,
    path: StageNodePath,
    callback: WatchCallback,
}

/// Registry of path watchers
#[derive(Default)]
pub struct WatchController {
    ids: IdGenerator,
    watchers: Vec<Watcher>,
}

impl WatchController {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `path`. The callback receives the event and the changed path.
    pub fn watch(
        &mut self,
        path: StageNodePath,
        callback: impl FnMut(WatchEvent, &StageNodePath) + 'static,
    ) -> ConnectionId {
        let id = self.ids.next();
        self.watchers.push(Watcher {
            id,
            path,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a registration. Returns false if it was already removed.
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let before = self.watchers.len();
        self.watchers.retain(|w| w.id != id);
        self.watchers.len() != before
    }

    /// Whether the registration is still live
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.watchers.iter().any(|w| w.id == id)
    }

    /// Report that a node now lives at `new_path`
    pub fn notify_attached(&mut self, new_path: &StageNodePath) -> usize {
        self.dispatch(new_path, Change::Attached)
    }

    /// Report that a node no longer lives at `old_path`
    pub fn notify_detached(&mut self, old_path: &StageNodePath) -> usize {
        self.dispatch(old_path, Change::Detached)
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    /// True if nothing is watched
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    fn dispatch(&mut self, changed: &StageNodePath, change: Change) -> usize {
        let mut notified = 0;
        for watcher in &mut self.watchers {
            if let Some(event) = classify(&watcher.path, changed, change) {
                log::trace!("Watch {} on {}: {event:?}", watcher.id, watcher.path);
                (watcher.callback)(event, changed);
                notified += 1;
            }
        }
        notified
    }
}

impl std::fmt::Debug for WatchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchController")
            .field("watchers", &self.watchers.len())
            .finish()
    }
}

#[derive(Clone, Copy)]
enum Relation {
    Target,
    Descendant,
    Ancestor,
}

fn classify(watched: &StageNodePath, changed: &StageNodePath, change: Change) -> Option<WatchEvent> {
    let relation = if watched == changed {
        Relation::Target
    } else if changed.strictly_starts_with(watched) {
        Relation::Descendant
    } else if watched.strictly_starts_with(changed) {
        Relation::Ancestor
    } else {
        return None;
    };

    Some(match (relation, change) {
        (Relation::Target, Change::Attached) => WatchEvent::TargetAttached,
        (Relation::Target, Change::Detached) => WatchEvent::TargetDetached,
        (Relation::Descendant, Change::Attached) => WatchEvent::DescendantAttached,
        (Relation::Descendant, Change::Detached) => WatchEvent::DescendantDetached,
        (Relation::Ancestor, Change::Attached) => WatchEvent::AncestorAttached,
        (Relation::Ancestor, Change::Detached) => WatchEvent::AncestorDetached,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::ids::NodeId;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn path(ids: &[u64]) -> StageNodePath {
        ids.iter().map(|&id| NodeId::from_raw(id)).collect()
    }

    fn recorder(
        controller: &mut WatchController,
        watched: StageNodePath,
    ) -> (ConnectionId, Rc<RefCell<Vec<WatchEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let id = controller.watch(watched, move |event, _| sink.borrow_mut().push(event));
        (id, events)
    }

    #[test]
    fn test_dispatch_relations() {
        let mut controller = WatchController::new();
        let (_, target) = recorder(&mut controller, path(&[1, 2]));
        let (_, above) = recorder(&mut controller, path(&[1]));
        let (_, below) = recorder(&mut controller, path(&[1, 2, 3]));
        let (_, unrelated) = recorder(&mut controller, path(&[1, 4]));

        assert_eq!(controller.notify_attached(&path(&[1, 2])), 3);
        controller.notify_detached(&path(&[1, 2]));

        assert_eq!(
            *target.borrow(),
            vec![WatchEvent::TargetAttached, WatchEvent::TargetDetached]
        );
        assert_eq!(
            *above.borrow(),
            vec![WatchEvent::DescendantAttached, WatchEvent::DescendantDetached]
        );
        assert_eq!(
            *below.borrow(),
            vec![WatchEvent::AncestorAttached, WatchEvent::AncestorDetached]
        );
        assert!(unrelated.borrow().is_empty());
    }

    #[test]
    fn test_disconnect_removes_exact_registration() {
        let mut controller = WatchController::new();
        let (first, first_events) = recorder(&mut controller, path(&[1]));
        let (_, second_events) = recorder(&mut controller, path(&[1]));

        assert!(controller.disconnect(first));
        assert!(!controller.disconnect(first));
        assert!(!controller.is_connected(first));

        controller.notify_attached(&path(&[1]));
        assert!(first_events.borrow().is_empty());
        assert_eq!(second_events.borrow().len(), 1);
    }
}
