//! Idle task manager
//!
//! Cooperative, single-threaded tasks run once per frame tick.
//!
//! - [`add`](IdleTaskManager::add): called every tick until it returns `false`
//! - [`add_once`](IdleTaskManager::add_once): called on the next tick only
//! - [`add_timeout`](IdleTaskManager::add_timeout): called once after a delay
//!
//! Each tick runs a snapshot of the repeating tasks, then the one-shot tasks
//! that were pending when the tick started. Tasks get the manager itself, so
//! they can schedule more work; anything added during a tick first runs on
//! the next one. A task that panics is logged and dropped without affecting
//! the others.
//!
//! Other threads cannot touch the manager. They queue `Send` work through an
//! [`IdleSender`], which the frame thread drains after the one-shot tasks of
//! each tick.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crossbeam::channel::{self, Receiver, Sender};

use crate::foundation::ids::{ConnectionId, IdGenerator};

type RepeatingTask = Box<dyn FnMut(&mut IdleTaskManager) -> bool>;
type OnceTask = Box<dyn FnOnce(&mut IdleTaskManager)>;
type RemoteTask = Box<dyn FnOnce() + Send>;

/// Per-frame task list
pub struct IdleTaskManager {
    ids: IdGenerator,
    repeating: BTreeMap<ConnectionId, RepeatingTask>,
    once: BTreeMap<ConnectionId, OnceTask>,
    running: BTreeSet<ConnectionId>,
    cancelled: BTreeSet<ConnectionId>,
    elapsed: f32,
    remote_tx: Sender<RemoteTask>,
    remote_rx: Receiver<RemoteTask>,
}

impl Default for IdleTaskManager {
    fn default() -> Self {
        let (remote_tx, remote_rx) = channel::unbounded();
        Self {
            ids: IdGenerator::new(),
            repeating: BTreeMap::new(),
            once: BTreeMap::new(),
            running: BTreeSet::new(),
            cancelled: BTreeSet::new(),
            elapsed: 0.0,
            remote_tx,
            remote_rx,
        }
    }
}

impl IdleTaskManager {
    /// No tasks, clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for queueing work from other threads
    pub fn sender(&self) -> IdleSender {
        IdleSender {
            tx: self.remote_tx.clone(),
        }
    }

    /// Run `task` every tick until it returns `false`
    pub fn add(&mut self, task: impl FnMut(&mut Self) -> bool + 'static) -> ConnectionId {
        let id = self.ids.next();
        self.repeating.insert(id, Box::new(task));
        id
    }

    /// Run `task` on the next tick only
    pub fn add_once(&mut self, task: impl FnOnce(&mut Self) + 'static) -> ConnectionId {
        let id = self.ids.next();
        self.once.insert(id, Box::new(task));
        id
    }

    /// Run `callback` once at least `seconds` of scheduler time from now
    pub fn add_timeout(&mut self, seconds: f32, callback: impl FnOnce() + 'static) -> ConnectionId {
        let deadline = self.elapsed + seconds;
        let mut callback = Some(callback);
        self.add(move |idle| {
            if idle.elapsed() < deadline {
                return true;
            }
            if let Some(callback) = callback.take() {
                callback();
            }
            false
        })
    }

    /// Cancel a task. Returns false if it already fired or was removed.
    ///
    /// During a tick, a repeating task that already ran and asked to continue
    /// can still be cancelled; one that finished cannot.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        if self.repeating.remove(&id).is_some() || self.once.remove(&id).is_some() {
            return true;
        }
        self.running.contains(&id) && self.cancelled.insert(id)
    }

    /// Run one tick without advancing the clock
    pub fn execute(&mut self) -> usize {
        self.execute_with_time(0.0)
    }

    /// Advance the clock by `dt` seconds and run one tick. Returns how many
    /// tasks were called.
    pub fn execute_with_time(&mut self, dt: f32) -> usize {
        self.elapsed += dt;

        let mut repeating = std::mem::take(&mut self.repeating);
        let once = std::mem::take(&mut self.once);
        let remote: Vec<RemoteTask> = self.remote_rx.try_iter().collect();
        self.running = repeating.keys().chain(once.keys()).copied().collect();

        let mut called = 0;
        let mut finished = Vec::new();
        for (&id, task) in &mut repeating {
            if self.cancelled.contains(&id) {
                continue;
            }
            called += 1;
            match guarded(&id, || task(self)) {
                Some(true) => continue,
                Some(false) => log::debug!("Idle task {id} finished, removing"),
                None => {}
            }
            self.running.remove(&id);
            finished.push(id);
        }

        for (id, task) in once {
            if self.cancelled.contains(&id) {
                continue;
            }
            called += 1;
            self.running.remove(&id);
            guarded(&id, || task(self));
        }

        for task in remote {
            called += 1;
            guarded(&"from another thread", task);
        }

        repeating.retain(|id, _| !finished.contains(id) && !self.cancelled.contains(id));
        // Tasks added during this tick have larger ids
        repeating.append(&mut self.repeating);
        self.repeating = repeating;

        self.running.clear();
        self.cancelled.clear();
        called
    }

    /// Scheduler time in seconds
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Whether a task is still pending
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.repeating.contains_key(&id) || self.once.contains_key(&id)
    }

    /// Pending tasks, including work queued by other threads
    pub fn len(&self) -> usize {
        self.repeating.len() + self.once.len() + self.remote_rx.len()
    }

    /// True if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every pending task
    pub fn clear(&mut self) {
        self.repeating.clear();
        self.once.clear();
        self.remote_rx.try_iter().for_each(drop);
    }
}

impl fmt::Debug for IdleTaskManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleTaskManager")
            .field("repeating", &self.repeating.len())
            .field("once", &self.once.len())
            .field("remote", &self.remote_rx.len())
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

/// Thread-safe handle that queues work for the frame thread
#[derive(Debug, Clone)]
pub struct IdleSender {
    tx: Sender<RemoteTask>,
}

impl IdleSender {
    /// Run `task` on the frame thread during the next tick. Returns false if
    /// the manager is gone.
    pub fn add_once(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(task)).is_ok()
    }

    /// Run `task` on the frame thread and block until it has run.
    ///
    /// Returns `None` if the manager is gone, the task was cleared or it
    /// panicked. Must not be called from the thread that ticks the manager:
    /// that thread would wait on itself.
    pub fn run_sync<R: Send + 'static>(&self, task: impl FnOnce() -> R + Send + 'static) -> Option<R> {
        let (done_tx, done_rx) = channel::bounded(1);
        let queued = self.add_once(move || {
            let _ = done_tx.send(task());
        });
        if !queued {
            return None;
        }
        done_rx.recv().ok()
    }
}

fn guarded<R>(task: &dyn fmt::Display, f: impl FnOnce() -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => Some(result),
        Err(payload) => {
            log::error!("Idle task {task} panicked: {}", panic_message(payload.as_ref()));
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
