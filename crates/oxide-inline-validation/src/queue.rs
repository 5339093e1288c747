//! Named serial task queues.
//!
//! A queue runs its tasks one at a time, in enqueue order. A task receives
//! an [`Advance`] handle and the next task starts only once that handle has
//! been used, however long the task's asynchronous work takes. Queues are
//! created on first use and are never removed; a drained queue simply waits
//! for the next task.
//!
//! There is no timeout and no cancellation. A task that drops its
//! [`Advance`] without calling [`Advance::advance`] stalls its queue for
//! good.
//!
//! Tasks are started from a loop, never from inside `advance`: a task that
//! advances before returning (for instance because its work ran inline) has
//! its successor started once it returns, so long queues do not grow the
//! stack.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::trace;

/// Name of the queue shared by every caller that does not pick one.
pub const DEFAULT_QUEUE: &str = "fx";

type Task = Box<dyn FnOnce(Advance) + Send + 'static>;

#[derive(Default)]
struct Lane {
    pending: VecDeque<Task>,
    busy: bool,
    /// A caller is starting tasks of this lane.
    starting: bool,
    /// The task being started advanced before returning.
    advanced: bool,
}

/// A registry of named serial queues.
///
/// Clones share the same queues. [`QueueRegistry::global`] is the
/// process-wide registry; tests can use a fresh [`QueueRegistry::new`].
#[derive(Clone, Default)]
pub struct QueueRegistry {
    lanes: Arc<Mutex<HashMap<String, Lane>>>,
}

impl std::fmt::Debug for QueueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lanes = self.lock();
        f.debug_struct("QueueRegistry")
            .field("queues", &lanes.len())
            .finish_non_exhaustive()
    }
}

impl QueueRegistry {
    /// Creates a registry with no queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<QueueRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Adds a task to the named queue.
    ///
    /// When the queue is idle the task starts right away, on the caller's
    /// stack; otherwise it waits for every earlier task to advance.
    pub fn enqueue<F>(&self, name: &str, task: F)
    where
        F: FnOnce(Advance) + Send + 'static,
    {
        let task: Task = Box::new(task);
        let start = {
            let mut lanes = self.lock();
            let lane = lanes.entry(name.to_string()).or_default();
            if lane.busy {
                lane.pending.push_back(task);
                trace!(queue = name, pending = lane.pending.len(), "task queued");
                None
            } else {
                lane.busy = true;
                lane.starting = true;
                Some(task)
            }
        };

        if let Some(task) = start {
            self.run(name, task);
        }
    }

    /// Adds a task to the [`DEFAULT_QUEUE`].
    pub fn enqueue_default<F>(&self, task: F)
    where
        F: FnOnce(Advance) + Send + 'static,
    {
        self.enqueue(DEFAULT_QUEUE, task);
    }

    /// Returns the number of tasks waiting behind the running one.
    pub fn pending(&self, name: &str) -> usize {
        self.lock().get(name).map_or(0, |lane| lane.pending.len())
    }

    /// Returns whether a task of the named queue is running.
    pub fn is_busy(&self, name: &str) -> bool {
        self.lock().get(name).is_some_and(|lane| lane.busy)
    }

    /// Returns whether the named queue has been created.
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    fn advance(&self, name: &str) {
        let next = {
            let mut lanes = self.lock();
            let Some(lane) = lanes.get_mut(name) else {
                return;
            };
            if lane.starting {
                lane.advanced = true;
                return;
            }
            let next = lane.pending.pop_front();
            match next {
                Some(_) => lane.starting = true,
                None => lane.busy = false,
            }
            next
        };

        if let Some(task) = next {
            self.run(name, task);
        }
    }

    /// Starts `task` and, while each started task has already advanced by
    /// the time it returns, its successors.
    fn run(&self, name: &str, mut task: Task) {
        loop {
            task(Advance::new(self.clone(), name));

            let mut lanes = self.lock();
            let Some(lane) = lanes.get_mut(name) else {
                return;
            };
            if !std::mem::take(&mut lane.advanced) {
                lane.starting = false;
                return;
            }
            match lane.pending.pop_front() {
                Some(next) => task = next,
                None => {
                    lane.busy = false;
                    lane.starting = false;
                    return;
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Lane>> {
        self.lanes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Permission for the next task of a queue to start.
///
/// Handed to each task; the task must call [`Advance::advance`] exactly once
/// when it is completely done, whether it succeeded or not.
#[must_use = "dropping an Advance without calling advance() stalls its queue"]
pub struct Advance {
    queues: QueueRegistry,
    name: String,
}

impl Advance {
    fn new(queues: QueueRegistry, name: &str) -> Self {
        Self {
            queues,
            name: name.to_string(),
        }
    }

    /// Returns the name of the queue this task belongs to.
    pub fn queue_name(&self) -> &str {
        &self.name
    }

    /// Lets the next queued task start.
    pub fn advance(self) {
        self.queues.advance(&self.name);
    }
}

impl std::fmt::Debug for Advance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Advance").field("queue", &self.name).finish()
    }
}
