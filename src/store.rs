//! The task store: single owner of the task table and source of live views.
//!
//! Every mutation runs under one lock: the new table is built off to the side,
//! written through the `Storage` backend and only then swapped in and published
//! to every subscriber. A failed write leaves memory, disk and subscribers exactly
//! as they were. Because publication happens while the lock is still held, all
//! subscribers observe mutations in the same order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use crate::db::{Database, MemoryStorage, Storage};
use crate::error::{Error, Result};
use crate::fields::ConflictPolicy;
use crate::task::{Task, UNSET_ID};

/// Immutable view of the whole table, in insertion order.
pub type Snapshot = Arc<[Task]>;

/// Cloneable handle to a task store. All clones share one table.
#[derive(Clone)]
pub struct TaskStore {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<State>,
    listener_ids: AtomicU64,
}

struct State {
    db: Database,
    storage: Box<dyn Storage>,
    policy: ConflictPolicy,
    listeners: Vec<Listener>,
}

struct Listener {
    id: u64,
    feed: Feed,
}

enum Feed {
    All(Sender<Snapshot>),
    One {
        task_id: u64,
        last: Option<Task>,
        tx: Sender<Option<Task>>,
    },
}

impl TaskStore {
    /// Load the table from `storage`. An unreadable table is reported here and
    /// nowhere else.
    pub fn open(mut storage: Box<dyn Storage>, policy: ConflictPolicy) -> Result<Self> {
        let db = storage.load()?;
        info!(
            location = %storage.describe(),
            tasks = db.tasks.len(),
            "opened task store"
        );
        Ok(TaskStore {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    db,
                    storage,
                    policy,
                    listeners: Vec::new(),
                }),
                listener_ids: AtomicU64::new(1),
            }),
        })
    }

    /// A fresh, empty store that never touches disk.
    pub fn in_memory() -> Self {
        let shared = Shared {
            state: Mutex::new(State {
                db: Database::default(),
                storage: Box::new(MemoryStorage::new()),
                policy: ConflictPolicy::default(),
                listeners: Vec::new(),
            }),
            listener_ids: AtomicU64::new(1),
        };
        TaskStore { shared: Arc::new(shared) }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared.lock()
    }

    /// Store a task. An unset id gets a fresh one; a live id is handled by the
    /// conflict policy. Returns the row as stored.
    pub fn insert(&self, task: Task) -> Result<Task> {
        let mut state = self.lock();
        let mut next = state.db.clone();

        let stored = if task.id == UNSET_ID {
            let id = next.allocate_id();
            let task = Task { id, ..task };
            next.tasks.push(task.clone());
            task
        } else if let Some(existing) = next.get_mut(task.id) {
            if state.policy == ConflictPolicy::Abort {
                return Err(Error::Constraint { id: task.id });
            }
            *existing = task.clone();
            task
        } else {
            next.reserve_id(task.id);
            next.tasks.push(task.clone());
            task
        };

        state.commit(next)?;
        debug!(id = stored.id, "inserted task");
        Ok(stored)
    }

    /// Replace the row with `task.id` entirely. Returns false, without writing,
    /// when no such row exists.
    pub fn update(&self, task: Task) -> Result<bool> {
        let mut state = self.lock();
        let mut next = state.db.clone();
        let Some(row) = next.get_mut(task.id) else {
            debug!(id = task.id, "update of missing task ignored");
            return Ok(false);
        };
        *row = task;
        let id = row.id;
        state.commit(next)?;
        debug!(id, "updated task");
        Ok(true)
    }

    /// Remove the row with `task.id`. Absent rows are a no-op.
    pub fn delete(&self, task: &Task) -> Result<bool> {
        self.delete_by_id(task.id)
    }

    pub fn delete_by_id(&self, id: u64) -> Result<bool> {
        let mut state = self.lock();
        let Some(idx) = state.db.position(id) else {
            debug!(id, "delete of missing task ignored");
            return Ok(false);
        };
        let mut next = state.db.clone();
        next.tasks.remove(idx);
        state.commit(next)?;
        debug!(id, "deleted task");
        Ok(true)
    }

    /// Live view of the whole table. The current snapshot is queued immediately,
    /// then one more per successful mutation.
    pub fn get_all(&self) -> Subscription<Snapshot> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut state = self.lock();
        let id = self.shared.next_listener_id();
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(state.snapshot());
        state.listeners.push(Listener { id, feed: Feed::All(tx) });
        Subscription::new(id, rx, &self.shared)
    }

    /// Live view of one row. Emits the current value immediately, then again only
    /// when that row changes. Deletion emits `None`; a later write with the same id
    /// emits `Some` again.
    pub fn get_by_id(&self, task_id: u64) -> Subscription<Option<Task>> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut state = self.lock();
        let id = self.shared.next_listener_id();
        let current = state.db.get(task_id).cloned();
        let _ = tx.send(current.clone());
        state.listeners.push(Listener {
            id,
            feed: Feed::One { task_id, last: current, tx },
        });
        Subscription::new(id, rx, &self.shared)
    }

    /// One-shot copy of the table.
    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    /// One-shot lookup.
    pub fn get(&self, id: u64) -> Option<Task> {
        self.lock().db.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().db.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.lock().policy
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // The table is only swapped after a successful write, so a panic while
        // locked cannot leave it half-applied.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_listener_id(&self) -> u64 {
        self.listener_ids.fetch_add(1, Ordering::Relaxed)
    }

    fn unsubscribe(&self, listener_id: u64) {
        self.lock().listeners.retain(|l| l.id != listener_id);
    }
}

impl State {
    fn snapshot(&self) -> Snapshot {
        self.db.tasks.clone().into()
    }

    /// Persist `next`, adopt it and fan it out.
    fn commit(&mut self, next: Database) -> Result<()> {
        if let Err(e) = self.storage.save(&next) {
            warn!(location = %self.storage.describe(), error = %e, "failed to persist tasks");
            return Err(e);
        }
        self.db = next;
        self.publish();
        Ok(())
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        let db = &self.db;
        self.listeners.retain_mut(|listener| match &mut listener.feed {
            Feed::All(tx) => tx.send(snapshot.clone()).is_ok(),
            Feed::One { task_id, last, tx } => {
                let current = db.get(*task_id).cloned();
                if current == *last {
                    return true;
                }
                *last = current.clone();
                tx.send(current).is_ok()
            }
        });
    }
}

/// Receiving end of a live view. Dropping it unsubscribes; nothing is delivered
/// afterwards.
pub struct Subscription<T> {
    id: u64,
    rx: Receiver<T>,
    store: Weak<Shared>,
}

impl<T> Subscription<T> {
    fn new(id: u64, rx: Receiver<T>, shared: &Arc<Shared>) -> Self {
        Subscription {
            id,
            rx,
            store: Arc::downgrade(shared),
        }
    }

    /// Next queued value, if any.
    pub fn try_next(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Drop everything queued except the newest value.
    pub fn latest(&self) -> Option<T> {
        self.rx.try_iter().last()
    }

    /// Every queued value, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.store.upgrade() {
            shared.unsubscribe(self.id);
        }
    }
}
