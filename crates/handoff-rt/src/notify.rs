// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Per-task notification slots.
//!
//! Every task owns one counting slot. Other tasks increment it with
//! `TaskHandle::notify_give`; the owner consumes it with `notify_take`.
//! A slot is created lazily the first time a task asks for its handle,
//! or up front by `spawn_task`.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::timeout::{self, Timeout};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

#[derive(Debug)]
pub(crate) struct Slot {
    id: TaskId,
    count: Mutex<u32>,
    cvar: Condvar,
    leased: AtomicBool,
}

impl Slot {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            id: TaskId::next(),
            count: Mutex::new(0),
            cvar: Condvar::new(),
            leased: AtomicBool::new(false),
        })
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Arc<Slot>>> = const { RefCell::new(None) };
}

fn current_slot() -> Arc<Slot> {
    CURRENT.with(|cell| cell.borrow_mut().get_or_insert_with(Slot::new).clone())
}

/// Install `slot` as the notification slot of the calling thread.
/// Used by `spawn_task` so the spawner can hold the handle before the
/// task starts running.
pub(crate) fn install_current(slot: Arc<Slot>) {
    CURRENT.with(|cell| *cell.borrow_mut() = Some(slot));
}

/// Cloneable reference to a task's notification slot.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    slot: Arc<Slot>,
}

impl TaskHandle {
    pub(crate) fn from_slot(slot: Arc<Slot>) -> Self {
        Self { slot }
    }

    /// Handle of the calling task.
    pub fn current() -> Self {
        Self {
            slot: current_slot(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.slot.id
    }

    /// True when called from the task this handle refers to.
    pub fn is_current(&self) -> bool {
        CURRENT.with(|cell| {
            cell.borrow()
                .as_ref()
                .is_some_and(|slot| Arc::ptr_eq(slot, &self.slot))
        })
    }

    /// Increment the task's notification value, waking it if it is
    /// blocked in `notify_take`.
    pub fn notify_give(&self) {
        let mut count = self.slot.count.lock();
        *count = count.saturating_add(1);
        self.slot.cvar.notify_one();
    }

    /// Pending notification count, without consuming it.
    pub fn pending(&self) -> u32 {
        *self.slot.count.lock()
    }

    /// Claim the slot for a single outstanding waiter. Returns `None` while
    /// another lease on the same task is alive.
    pub fn try_lease(&self) -> Option<NotifyLease> {
        self.slot
            .leased
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| NotifyLease {
                slot: self.slot.clone(),
            })
    }
}

/// Exclusive claim on a task's notification slot. Released on drop.
#[derive(Debug)]
pub struct NotifyLease {
    slot: Arc<Slot>,
}

impl NotifyLease {
    pub fn task(&self) -> TaskId {
        self.slot.id
    }
}

impl Drop for NotifyLease {
    fn drop(&mut self) {
        self.slot.leased.store(false, Ordering::Release);
    }
}

/// Wait on the calling task's own notification slot.
///
/// Returns the notification value as it was before being decremented
/// (or cleared, when `clear_on_exit` is set). Zero means the timeout
/// elapsed with nothing pending.
pub fn notify_take(clear_on_exit: bool, timeout: impl Into<Timeout>) -> u32 {
    let slot = current_slot();
    let deadline = timeout.into().deadline();
    let mut count = slot.count.lock();
    if !timeout::wait_until(&slot.cvar, &mut count, deadline, |c| *c > 0) {
        return 0;
    }
    let value = *count;
    *count = if clear_on_exit { 0 } else { value - 1 };
    value
}
