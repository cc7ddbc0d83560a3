// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Task spawning.
//!
//! A task is an OS thread. It runs its entry function once and terminates
//! when the function returns. Panics are caught and logged so a failing
//! task never takes the spawner down with it.

use std::io;
use std::thread;

use tracing::{debug, error};

use crate::config::{Priority, TaskConfig};
use crate::notify::{self, Slot, TaskHandle};

/// Start a new task running `f`.
///
/// The returned handle refers to the new task's notification slot and is
/// valid before the task starts running. Fails if the OS refuses to
/// create the thread; `f` is dropped without running in that case.
pub fn spawn_task<F>(config: &TaskConfig, f: F) -> io::Result<TaskHandle>
where
    F: FnOnce() + Send + 'static,
{
    let slot = Slot::new();
    let handle = TaskHandle::from_slot(slot.clone());
    let task_id = handle.id();
    let priority = config.priority;

    thread::Builder::new()
        .name(config.name.clone())
        .stack_size(config.stack_size)
        .spawn(move || {
            notify::install_current(slot);
            apply_priority(priority);
            if let Err(payload) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
                error!(task = %task_id, "task panicked: {}", panic_message(payload.as_ref()));
            }
        })?;

    debug!(task = %task_id, name = %config.name, stack_size = config.stack_size, "spawned task");
    Ok(handle)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Map a priority level onto the calling thread's nice value.
///
/// Level `MAX_PRIORITY` keeps the inherited nice value; each level below
/// it adds one. Raising the nice value never needs privileges, so this
/// only fails on exotic setups, where it is logged and ignored.
#[cfg(target_os = "linux")]
fn apply_priority(priority: Priority) {
    let Priority::Level(level) = priority else {
        return;
    };
    let offset = i32::from(crate::config::MAX_PRIORITY - level.min(crate::config::MAX_PRIORITY));
    if offset == 0 {
        return;
    }
    // SAFETY: getpriority/setpriority only read and write scheduler state of
    // the calling thread, identified by its kernel tid.
    unsafe {
        let tid = libc::syscall(libc::SYS_gettid) as libc::id_t;
        let current = libc::getpriority(libc::PRIO_PROCESS, tid);
        if libc::setpriority(libc::PRIO_PROCESS, tid, current + offset) != 0 {
            debug!(
                level,
                error = %io::Error::last_os_error(),
                "could not apply task priority"
            );
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn apply_priority(priority: Priority) {
    if let Priority::Level(level) = priority {
        debug!(level, "task priorities are not supported on this platform");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::notify_take;
    use crate::queue::MessageQueue;
    use crate::timeout::Timeout;
    use std::time::Duration;

    #[test]
    fn spawned_task_runs() {
        let q = MessageQueue::bounded(1);
        let tx = q.clone();
        spawn_task(&TaskConfig::default(), move || tx.send_blocking(42)).unwrap();
        assert_eq!(q.recv(Duration::from_secs(5)), Some(42));
    }

    #[test]
    fn handle_refers_to_spawned_task() {
        let q = MessageQueue::bounded(1);
        let tx = q.clone();
        let handle = spawn_task(&TaskConfig::default(), move || {
            tx.send_blocking(TaskHandle::current().id());
        })
        .unwrap();
        assert_eq!(q.recv(Duration::from_secs(5)), Some(handle.id()));
    }

    #[test]
    fn notify_reaches_spawned_task() {
        let q = MessageQueue::bounded(1);
        let tx = q.clone();
        let handle = spawn_task(&TaskConfig::default(), move || {
            tx.send_blocking(notify_take(true, Duration::from_secs(5)));
        })
        .unwrap();
        handle.notify_give();
        assert_eq!(q.recv(Duration::from_secs(5)), Some(1));
    }

    #[test]
    fn panicking_task_is_contained() {
        spawn_task(&TaskConfig::default().with_name("panics"), || panic!("boom")).unwrap();
        let q = MessageQueue::bounded(1);
        let tx = q.clone();
        spawn_task(&TaskConfig::default(), move || tx.send_blocking(())).unwrap();
        assert!(q.recv(Duration::from_secs(5)).is_some());
    }

    #[test]
    fn prioritized_task_runs() {
        let q = MessageQueue::bounded(1);
        let tx = q.clone();
        let config = TaskConfig::default().with_priority(1);
        spawn_task(&config, move || tx.send_blocking(true)).unwrap();
        assert_eq!(q.recv(Duration::from_secs(5)), Some(true));
        assert_eq!(q.recv(Timeout::ZERO), None);
    }

    #[test]
    fn panic_message_extracts_text() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(5u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
