// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Host runtime capabilities for `handoff`.
//!
//! Thread-backed: a task is an OS thread, and every primitive blocks the
//! calling thread. The completion layer only orchestrates these; it never
//! reaches past them to the OS.
//!
//! Components:
//! - semaphore: binary signal, give and timed take
//! - notify: per-task counting notification slot
//! - queue: bounded FIFO message queue, optional producer guard
//! - event_group: shared flag bits with wait-all / wait-any
//! - spawn: start a task with stack size and priority
//! - timeout: `Timeout` and task delay
//! - config: task stack size, priority and name

pub mod config;
pub mod event_group;
pub mod notify;
pub mod queue;
pub mod semaphore;
pub mod spawn;
pub mod timeout;

pub use config::{Priority, TaskConfig, DEFAULT_STACK_SIZE, MAX_PRIORITY};
pub use event_group::{EventBits, EventGroup, WaitMode};
pub use notify::{notify_take, NotifyLease, TaskHandle, TaskId};
pub use queue::{GuardedQueue, MessageQueue, SendTimeoutError};
pub use semaphore::BinarySemaphore;
pub use spawn::spawn_task;
pub use timeout::{delay, Timeout};
