// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Completion handles for cooperating tasks.
//!
//! A producer allocates a [`Request`], attaches a payload, and hands the
//! request to whoever does the work: another task over a queue, or a new
//! task started with [`exec`]. The worker calls [`Request::complete`] with a
//! result code, and the request's variant decides how the producer finds
//! out:
//!
//! - semaphore: the producer waits on a private binary semaphore
//! - notify: the allocating task waits on its notification slot
//! - queue: the request is delivered as a [`Message`] to a queue
//! - event group: a bit is set in a shared [`EventGroup`]; join with
//!   [`wait_all`] or race with [`wait_any`]
//! - no-await: nobody waits; completion releases the request
//! - custom: a caller-supplied action runs
//!
//! Requests can be chained: a child points at its parent, and finishing
//! the child completes the parent ([`Request::complete_parent`]).
//!
//! ```no_run
//! use handoff::{exec, Request, TaskConfig};
//! use std::time::Duration;
//!
//! let req = Request::semaphore(0)?;
//! exec(|r| r.complete(0).unwrap(), req.clone(), &TaskConfig::default())
//!     .expect("spawn");
//! assert!(req.wait(Duration::from_secs(1))?);
//! assert_eq!(req.result(), Some(0));
//! # Ok::<(), handoff::Error>(())
//! ```

mod chain;
mod completion;
mod config;
mod dispatch;
mod error;
mod exec;
mod message;
mod request;
mod wait;

pub use chain::Ancestors;
pub use completion::CustomAction;
pub use config::{RequestConfig, DEFAULT_MAX_PAYLOAD_LEN};
pub use dispatch::complete;
pub use error::{Error, ExecError, Result};
pub use exec::exec;
pub use message::{Message, MessageKind, QueueSink, RequestQueue};
pub use request::{Request, RequestId, WeakRequest};
pub use wait::{wait_all, wait_any, wait_notification};

pub use handoff_rt as rt;
pub use handoff_rt::{
    delay, EventBits, EventGroup, GuardedQueue, MessageQueue, Priority, TaskConfig, TaskHandle,
    Timeout,
};
