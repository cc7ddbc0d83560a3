// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Request errors.

use std::collections::TryReserveError;
use std::fmt;
use std::io;

use handoff_rt::TaskId;
use thiserror::Error;

use crate::request::{Request, RequestId};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a request operation was refused.
#[derive(Debug, Error)]
pub enum Error {
    /// The payload buffer could not be reserved.
    #[error("failed to allocate a {len}-byte payload")]
    Alloc {
        len: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("payload of {len} bytes exceeds the configured limit of {limit} bytes")]
    PayloadTooLarge { len: usize, limit: usize },

    #[error("event-group request needs at least one event bit")]
    EmptyEventBits,

    /// Completion was dispatched a second time. Nothing was signaled.
    #[error("request {id} was already completed")]
    AlreadyCompleted { id: RequestId },

    /// Queue and no-await requests are observed by their receiver, not by
    /// waiting on the request.
    #[error("request {id} uses the {variant} variant, which has no wait operation")]
    NotAwaitable { id: RequestId, variant: &'static str },

    /// The task already has a notification request outstanding.
    #[error("{task} already has a notification request outstanding")]
    NotificationBusy { task: TaskId },

    #[error("request {id} can only be awaited by {owner}")]
    WrongTask { id: RequestId, owner: TaskId },

    #[error("request {id} already has a parent")]
    ParentAlreadySet { id: RequestId },

    /// Parents must be allocated before their children.
    #[error("request {parent} was not allocated before {child} and cannot be its parent")]
    ParentNotOlder { parent: RequestId, child: RequestId },

    #[error("request {id} has no parent")]
    NoParent { id: RequestId },
}

/// The execution task could not be started. The request is handed back
/// untouched.
#[derive(Error)]
#[error("failed to start execution task for request {}", .request.id())]
pub struct ExecError {
    pub(crate) request: Request,
    #[source]
    pub(crate) source: io::Error,
}

impl ExecError {
    /// Take the request back, to retry or drop it.
    pub fn into_request(self) -> Request {
        self.request
    }

    pub fn io_error(&self) -> &io::Error {
        &self.source
    }
}

impl fmt::Debug for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecError")
            .field("request", &self.request.id())
            .field("source", &self.source)
            .finish()
    }
}
