// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Queue messages.
//!
//! A message is a tag plus a payload. Queue-delivery requests complete by
//! sending themselves as the payload of a message; tasks that mix
//! requests with other traffic switch on the tag.

use std::fmt;
use std::sync::Arc;

use handoff_rt::{GuardedQueue, MessageQueue};

use crate::request::Request;

/// Application-defined message discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MessageKind(pub u32);

impl From<u32> for MessageKind {
    fn from(kind: u32) -> Self {
        MessageKind(kind)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct Message<P = Request> {
    pub kind: MessageKind,
    pub payload: P,
}

impl<P> Message<P> {
    pub fn new(kind: impl Into<MessageKind>, payload: P) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// Queue carrying request messages.
pub type RequestQueue = MessageQueue<Message>;

/// Where a queue-delivery request sends its completion message.
#[derive(Debug, Clone)]
pub enum QueueSink {
    /// Push straight into the queue.
    Plain(RequestQueue),
    /// Serialize completers through the queue's guard.
    Guarded(Arc<GuardedQueue<Message>>),
}

impl QueueSink {
    /// Push to the back, blocking while the queue is full.
    pub(crate) fn push(&self, message: Message) {
        match self {
            QueueSink::Plain(queue) => queue.send_blocking(message),
            QueueSink::Guarded(guarded) => guarded.push(message),
        }
    }

    pub(crate) fn is_guarded(&self) -> bool {
        matches!(self, QueueSink::Guarded(_))
    }
}

impl From<RequestQueue> for QueueSink {
    fn from(queue: RequestQueue) -> Self {
        QueueSink::Plain(queue)
    }
}

impl From<&RequestQueue> for QueueSink {
    fn from(queue: &RequestQueue) -> Self {
        QueueSink::Plain(queue.clone())
    }
}

impl From<Arc<GuardedQueue<Message>>> for QueueSink {
    fn from(guarded: Arc<GuardedQueue<Message>>) -> Self {
        QueueSink::Guarded(guarded)
    }
}

impl From<&Arc<GuardedQueue<Message>>> for QueueSink {
    fn from(guarded: &Arc<GuardedQueue<Message>>) -> Self {
        QueueSink::Guarded(guarded.clone())
    }
}
