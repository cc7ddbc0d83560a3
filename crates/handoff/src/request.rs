// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Requests.
//!
//! A `Request` is a cloneable handle over one shared request record. The
//! producer keeps a handle to observe completion and hands another to
//! whoever completes it. Payload and completion context are released
//! together when the last handle goes away, so neither side can free the
//! record out from under the other. A child's parent link counts as a
//! handle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use tracing::trace;

use crate::completion::Completion;
use crate::config::RequestConfig;
use crate::error::{Error, Result};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique request identifier. Later allocations get larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        RequestId(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

pub(crate) struct Record {
    pub(crate) id: RequestId,
    /// Set exactly once, by the dispatcher, right before signaling.
    pub(crate) result: OnceLock<i8>,
    pub(crate) completion: Completion,
    payload: Mutex<Box<[u8]>>,
    payload_len: usize,
    /// Owning link to an older request. Ids only grow, so links cannot
    /// form a loop.
    pub(crate) parent: OnceLock<Arc<Record>>,
}

impl Drop for Record {
    fn drop(&mut self) {
        trace!(request = %self.id, variant = self.completion.name(), "request released");
        // Unlink sole-owned ancestors one at a time instead of recursing.
        let mut next = self.parent.take();
        while let Some(parent) = next {
            next = match Arc::try_unwrap(parent) {
                Ok(mut record) => record.parent.take(),
                Err(_) => None,
            };
        }
    }
}

/// Handle to a request.
///
/// Cloning is cheap and shares the same record. Construct one through a
/// variant constructor (`semaphore`, `notify`, `queue`, `event_group`,
/// `no_await`, `custom`) and finish it with [`Request::complete`].
#[derive(Clone)]
pub struct Request {
    pub(crate) record: Arc<Record>,
}

/// Reserve a zeroed payload of `len` bytes without aborting on failure.
pub(crate) fn alloc_payload(len: usize) -> Result<Box<[u8]>> {
    let limit = RequestConfig::current().max_payload_len;
    if len > limit {
        return Err(Error::PayloadTooLarge { len, limit });
    }
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|source| Error::Alloc { len, source })?;
    buf.resize(len, 0u8);
    Ok(buf.into_boxed_slice())
}

impl Request {
    pub(crate) fn from_parts(completion: Completion, payload: Box<[u8]>) -> Self {
        let record = Arc::new(Record {
            id: RequestId::next(),
            result: OnceLock::new(),
            payload_len: payload.len(),
            payload: Mutex::new(payload),
            completion,
            parent: OnceLock::new(),
        });
        trace!(
            request = %record.id,
            variant = record.completion.name(),
            payload_len = record.payload_len,
            "request allocated"
        );
        Self { record }
    }

    pub fn id(&self) -> RequestId {
        self.record.id
    }

    /// Name of the completion variant, for diagnostics.
    pub fn variant(&self) -> &'static str {
        self.record.completion.name()
    }

    /// Result code, once completion has been dispatched.
    pub fn result(&self) -> Option<i8> {
        self.record.result.get().copied()
    }

    pub fn is_completed(&self) -> bool {
        self.record.result.get().is_some()
    }

    /// Payload size chosen at allocation.
    pub fn payload_len(&self) -> usize {
        self.record.payload_len
    }

    /// Read the payload. The buffer cannot escape the closure.
    pub fn with_payload<R, F: FnOnce(&[u8]) -> R>(&self, f: F) -> R {
        let payload = self.record.payload.lock();
        f(&payload)
    }

    /// Mutate the payload in place. Its length cannot change.
    pub fn with_payload_mut<R, F: FnOnce(&mut [u8]) -> R>(&self, f: F) -> R {
        let mut payload = self.record.payload.lock();
        f(&mut payload)
    }

    /// Drop the payload buffer ahead of the record itself.
    pub(crate) fn release_payload(&self) {
        let released = std::mem::take(&mut *self.record.payload.lock());
        trace!(request = %self.id(), bytes = released.len(), "payload released");
    }

    pub fn downgrade(&self) -> WeakRequest {
        WeakRequest {
            record: Arc::downgrade(&self.record),
        }
    }

    /// True if both handles refer to the same request.
    pub fn ptr_eq(&self, other: &Request) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id())
            .field("variant", &self.variant())
            .field("result", &self.result())
            .field("payload_len", &self.payload_len())
            .finish()
    }
}

/// Non-owning request reference. Does not keep the record alive.
#[derive(Clone)]
pub struct WeakRequest {
    pub(crate) record: Weak<Record>,
}

impl WeakRequest {
    pub fn upgrade(&self) -> Option<Request> {
        self.record.upgrade().map(|record| Request { record })
    }

    /// True once every handle to the request has been dropped.
    pub fn is_released(&self) -> bool {
        self.record.strong_count() == 0
    }
}

impl fmt::Debug for WeakRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(request) => write!(f, "WeakRequest({})", request.id()),
            None => f.write_str("WeakRequest(released)"),
        }
    }
}
