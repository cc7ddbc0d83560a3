// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Bounded message queues.
//!
//! FIFO of fixed capacity shared by any number of senders and receivers.
//! Senders block while the queue is full, receivers while it is empty.
//! Handles are cheap to clone and never "close": the queue lives as long
//! as any handle does.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::timeout::{self, Timeout};

/// Returned by `send` when the queue stayed full for the whole timeout.
/// Carries the rejected item back to the caller.
#[derive(Error)]
#[error("message queue full, send timed out")]
pub struct SendTimeoutError<T>(pub T);

impl<T> SendTimeoutError<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for SendTimeoutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SendTimeoutError(..)")
    }
}

struct Shared<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

pub struct MessageQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for MessageQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> fmt::Debug for MessageQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueue")
            .field("len", &self.len())
            .field("capacity", &self.shared.capacity)
            .finish()
    }
}

impl<T> MessageQueue<T> {
    /// Create a queue holding at most `capacity` items. A capacity of zero
    /// is rounded up to one slot.
    pub fn bounded(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                items: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
            }),
        }
    }

    /// Push to the back, waiting up to `timeout` for a free slot.
    pub fn send(&self, item: T, timeout: impl Into<Timeout>) -> Result<(), SendTimeoutError<T>> {
        let deadline = timeout.into().deadline();
        let capacity = self.shared.capacity;
        let mut items = self.shared.items.lock();
        if !timeout::wait_until(&self.shared.not_full, &mut items, deadline, |q| {
            q.len() < capacity
        }) {
            return Err(SendTimeoutError(item));
        }
        items.push_back(item);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Push to the back, blocking for as long as the queue is full.
    pub fn send_blocking(&self, item: T) {
        let capacity = self.shared.capacity;
        let mut items = self.shared.items.lock();
        while items.len() >= capacity {
            self.shared.not_full.wait(&mut items);
        }
        items.push_back(item);
        self.shared.not_empty.notify_one();
    }

    /// Non-blocking send attempt.
    pub fn try_send(&self, item: T) -> Result<(), SendTimeoutError<T>> {
        self.send(item, Timeout::ZERO)
    }

    /// Pop from the front, waiting up to `timeout` for an item.
    pub fn recv(&self, timeout: impl Into<Timeout>) -> Option<T> {
        let deadline = timeout.into().deadline();
        let mut items = self.shared.items.lock();
        if !timeout::wait_until(&self.shared.not_empty, &mut items, deadline, |q| !q.is_empty()) {
            return None;
        }
        let item = items.pop_front();
        self.shared.not_full.notify_one();
        item
    }

    /// Pop from the front, blocking until an item arrives.
    pub fn recv_blocking(&self) -> T {
        let mut items = self.shared.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                self.shared.not_full.notify_one();
                return item;
            }
            self.shared.not_empty.wait(&mut items);
        }
    }

    /// Non-blocking receive attempt.
    pub fn try_recv(&self) -> Option<T> {
        self.recv(Timeout::ZERO)
    }

    pub fn len(&self) -> usize {
        self.shared.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.items.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

/// A queue paired with a guard that serializes producers.
///
/// Every `push` holds the guard for the duration of one send, so
/// concurrent producers enter the queue one at a time. Receivers go
/// through `queue()` and never touch the guard.
pub struct GuardedQueue<T> {
    queue: MessageQueue<T>,
    guard: Mutex<()>,
}

impl<T> fmt::Debug for GuardedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedQueue")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl<T> GuardedQueue<T> {
    pub fn new(queue: MessageQueue<T>) -> Self {
        Self {
            queue,
            guard: Mutex::new(()),
        }
    }

    pub fn queue(&self) -> &MessageQueue<T> {
        &self.queue
    }

    /// Acquire the guard, push to the back (blocking while full), release.
    pub fn push(&self, item: T) {
        let _guard = self.guard.lock();
        self.queue.send_blocking(item);
    }

    /// Run `f` with the guard held. Closure-based so the guard cannot
    /// escape.
    pub fn with_guard<R, F: FnOnce(&MessageQueue<T>) -> R>(&self, f: F) -> R {
        let _guard = self.guard.lock();
        f(&self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn send_recv_fifo() {
        let q = MessageQueue::bounded(4);
        q.send(1, Timeout::ZERO).unwrap();
        q.send(2, Timeout::ZERO).unwrap();
        q.send_blocking(3);
        assert_eq!(q.len(), 3);
        assert_eq!(q.try_recv(), Some(1));
        assert_eq!(q.recv(Timeout::ZERO), Some(2));
        assert_eq!(q.recv_blocking(), 3);
        assert!(q.is_empty());
    }

    #[test]
    fn full_queue_returns_item() {
        let q = MessageQueue::bounded(1);
        q.try_send("a").unwrap();
        let err = q.send("b", Duration::from_millis(10)).unwrap_err();
        assert_eq!(err.into_inner(), "b");
    }

    #[test]
    fn zero_capacity_rounds_up() {
        let q = MessageQueue::<u8>::bounded(0);
        assert_eq!(q.capacity(), 1);
        q.try_send(7).unwrap();
        assert!(q.try_send(8).is_err());
    }

    #[test]
    fn recv_times_out_when_empty() {
        let q = MessageQueue::<i32>::bounded(2);
        assert_eq!(q.recv(Duration::from_millis(10)), None);
    }

    #[test]
    fn blocked_sender_resumes_after_recv() {
        let q = MessageQueue::bounded(1);
        q.send_blocking(1);
        let tx = q.clone();
        let h = std::thread::spawn(move || tx.send_blocking(2));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(q.recv_blocking(), 1);
        h.join().unwrap();
        assert_eq!(q.recv(Duration::from_secs(5)), Some(2));
    }

    #[test]
    fn guarded_push_from_many_producers() {
        let q = Arc::new(GuardedQueue::new(MessageQueue::bounded(2)));
        let mut handles = vec![];
        for p in 0..4 {
            let q = q.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..25 {
                    q.push((p, i));
                }
            }));
        }
        let mut seen = vec![Vec::new(); 4];
        for _ in 0..100 {
            let (p, i) = q.queue().recv(Duration::from_secs(5)).unwrap();
            seen[p].push(i);
        }
        for h in handles {
            h.join().unwrap();
        }
        for per_producer in seen {
            assert_eq!(per_producer, (0..25).collect::<Vec<_>>());
        }
    }

    #[test]
    fn with_guard_exposes_queue() {
        let q = GuardedQueue::new(MessageQueue::bounded(2));
        q.with_guard(|inner| inner.try_send(5)).unwrap();
        assert_eq!(q.queue().try_recv(), Some(5));
    }
}
