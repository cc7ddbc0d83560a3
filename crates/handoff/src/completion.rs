// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Completion variants.
//!
//! Each variant pairs a completion context, created at allocation, with
//! the action the dispatcher runs on it and the wait (if any) a producer
//! uses to observe it. Actions are private: the only way to run one is
//! `Request::complete`.

use std::time::Instant;

use handoff_rt::{
    notify_take, BinarySemaphore, EventBits, EventGroup, NotifyLease, TaskHandle, Timeout,
};
use parking_lot::Mutex;
use tracing::trace;

use crate::error::{Error, Result};
use crate::message::{Message, MessageKind, QueueSink};
use crate::request::{alloc_payload, Request};

/// Action run by a custom request when it completes.
pub type CustomAction = Box<dyn FnOnce(&Request) + Send>;

pub(crate) enum Completion {
    Custom(Mutex<Option<CustomAction>>),
    Semaphore(BinarySemaphore),
    Notify(NotifyTarget),
    Queue(QueueTarget),
    EventGroup { group: EventGroup, bits: EventBits },
    NoAwait,
}

pub(crate) struct NotifyTarget {
    task: TaskHandle,
    /// Held until a wait consumes the notification or the request is
    /// dropped.
    lease: Mutex<Option<NotifyLease>>,
}

pub(crate) struct QueueTarget {
    /// Taken on delivery. A delivered message holds the request, so the
    /// request must not keep holding the queue.
    sink: Mutex<Option<QueueSink>>,
    kind: MessageKind,
}

impl Completion {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Completion::Custom(_) => "custom",
            Completion::Semaphore(_) => "semaphore",
            Completion::Notify(_) => "notify",
            Completion::Queue(_) => "queue",
            Completion::EventGroup { .. } => "event-group",
            Completion::NoAwait => "no-await",
        }
    }

    /// Run the variant action. Called once per request, by the dispatcher.
    pub(crate) fn signal(&self, request: &Request) {
        match self {
            Completion::Custom(slot) => {
                let action = slot.lock().take();
                if let Some(action) = action {
                    action(request);
                }
            }
            Completion::Semaphore(sem) => sem.give(),
            Completion::Notify(target) => target.task.notify_give(),
            Completion::Queue(target) => {
                let sink = target.sink.lock().take();
                if let Some(sink) = sink {
                    trace!(
                        request = %request.id(),
                        kind = %target.kind,
                        guarded = sink.is_guarded(),
                        "delivering completion message"
                    );
                    sink.push(Message::new(target.kind, request.clone()));
                }
            }
            Completion::EventGroup { group, bits } => {
                group.set_bits(*bits);
            }
            Completion::NoAwait => request.release_payload(),
        }
    }

    /// Variant-specific wait. `Ok(false)` means the timeout elapsed and
    /// the request is still pending.
    pub(crate) fn wait(&self, request: &Request, timeout: Timeout) -> Result<bool> {
        let id = request.id();
        match self {
            Completion::Semaphore(sem) => Ok(sem.take(timeout)),
            Completion::Notify(target) => {
                if !target.task.is_current() {
                    return Err(Error::WrongTask {
                        id,
                        owner: target.task.id(),
                    });
                }
                // The slot may still hold a notification meant for an
                // earlier request; only a completed request ends the wait.
                let deadline = timeout.deadline();
                loop {
                    let remaining = match deadline {
                        Some(at) => Timeout::after(at.saturating_duration_since(Instant::now())),
                        None => Timeout::FOREVER,
                    };
                    if notify_take(true, remaining) == 0 {
                        return Ok(false);
                    }
                    if request.is_completed() {
                        target.lease.lock().take();
                        return Ok(true);
                    }
                    trace!(request = %id, task = %target.task.id(), "discarded stale notification");
                }
            }
            Completion::EventGroup { group, bits } => Ok(group.wait_all(*bits, timeout)),
            Completion::Custom(_) | Completion::Queue(_) | Completion::NoAwait => {
                Err(Error::NotAwaitable {
                    id,
                    variant: self.name(),
                })
            }
        }
    }
}

impl Request {
    /// Request whose completion runs `action` on the completer's task.
    pub fn custom<F>(action: F, payload_len: usize) -> Result<Self>
    where
        F: FnOnce(&Request) + Send + 'static,
    {
        let payload = alloc_payload(payload_len)?;
        let action: CustomAction = Box::new(action);
        Ok(Self::from_parts(
            Completion::Custom(Mutex::new(Some(action))),
            payload,
        ))
    }

    /// Request observed by waiting on a private binary semaphore.
    ///
    /// Any task may wait; only one waiter is woken per completion.
    pub fn semaphore(payload_len: usize) -> Result<Self> {
        let payload = alloc_payload(payload_len)?;
        Ok(Self::from_parts(
            Completion::Semaphore(BinarySemaphore::new()),
            payload,
        ))
    }

    /// Request observed through the allocating task's notification slot.
    ///
    /// Only the allocating task may wait on it, and a task can have at most
    /// one such request outstanding: a second allocation fails with
    /// `Error::NotificationBusy` until the first has been waited on
    /// successfully or dropped. A notification left in the slot by an
    /// earlier request is discarded by the wait, never reported as this
    /// request's completion.
    pub fn notify(payload_len: usize) -> Result<Self> {
        let payload = alloc_payload(payload_len)?;
        let task = TaskHandle::current();
        let lease = task
            .try_lease()
            .ok_or(Error::NotificationBusy { task: task.id() })?;
        Ok(Self::from_parts(
            Completion::Notify(NotifyTarget {
                task,
                lease: Mutex::new(Some(lease)),
            }),
            payload,
        ))
    }

    /// Request delivered as `Message { kind, payload: request }` into
    /// `sink` when completed.
    ///
    /// The completer blocks while the queue is full. The receiving task
    /// owns the request after delivery and drops it when done.
    pub fn queue(
        sink: impl Into<QueueSink>,
        kind: impl Into<MessageKind>,
        payload_len: usize,
    ) -> Result<Self> {
        let payload = alloc_payload(payload_len)?;
        Ok(Self::from_parts(
            Completion::Queue(QueueTarget {
                sink: Mutex::new(Some(sink.into())),
                kind: kind.into(),
            }),
            payload,
        ))
    }

    /// Request that sets `bits` in a shared event group when completed.
    ///
    /// Requests outstanding at the same time on one group should use
    /// disjoint bits.
    pub fn event_group(group: &EventGroup, bits: EventBits, payload_len: usize) -> Result<Self> {
        if bits == 0 {
            return Err(Error::EmptyEventBits);
        }
        let payload = alloc_payload(payload_len)?;
        Ok(Self::from_parts(
            Completion::EventGroup {
                group: group.clone(),
                bits,
            },
            payload,
        ))
    }

    /// Fire-and-forget request. Completion releases the payload, and the
    /// record goes away with the last handle.
    pub fn no_await(payload_len: usize) -> Result<Self> {
        let payload = alloc_payload(payload_len)?;
        Ok(Self::from_parts(Completion::NoAwait, payload))
    }

    /// Wait for completion using the request's own variant.
    ///
    /// Returns `Ok(true)` once completed, `Ok(false)` on timeout (the
    /// request stays pending). Queue, no-await and custom requests have no
    /// wait and return `Error::NotAwaitable`.
    pub fn wait(&self, timeout: impl Into<Timeout>) -> Result<bool> {
        self.record.completion.wait(self, timeout.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::RequestQueue;
    use handoff_rt::{GuardedQueue, MessageQueue};
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn semaphore_wait_times_out_while_pending() {
        let req = Request::semaphore(0).unwrap();
        assert!(!req.wait(Timeout::ZERO).unwrap());
        assert!(!req.wait(Duration::from_millis(10)).unwrap());
    }

    #[test]
    fn semaphore_complete_then_wait() {
        let req = Request::semaphore(0).unwrap();
        req.clone().complete(3).unwrap();
        assert!(req.wait(Timeout::ZERO).unwrap());
        assert_eq!(req.result(), Some(3));
    }

    #[test]
    fn notify_busy_while_outstanding() {
        let first = Request::notify(0).unwrap();
        match Request::notify(0) {
            Err(Error::NotificationBusy { task }) => assert_eq!(task, TaskHandle::current().id()),
            other => panic!("expected NotificationBusy, got {:?}", other),
        }
        drop(first);
        assert!(Request::notify(0).is_ok());
    }

    #[test]
    fn notify_wait_releases_lease() {
        let req = Request::notify(0).unwrap();
        req.clone().complete(0).unwrap();
        assert!(req.wait(Timeout::ZERO).unwrap());
        let next = Request::notify(0).unwrap();
        assert!(!next.wait(Timeout::ZERO).unwrap());
    }

    #[test]
    fn stale_notification_is_not_taken_as_completion() {
        let first = Request::notify(0).unwrap();
        assert!(!first.wait(Timeout::ZERO).unwrap());
        let late = first.clone();
        std::thread::spawn(move || late.complete(0).unwrap()).join().unwrap();
        drop(first);

        let second = Request::notify(0).unwrap();
        assert!(!second.wait(Timeout::ZERO).unwrap());
        assert!(!second.wait(Duration::from_millis(10)).unwrap());
        assert_eq!(second.result(), None);

        let r = second.clone();
        std::thread::spawn(move || r.complete(6).unwrap()).join().unwrap();
        assert!(second.wait(Timeout::ZERO).unwrap());
        assert_eq!(second.result(), Some(6));
    }

    #[test]
    fn notify_wait_from_other_task_is_refused() {
        let req = Request::notify(0).unwrap();
        let r = req.clone();
        let outcome = std::thread::spawn(move || r.wait(Timeout::ZERO)).join().unwrap();
        assert!(matches!(outcome, Err(Error::WrongTask { .. })));
    }

    #[test]
    fn event_group_rejects_empty_bits() {
        let group = EventGroup::new();
        assert!(matches!(
            Request::event_group(&group, 0, 0),
            Err(Error::EmptyEventBits)
        ));
    }

    #[test]
    fn event_group_sets_its_bits() {
        let group = EventGroup::new();
        let req = Request::event_group(&group, 0b100, 0).unwrap();
        req.clone().complete(1).unwrap();
        assert_eq!(group.bits(), 0b100);
        assert!(req.wait(Timeout::ZERO).unwrap());
        assert_eq!(group.bits(), 0);
    }

    #[test]
    fn queue_delivers_message_with_request() {
        let queue: RequestQueue = MessageQueue::bounded(2);
        let req = Request::queue(&queue, 7u32, 0).unwrap();
        let id = req.id();
        req.complete(-2).unwrap();
        let msg = queue.try_recv().unwrap();
        assert_eq!(msg.kind, MessageKind(7));
        assert_eq!(msg.payload.id(), id);
        assert_eq!(msg.payload.result(), Some(-2));
    }

    #[test]
    fn delivered_request_does_not_pin_its_queue() {
        let queue: RequestQueue = MessageQueue::bounded(2);
        let req = Request::queue(&queue, 1u32, 1024).unwrap();
        let observer = req.downgrade();
        req.complete(0).unwrap();
        assert_eq!(queue.len(), 1);
        drop(queue);
        assert!(observer.is_released());
    }

    #[test]
    fn delivered_request_does_not_pin_its_guarded_queue() {
        let guarded: Arc<GuardedQueue<Message>> =
            Arc::new(GuardedQueue::new(MessageQueue::bounded(2)));
        let req = Request::queue(&guarded, 1u32, 64).unwrap();
        let observer = req.downgrade();
        req.complete(0).unwrap();
        assert_eq!(guarded.queue().len(), 1);
        drop(guarded);
        assert!(observer.is_released());
    }

    #[test]
    fn queue_and_no_await_are_not_awaitable() {
        let queue: RequestQueue = MessageQueue::bounded(1);
        let q = Request::queue(queue, 0u32, 0).unwrap();
        assert!(matches!(
            q.wait(Timeout::ZERO),
            Err(Error::NotAwaitable { variant: "queue", .. })
        ));
        let n = Request::no_await(0).unwrap();
        assert!(matches!(
            n.wait(Timeout::ZERO),
            Err(Error::NotAwaitable { variant: "no-await", .. })
        ));
    }

    #[test]
    fn custom_action_runs_once_with_result() {
        let seen = Arc::new(AtomicI32::new(i32::MIN));
        let s = seen.clone();
        let req = Request::custom(
            move |r: &Request| {
                s.store(i32::from(r.result().unwrap_or_default()), Ordering::SeqCst);
            },
            0,
        )
        .unwrap();
        req.clone().complete(-5).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), -5);
        assert!(matches!(req.complete(1), Err(Error::AlreadyCompleted { .. })));
        assert_eq!(seen.load(Ordering::SeqCst), -5);
    }

    #[test]
    fn no_await_releases_payload_on_completion() {
        let req = Request::no_await(32).unwrap();
        let probe = req.clone();
        req.complete(0).unwrap();
        probe.with_payload(|p| assert!(p.is_empty()));
        assert_eq!(probe.result(), Some(0));
    }
}
