// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Waits that span more than one request.

use handoff_rt::{notify_take, EventBits, EventGroup, Timeout};

/// Block until every event-group request in `mask` has completed, then
/// clear their bits. Joins N independent completions.
pub fn wait_all(group: &EventGroup, mask: EventBits, timeout: impl Into<Timeout>) -> bool {
    group.wait_all(mask, timeout)
}

/// Block until any event-group request in `mask` has completed, then clear
/// the bits that matched. First-of-N races.
pub fn wait_any(group: &EventGroup, mask: EventBits, timeout: impl Into<Timeout>) -> bool {
    group.wait_any(mask, timeout)
}

/// Wait for a notification on the calling task's own slot, consuming it.
///
/// Unlike `Request::wait`, this does not release the notification lease:
/// another `Request::notify` on this task fails with
/// `Error::NotificationBusy` until the pending request is dropped.
pub fn wait_notification(timeout: impl Into<Timeout>) -> bool {
    notify_take(true, timeout) != 0
}
