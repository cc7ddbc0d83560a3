// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Event-bit groups.
//!
//! A shared word of flag bits. Setters OR bits in and wake every waiter;
//! waiters block until all (or any) bits of a mask are set and may clear
//! the bits they matched on the way out.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::timeout::{self, Timeout};

pub type EventBits = u32;

/// Which bits of the mask must be set for a wait to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    All,
    Any,
}

struct Shared {
    bits: Mutex<EventBits>,
    cvar: Condvar,
}

#[derive(Clone)]
pub struct EventGroup {
    shared: Arc<Shared>,
}

impl fmt::Debug for EventGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventGroup({:#x})", self.bits())
    }
}

impl Default for EventGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl EventGroup {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                bits: Mutex::new(0),
                cvar: Condvar::new(),
            }),
        }
    }

    /// OR `bits` into the group and wake all waiters. Returns the group's
    /// value after setting.
    pub fn set_bits(&self, bits: EventBits) -> EventBits {
        let mut current = self.shared.bits.lock();
        *current |= bits;
        self.shared.cvar.notify_all();
        *current
    }

    /// Clear `bits`. Returns the value before clearing.
    pub fn clear_bits(&self, bits: EventBits) -> EventBits {
        let mut current = self.shared.bits.lock();
        let before = *current;
        *current &= !bits;
        before
    }

    pub fn bits(&self) -> EventBits {
        *self.shared.bits.lock()
    }

    /// Wait until `mask` is satisfied according to `mode`.
    ///
    /// Returns the group's value at the moment the wait succeeded (before
    /// any clearing), or `None` on timeout. With `clear_on_exit`, the
    /// matched bits (`value & mask`) are cleared before returning. An empty
    /// mask never matches and returns `None` without blocking.
    pub fn wait_bits(
        &self,
        mask: EventBits,
        mode: WaitMode,
        clear_on_exit: bool,
        timeout: impl Into<Timeout>,
    ) -> Option<EventBits> {
        if mask == 0 {
            return None;
        }
        let deadline = timeout.into().deadline();
        let mut current = self.shared.bits.lock();
        let matched = timeout::wait_until(&self.shared.cvar, &mut current, deadline, |bits| {
            match mode {
                WaitMode::All => *bits & mask == mask,
                WaitMode::Any => *bits & mask != 0,
            }
        });
        if !matched {
            return None;
        }
        let value = *current;
        if clear_on_exit {
            *current &= !(value & mask);
        }
        Some(value)
    }

    /// Block until every bit of `mask` is set, then clear them.
    pub fn wait_all(&self, mask: EventBits, timeout: impl Into<Timeout>) -> bool {
        self.wait_bits(mask, WaitMode::All, true, timeout).is_some()
    }

    /// Block until any bit of `mask` is set, then clear the matched bits.
    pub fn wait_any(&self, mask: EventBits, timeout: impl Into<Timeout>) -> bool {
        self.wait_bits(mask, WaitMode::Any, true, timeout).is_some()
    }
}
