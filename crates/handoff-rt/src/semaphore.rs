// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Binary semaphore.
//!
//! One bit of state behind a mutex. `give` sets it, `take` waits for it and
//! clears it. Giving an already-signaled semaphore is a no-op.

use parking_lot::{Condvar, Mutex};

use crate::timeout::{self, Timeout};

#[derive(Debug, Default)]
pub struct BinarySemaphore {
    signaled: Mutex<bool>,
    cvar: Condvar,
}

impl BinarySemaphore {
    /// Create a semaphore in the "not signaled" state.
    pub fn new() -> Self {
        Self {
            signaled: Mutex::new(false),
            cvar: Condvar::new(),
        }
    }

    /// Signal the semaphore. Never blocks.
    pub fn give(&self) {
        let mut signaled = self.signaled.lock();
        *signaled = true;
        self.cvar.notify_one();
    }

    /// Wait until signaled, consuming the signal. Returns `false` if the
    /// timeout elapsed first.
    pub fn take(&self, timeout: impl Into<Timeout>) -> bool {
        let deadline = timeout.into().deadline();
        let mut signaled = self.signaled.lock();
        let taken = timeout::wait_until(&self.cvar, &mut signaled, deadline, |s| *s);
        if taken {
            *signaled = false;
        }
        taken
    }

    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock()
    }
}
