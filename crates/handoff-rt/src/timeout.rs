// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Wait timeouts and task delay.
//!
//! Every blocking primitive in this crate takes a `Timeout`. `FOREVER`
//! blocks until the condition holds; `ZERO` checks once and returns.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, MutexGuard};

/// How long a blocking operation may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeout(Option<Duration>);

impl Timeout {
    /// Block until the operation can proceed.
    pub const FOREVER: Timeout = Timeout(None);
    /// Never block.
    pub const ZERO: Timeout = Timeout(Some(Duration::ZERO));

    pub const fn after(duration: Duration) -> Self {
        Timeout(Some(duration))
    }

    pub fn is_forever(&self) -> bool {
        self.0.is_none()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.0
    }

    /// Absolute deadline counted from now. `None` means no deadline,
    /// which also covers durations too large to represent as an `Instant`.
    pub fn deadline(&self) -> Option<Instant> {
        self.0.and_then(|d| Instant::now().checked_add(d))
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Timeout::FOREVER
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Timeout::after(duration)
    }
}

/// Block on `cvar` until `ready` holds or `deadline` passes.
///
/// Returns whether `ready` held when the wait ended. `ready` is always
/// evaluated at least once, so a zero timeout still observes the current
/// state.
pub(crate) fn wait_until<T, F>(
    cvar: &Condvar,
    guard: &mut MutexGuard<'_, T>,
    deadline: Option<Instant>,
    mut ready: F,
) -> bool
where
    F: FnMut(&mut T) -> bool,
{
    loop {
        if ready(&mut **guard) {
            return true;
        }
        match deadline {
            None => cvar.wait(guard),
            Some(deadline) => {
                if Instant::now() >= deadline || cvar.wait_until(guard, deadline).timed_out() {
                    return ready(&mut **guard);
                }
            }
        }
    }
}

/// Suspend the current task for `duration`.
pub fn delay(duration: Duration) {
    std::thread::sleep(duration);
}
