// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Completion dispatcher.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::request::Request;

impl Request {
    /// Complete the request with `result` (`>= 0` success, `< 0` error).
    ///
    /// Stores the result, then runs the variant's action: give the
    /// semaphore, notify the task, deliver the queue message, set the event
    /// bits, run the custom action, or release a no-await payload. This
    /// handle is consumed; other handles observe the result.
    ///
    /// A request completes exactly once. Later calls return
    /// `Error::AlreadyCompleted` and signal nothing.
    pub fn complete(self, result: i8) -> Result<()> {
        if self.record.result.set(result).is_err() {
            warn!(request = %self.id(), result, "completion dispatched twice");
            return Err(Error::AlreadyCompleted { id: self.id() });
        }
        debug!(request = %self.id(), variant = self.variant(), result, "completing request");
        self.record.completion.signal(&self);
        Ok(())
    }
}

/// Free-function form of [`Request::complete`].
pub fn complete(request: Request, result: i8) -> Result<()> {
    request.complete(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_rt::Timeout;

    #[test]
    fn result_is_stored_before_signal() {
        let req = Request::custom(|r: &Request| assert_eq!(r.result(), Some(12)), 0).unwrap();
        complete(req, 12).unwrap();
    }

    #[test]
    fn second_completion_is_refused() {
        let req = Request::semaphore(0).unwrap();
        req.clone().complete(0).unwrap();
        let err = req.clone().complete(-1).unwrap_err();
        assert!(matches!(err, Error::AlreadyCompleted { id } if id == req.id()));
        assert_eq!(req.result(), Some(0));
        assert!(req.wait(Timeout::ZERO).unwrap());
        assert!(!req.wait(Timeout::ZERO).unwrap());
    }

    #[test]
    fn negative_results_round_trip() {
        let req = Request::semaphore(0).unwrap();
        req.clone().complete(i8::MIN).unwrap();
        assert_eq!(req.result(), Some(i8::MIN));
    }
}
