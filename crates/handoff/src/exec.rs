// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Asynchronous execution.
//!
//! `exec` runs a function on a request in a task of its own. The task ends
//! when the function returns. Completing the request is the function's
//! job; the launcher never does it.

use handoff_rt::{spawn_task, TaskConfig, TaskHandle};
use tracing::{debug, warn};

use crate::error::ExecError;
use crate::request::Request;

/// Run `f(request)` in a new task configured by `config`.
///
/// On success returns the new task's handle. If the task cannot be
/// created, `f` is never called and the request comes back inside the
/// error for the caller to retry or drop.
pub fn exec<F>(f: F, request: Request, config: &TaskConfig) -> Result<TaskHandle, ExecError>
where
    F: FnOnce(Request) + Send + 'static,
{
    let retained = request.clone();
    let id = request.id();
    match spawn_task(config, move || f(request)) {
        Ok(task) => {
            debug!(request = %id, task = %task.id(), "execution task started");
            Ok(task)
        }
        Err(source) => {
            warn!(request = %id, error = %source, "could not start execution task");
            Err(ExecError {
                request: retained,
                source,
            })
        }
    }
}
