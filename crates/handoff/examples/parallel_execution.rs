// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Run a function in a task of its own and wait for it.

use handoff::{exec, Request, TaskConfig, Timeout};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn do_stuff(req: Request) {
    info!("doing stuff asynchronously");
    if let Err(err) = req.complete(0) {
        tracing::error!(%err, "completion failed");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let req = Request::semaphore(0)?;
    info!("executing function in a new task");
    exec(do_stuff, req.clone(), &TaskConfig::from_env().with_priority(1))?;

    info!("doing something else while waiting");
    req.wait(Timeout::FOREVER)?;
    info!(result = ?req.result(), "parallel execution complete");
    Ok(())
}
