// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! A worker task answers requests of two different variants from one queue.

use std::time::Duration;

use handoff::{delay, rt::spawn_task, MessageQueue, Request, TaskConfig, Timeout};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let inbox: MessageQueue<Request> = MessageQueue::bounded(5);
    let worker_inbox = inbox.clone();
    spawn_task(&TaskConfig::from_env().with_name("worker"), move || loop {
        let req = worker_inbox.recv_blocking();
        info!(request = %req.id(), "received request, working then responding");
        delay(Duration::from_millis(500));
        if let Err(err) = req.complete(0) {
            tracing::error!(%err, "completion failed");
        }
    })?;

    info!("sending request 1");
    let req1 = Request::semaphore(0)?;
    inbox.send_blocking(req1.clone());

    info!("sending request 2 (different variant)");
    let req2 = Request::notify(0)?;
    inbox.send_blocking(req2.clone());

    info!("doing something while waiting for request 1");
    req1.wait(Timeout::FOREVER)?;
    info!(result = ?req1.result(), "request 1 answered");

    info!("doing something while waiting for request 2");
    req2.wait(Timeout::FOREVER)?;
    info!(result = ?req2.result(), "request 2 answered");
    Ok(())
}
