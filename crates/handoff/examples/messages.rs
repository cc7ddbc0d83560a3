// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Requests travel inside typed messages; the worker dispatches on kind.

use std::time::Duration;

use handoff::{delay, rt::spawn_task, Message, MessageKind, Request, RequestQueue, TaskConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerMessage {
    Resize = 0,
    Archive = 1,
}

impl WorkerMessage {
    fn from_kind(kind: MessageKind) -> Option<Self> {
        match kind.0 {
            0 => Some(Self::Resize),
            1 => Some(Self::Archive),
            _ => None,
        }
    }
}

impl From<WorkerMessage> for MessageKind {
    fn from(msg: WorkerMessage) -> Self {
        MessageKind(msg as u32)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let inbox = RequestQueue::bounded(5);
    let worker_inbox = inbox.clone();
    spawn_task(&TaskConfig::from_env().with_name("worker"), move || loop {
        let Message { kind, payload: req } = worker_inbox.recv_blocking();
        match WorkerMessage::from_kind(kind) {
            Some(WorkerMessage::Resize) => info!(request = %req.id(), "resizing, then responding"),
            Some(WorkerMessage::Archive) => {
                info!(request = %req.id(), "archiving, then responding")
            }
            None => {
                error!(%kind, "unknown message kind");
                continue;
            }
        }
        delay(Duration::from_millis(500));
        if let Err(err) = req.complete(0) {
            error!(%err, "completion failed");
        }
    })?;

    info!("sending resize");
    let req1 = Request::semaphore(0)?;
    inbox.send_blocking(Message::new(WorkerMessage::Resize, req1.clone()));

    info!("sending archive");
    let req2 = Request::semaphore(0)?;
    inbox.send_blocking(Message::new(WorkerMessage::Archive, req2.clone()));

    req1.wait(Duration::from_secs(10))?;
    info!(result = ?req1.result(), "resize answered");
    req2.wait(Duration::from_secs(10))?;
    info!(result = ?req2.result(), "archive answered");
    Ok(())
}
