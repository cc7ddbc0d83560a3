// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! A front task forwards work to a back task and keeps serving its own
//! inbox; answers come back as messages instead of blocking waits.

use std::time::Duration;

use handoff::{
    delay, rt::spawn_task, Message, MessageQueue, Request, RequestQueue, TaskConfig, WeakRequest,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SEND_REQUEST: u32 = 0;
const PROCESS_RESPONSE: u32 = 1;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let back_inbox: MessageQueue<Request> = MessageQueue::bounded(5);
    let back = back_inbox.clone();
    spawn_task(&TaskConfig::from_env().with_name("back"), move || loop {
        let req = back.recv_blocking();
        info!(request = %req.id(), "back: working, then responding");
        delay(Duration::from_millis(500));
        if let Err(err) = req.complete(0) {
            error!(%err, "completion failed");
        }
    })?;

    let front_inbox = RequestQueue::bounded(5);
    let front = front_inbox.clone();
    let done = MessageQueue::bounded(1);
    let finished = done.clone();
    spawn_task(&TaskConfig::from_env().with_name("front"), move || loop {
        let Message { kind, payload: req } = front.recv_blocking();
        match kind.0 {
            SEND_REQUEST => {
                info!("front: forwarding to back (not blocking on it)");
                match Request::queue(&front, PROCESS_RESPONSE, 0) {
                    Ok(forwarded) => back_inbox.send_blocking(forwarded),
                    Err(err) => error!(%err, "could not allocate forwarded request"),
                }
                if let Err(err) = req.complete(0) {
                    error!(%err, "completion failed");
                }
            }
            PROCESS_RESPONSE => {
                info!(result = ?req.result(), "front: back answered");
                finished.send_blocking(());
            }
            _ => error!(%kind, "unknown message kind"),
        }
    })?;

    info!("sending to front");
    let req = Request::no_await(0)?;
    let weak: WeakRequest = req.downgrade();
    front_inbox.send_blocking(Message::new(SEND_REQUEST, req));

    done.recv(Duration::from_secs(10));
    info!(released = weak.is_released(), "fire-and-forget request");
    Ok(())
}
