// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! A front task answers the caller only after a back task has answered a
//! child request linked to the caller's request.

use std::time::Duration;

use handoff::{
    delay, rt::spawn_task, Message, MessageQueue, Request, RequestQueue, TaskConfig, Timeout,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SEND_REQUEST: u32 = 0;
const PROCESS_RESPONSE: u32 = 1;

fn front_step(
    front: &RequestQueue,
    back: &MessageQueue<Request>,
    msg: Message,
) -> handoff::Result<()> {
    let Message { kind, payload: req } = msg;
    match kind.0 {
        SEND_REQUEST => {
            info!("front: sending child request to back");
            let child = Request::queue(front, PROCESS_RESPONSE, 0)?;
            child.set_parent(&req)?;
            back.send_blocking(child);
            info!("front: doing something else while back works");
        }
        PROCESS_RESPONSE => {
            info!(result = ?req.result(), "front: back answered, answering parent");
            req.complete_parent(0)?;
        }
        _ => error!(%kind, "unknown message kind"),
    }
    Ok(())
}

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
    spawn_task(&TaskConfig::from_env().with_name("front"), move || loop {
        let msg = front.recv_blocking();
        if let Err(err) = front_step(&front, &back_inbox, msg) {
            error!(%err, "front step failed");
        }
    })?;

    info!("sending request to front");
    let req = Request::semaphore(0)?;
    front_inbox.send_blocking(Message::new(SEND_REQUEST, req.clone()));

    info!("doing something while waiting for front");
    req.wait(Timeout::FOREVER)?;
    info!(result = ?req.result(), "front answered");
    Ok(())
}
