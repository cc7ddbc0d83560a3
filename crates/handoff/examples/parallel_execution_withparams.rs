// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Pass parameters to an executed function through the request payload.

use handoff::{exec, Request, RequestConfig, TaskConfig, Timeout};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LABEL_LEN: usize = 16;
const PARAMS_LEN: usize = LABEL_LEN + 4;

/// Payload layout: a NUL-padded label followed by a little-endian count.
struct Params {
    label: String,
    count: i32,
}

impl Params {
    fn write(&self, buf: &mut [u8]) {
        let label = self.label.as_bytes();
        let n = label.len().min(LABEL_LEN);
        buf[..n].copy_from_slice(&label[..n]);
        buf[LABEL_LEN..PARAMS_LEN].copy_from_slice(&self.count.to_le_bytes());
    }

    fn read(buf: &[u8]) -> Self {
        let label = &buf[..LABEL_LEN];
        let end = label.iter().position(|&b| b == 0).unwrap_or(LABEL_LEN);
        let mut count = [0u8; 4];
        count.copy_from_slice(&buf[LABEL_LEN..PARAMS_LEN]);
        Self {
            label: String::from_utf8_lossy(&label[..end]).into_owned(),
            count: i32::from_le_bytes(count),
        }
    }
}

fn do_stuff(req: Request) {
    let params = req.with_payload(Params::read);
    info!(label = %params.label, count = params.count, "doing stuff with parameters");
    req.with_payload_mut(|buf| {
        Params {
            count: params.count * 2,
            ..params
        }
        .write(buf)
    });
    if let Err(err) = req.complete(0) {
        tracing::error!(%err, "completion failed");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    RequestConfig::from_env().install();

    let req = Request::semaphore(PARAMS_LEN)?;
    let params = Params {
        label: "stringparam".to_owned(),
        count: 15,
    };
    req.with_payload_mut(|buf| params.write(buf));

    info!(label = %params.label, count = params.count, "executing function in a new task");
    exec(do_stuff, req.clone(), &TaskConfig::from_env())?;

    req.wait(Timeout::FOREVER)?;
    let out = req.with_payload(Params::read);
    info!(
        result = ?req.result(),
        label = %out.label,
        count = out.count,
        "parallel execution complete"
    );
    Ok(())
}
