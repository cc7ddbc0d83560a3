// SPDX-License-Identifier: (MIT OR Apache-2.0)

use parking_lot::RwLock;
use tracing::{debug, warn};

/// Default upper bound on a request payload.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 1 << 20;

static ACTIVE: RwLock<RequestConfig> = RwLock::new(RequestConfig {
    max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
});

/// Process-wide limits applied by the request constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestConfig {
    pub max_payload_len: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

impl RequestConfig {
    /// Defaults overridden by `HANDOFF_MAX_PAYLOAD`.
    pub fn from_env() -> Self {
        Self::from_var(std::env::var("HANDOFF_MAX_PAYLOAD").ok().as_deref())
    }

    fn from_var(max_payload: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = max_payload {
            match raw.trim().parse() {
                Ok(len) => config.max_payload_len = len,
                Err(_) => warn!(value = raw, "ignoring invalid HANDOFF_MAX_PAYLOAD"),
            }
        }
        config
    }

    /// Make this the configuration used by every constructor from now on.
    pub fn install(self) {
        debug!(max_payload_len = self.max_payload_len, "installing request config");
        *ACTIVE.write() = self;
    }

    /// The configuration currently in effect.
    pub fn current() -> Self {
        *ACTIVE.read()
    }
}
