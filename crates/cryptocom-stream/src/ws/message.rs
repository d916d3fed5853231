/*
[INPUT]:  Channel keys, nonces, caller-supplied params, inbound heartbeat ids
[OUTPUT]: Outbound request frames and shared wire constants
[POS]:    WebSocket layer - request construction
[UPDATE]: When adding request types or changing envelope format
*/

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde_json::{Map, Value, json};

/// Extra request parameters merged over the built request
pub type Params = Map<String, Value>;

pub const SUBSCRIBE_METHOD: &str = "subscribe";
pub const AUTH_METHOD: &str = "public/auth";
pub const HEARTBEAT_METHOD: &str = "public/heartbeat";
pub const HEARTBEAT_REPLY_METHOD: &str = "public/respond-heartbeat";

/// Reserved registry key of the login completion
pub const AUTHENTICATED_HASH: &str = "authenticated";

/// Millisecond nonces, strictly increasing for the lifetime of the source
#[derive(Debug, Default)]
pub struct NonceSource {
    last: AtomicU64,
}

impl NonceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// `{method: "subscribe", params: {channels: [key]}, nonce}` with caller params winning
pub fn subscribe_request(channel_key: &str, nonce: u64, params: Option<&Params>) -> Value {
    let mut request = json!({
        "method": SUBSCRIBE_METHOD,
        "params": {
            "channels": [channel_key],
        },
        "nonce": nonce,
    });
    extend(&mut request, params);
    request
}

pub fn heartbeat_reply(id: Value) -> Value {
    json!({
        "id": id,
        "method": HEARTBEAT_REPLY_METHOD,
    })
}

/// Shallow merge of `params` into an object request
pub(crate) fn extend(request: &mut Value, params: Option<&Params>) {
    if let (Value::Object(target), Some(params)) = (request, params) {
        for (key, value) in params {
            target.insert(key.clone(), value.clone());
        }
    }
}
