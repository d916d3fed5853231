/*
[INPUT]:  An open transport and its inbound event queue
[OUTPUT]: A session owning the correlation registry and the reader task
[POS]:    WebSocket layer - one logical connection per URL
[UPDATE]: When changing the subscribe handshake or failure handling
*/

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::registry::{Registry, Watcher};
use super::router::Router;
use super::transport::{Transport, TransportEvent};
use crate::error::{Result, StreamError};

const RAW_LOG_MAX_BYTES: usize = 512;

/// One WebSocket session: transport, pending requests, and nothing else.
///
/// Once failed, a connection stays failed; the client opens a new one on the
/// next subscribe.
#[derive(Debug)]
pub struct Connection {
    url: String,
    transport: Arc<dyn Transport>,
    registry: Registry,
}

impl Connection {
    pub fn new(url: impl Into<String>, transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self {
            url: url.into(),
            transport,
            registry: Registry::new(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn is_failed(&self) -> bool {
        self.registry.is_failed().await
    }

    pub async fn send(&self, frame: &Value) -> Result<()> {
        self.transport.send(frame.to_string()).await
    }

    /// Attach to `message_hash`, sending `request` only when no one else already did.
    ///
    /// A failed send forgets the entry so the next caller retries.
    pub async fn watch(&self, message_hash: &str, request: &Value) -> Result<Watcher> {
        let (watcher, created) = self.registry.attach(message_hash).await?;
        if created {
            if let Err(err) = self.send(request).await {
                warn!(url = %self.url, message_hash, error = %err, "ws subscribe send failed");
                self.registry.reject_and_remove(message_hash, err.clone()).await;
                return Err(err);
            }
            info!(url = %self.url, message_hash, "ws subscription sent");
        } else {
            debug!(url = %self.url, message_hash, "ws subscription reused");
        }
        Ok(watcher)
    }

    /// Reject everything pending and close the socket
    pub async fn fail(&self, error: StreamError) {
        let rejected = self.registry.fail_all(error.clone()).await;
        warn!(url = %self.url, error = %error, rejected, "ws connection failed");
        if let Err(err) = self.transport.close().await {
            debug!(url = %self.url, error = %err, "ws close after failure");
        }
    }

    /// Feed inbound frames to `router` until the transport reports closure.
    ///
    /// However the read loop ends, including a panic while routing, the
    /// connection is failed so no watcher is left pending.
    pub fn spawn_reader(
        self: &Arc<Self>,
        inbound: mpsc::Receiver<TransportEvent>,
        router: Arc<Router>,
    ) -> JoinHandle<()> {
        let connection = Arc::clone(self);
        let reader = tokio::spawn(read_frames(Arc::clone(self), inbound, router));
        tokio::spawn(async move {
            let error = match reader.await {
                Ok(()) => StreamError::ConnectionClosed,
                Err(join_err) => {
                    warn!(url = %connection.url, error = %join_err, "ws reader task aborted");
                    StreamError::Network(format!("reader task aborted: {join_err}"))
                }
            };
            connection.fail(error).await;
        })
    }
}

async fn read_frames(
    connection: Arc<Connection>,
    mut inbound: mpsc::Receiver<TransportEvent>,
    router: Arc<Router>,
) {
    while let Some(event) = inbound.recv().await {
        match event {
            TransportEvent::Frame(text) => match serde_json::from_str::<Value>(&text) {
                Ok(frame) => router.route(&connection, &frame).await,
                Err(err) => {
                    let preview = truncate_for_log(&text, RAW_LOG_MAX_BYTES);
                    warn!(url = %connection.url, error = %err, message = %preview, "ws message parse failed");
                }
            },
            TransportEvent::Closed(reason) => {
                info!(url = %connection.url, reason = ?reason, "ws connection closed");
                break;
            }
        }
    }
}

pub(crate) fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut cut = max_len;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = String::with_capacity(cut + 3);
    out.push_str(&value[..cut]);
    out.push_str("...");
    out
}
