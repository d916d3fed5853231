/*
[INPUT]:  WebSocket URL and queue capacity
[OUTPUT]: A text-frame sender plus a receiver of inbound frames and close events
[POS]:    WebSocket layer - transport seam between the session logic and tungstenite
[UPDATE]: When changing socket handling or adding transport backends
*/

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use crate::error::{Result, StreamError};

/// What the socket reader hands to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One text frame (binary frames are decoded as UTF-8)
    Frame(String),
    /// The socket is gone; carries the reason when one is known
    Closed(Option<String>),
}

/// Outbound half of an open socket
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn send(&self, text: String) -> Result<()>;

    /// Idempotent
    async fn close(&self) -> Result<()>;
}

/// Opens transports; the client holds one and calls it lazily per URL.
#[async_trait]
pub trait Connector: Send + Sync + std::fmt::Debug {
    async fn connect(
        &self,
        url: &str,
        capacity: usize,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>)>;
}

/// tokio-tungstenite backed connector
#[derive(Debug, Default, Clone)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(
        &self,
        url: &str,
        capacity: usize,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>)> {
        let (ws_stream, _response) = connect_async(url).await?;
        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<WsMessage>(capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        info!(url, "ws connected");

        let url_for_task = url.to_string();
        tokio::spawn(async move {
            let reason = loop {
                tokio::select! {
                    outbound = outbound_rx.recv() => {
                        match outbound {
                            Some(message) => {
                                if let Err(err) = write.send(message).await {
                                    break Some(err.to_string());
                                }
                            }
                            None => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break None;
                            }
                        }
                    }
                    incoming = read.next() => {
                        match incoming {
                            Some(Ok(WsMessage::Close(frame))) => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break frame.map(|f| f.reason.as_str().to_string());
                            }
                            Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => {}
                            Some(Ok(message)) => {
                                if let Some(text) = frame_text(message)
                                    && inbound_tx.send(TransportEvent::Frame(text)).await.is_err()
                                {
                                    break None;
                                }
                            }
                            Some(Err(err)) => break Some(err.to_string()),
                            None => break None,
                        }
                    }
                }
            };

            debug!(url = %url_for_task, reason = ?reason, "ws socket loop exited");
            let _ = inbound_tx.send(TransportEvent::Closed(reason)).await;
        });

        let transport = TungsteniteTransport {
            outbound_tx: Mutex::new(Some(outbound_tx)),
        };
        Ok((Arc::new(transport), inbound_rx))
    }
}

fn frame_text(message: WsMessage) -> Option<String> {
    match message {
        WsMessage::Text(text) => Some(text.to_string()),
        WsMessage::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(error = %err, "ws binary frame is not utf-8");
                None
            }
        },
        _ => None,
    }
}

#[derive(Debug)]
struct TungsteniteTransport {
    outbound_tx: Mutex<Option<mpsc::Sender<WsMessage>>>,
}

#[async_trait]
impl Transport for TungsteniteTransport {
    async fn send(&self, text: String) -> Result<()> {
        let sender = {
            let guard = self.outbound_tx.lock().await;
            guard.clone().ok_or(StreamError::ConnectionClosed)?
        };
        sender
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|_| StreamError::ConnectionClosed)
    }

    async fn close(&self) -> Result<()> {
        // dropping the sender makes the socket loop send Close and exit
        self.outbound_tx.lock().await.take();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records outbound frames; tests feed inbound frames through the paired sender.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingTransport {
        sent: Mutex<Vec<String>>,
        closed: std::sync::atomic::AtomicBool,
    }

    impl RecordingTransport {
        pub(crate) async fn sent(&self) -> Vec<serde_json::Value> {
            self.sent
                .lock()
                .await
                .iter()
                .filter_map(|raw| serde_json::from_str(raw).ok())
                .collect()
        }

        pub(crate) fn is_closed(&self) -> bool {
            self.closed.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, text: String) -> Result<()> {
            if self.is_closed() {
                return Err(StreamError::ConnectionClosed);
            }
            self.sent.lock().await.push(text);
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_binary_frames_become_text() {
        assert_eq!(frame_text(WsMessage::Text("{}".into())), Some("{}".to_string()));
        assert_eq!(
            frame_text(WsMessage::Binary(b"[1]".to_vec().into())),
            Some("[1]".to_string())
        );
        assert_eq!(frame_text(WsMessage::Binary(vec![0xff, 0xfe].into())), None);
    }
}
