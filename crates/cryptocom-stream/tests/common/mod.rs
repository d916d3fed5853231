/*
[INPUT]:  Test scenarios needing a socket without a network
[OUTPUT]: In-memory connector/transport, frame fixtures, wait helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for cryptocom-stream tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cryptocom_stream::{
    Connector, CryptocomStream, Credentials, Result, StreamConfig, StreamError, Transport,
    TransportEvent,
};
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc};

pub const PUBLIC_URL: &str = "wss://mock.test/v2/market";
pub const PRIVATE_URL: &str = "wss://mock.test/v2/user";

const WAIT_STEP: Duration = Duration::from_millis(5);
const WAIT_LIMIT: Duration = Duration::from_secs(2);

/// Outbound frames recorded in send order
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: Mutex<Vec<Value>>,
    closed: AtomicBool,
}

impl MockTransport {
    pub async fn sent(&self) -> Vec<Value> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_with_method(&self, method: &str) -> Vec<Value> {
        self.sent()
            .await
            .into_iter()
            .filter(|frame| frame["method"] == json!(method))
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` frames with `method` went out
    pub async fn wait_for(&self, method: &str, count: usize) -> Vec<Value> {
        let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
        loop {
            let frames = self.sent_with_method(method).await;
            if frames.len() >= count {
                return frames;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {count} {method} frame(s), saw {}",
                frames.len()
            );
            tokio::time::sleep(WAIT_STEP).await;
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, text: String) -> Result<()> {
        if self.is_closed() {
            return Err(StreamError::ConnectionClosed);
        }
        let frame = serde_json::from_str(&text)?;
        self.sent.lock().await.push(frame);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// One opened connection: its transport and the feed into the client
#[derive(Debug, Clone)]
pub struct MockSession {
    pub url: String,
    pub transport: Arc<MockTransport>,
    pub inbound: mpsc::Sender<TransportEvent>,
}

impl MockSession {
    pub async fn push(&self, frame: Value) {
        self.inbound
            .send(TransportEvent::Frame(frame.to_string()))
            .await
            .expect("client reader stopped");
    }

    pub async fn push_raw(&self, raw: &str) {
        self.inbound
            .send(TransportEvent::Frame(raw.to_string()))
            .await
            .expect("client reader stopped");
    }

    pub async fn drop_connection(&self) {
        self.inbound
            .send(TransportEvent::Closed(Some("test".to_string())))
            .await
            .expect("client reader stopped");
    }
}

/// Hands out mock sessions and remembers them per URL
#[derive(Debug, Default)]
pub struct MockConnector {
    sessions: Mutex<Vec<MockSession>>,
}

impl MockConnector {
    pub async fn sessions(&self, url: &str) -> Vec<MockSession> {
        self.sessions
            .lock()
            .await
            .iter()
            .filter(|session| session.url == url)
            .cloned()
            .collect()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Newest session for `url`, waiting for it to be opened
    pub async fn session(&self, url: &str) -> MockSession {
        let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
        loop {
            if let Some(session) = self.sessions(url).await.pop() {
                return session;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for a connection to {url}"
            );
            tokio::time::sleep(WAIT_STEP).await;
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        url: &str,
        capacity: usize,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>)> {
        let (inbound, receiver) = mpsc::channel(capacity);
        let transport = Arc::new(MockTransport::default());
        self.sessions.lock().await.push(MockSession {
            url: url.to_string(),
            transport: Arc::clone(&transport),
            inbound,
        });
        Ok((transport, receiver))
    }
}

pub fn test_config() -> StreamConfig {
    StreamConfig::default()
        .with_urls(PUBLIC_URL, PRIVATE_URL)
        .with_credentials(Credentials::new("test_key", "test_secret"))
}

/// Route client logs to the test writer; `RUST_LOG=cryptocom_stream=debug` shows frame traffic
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn client_with(config: StreamConfig) -> (Arc<CryptocomStream>, Arc<MockConnector>) {
    init_tracing();
    let connector = Arc::new(MockConnector::default());
    let client = CryptocomStream::with_connector(config, connector.clone())
        .expect("test config is valid");
    (Arc::new(client), connector)
}

pub fn client() -> (Arc<CryptocomStream>, Arc<MockConnector>) {
    client_with(test_config())
}

/// Complete the login on the private session
pub async fn accept_login(connector: &MockConnector) -> MockSession {
    let session = connector.session(PRIVATE_URL).await;
    let login = session.transport.wait_for("public/auth", 1).await;
    let id = login[0]["id"].clone();
    session
        .push(json!({"id": id, "method": "public/auth", "code": 0}))
        .await;
    session
}

pub fn book_frame(instrument: &str, bids: Value, asks: Value, t: i64, s: i64) -> Value {
    json!({
        "id": -1,
        "method": "subscribe",
        "code": 0,
        "result": {
            "instrument_name": instrument,
            "subscription": format!("book.{instrument}.150"),
            "channel": "book",
            "depth": 150,
            "data": [{"bids": bids, "asks": asks, "t": t, "s": s}]
        }
    })
}

pub fn trade_frame(instrument: &str, id: &str, price: &str, t: i64) -> Value {
    json!({
        "method": "subscribe",
        "result": {
            "instrument_name": instrument,
            "subscription": format!("trade.{instrument}"),
            "channel": "trade",
            "data": [{"p": price, "q": "0.5", "s": "BUY", "d": id, "t": t, "i": instrument}]
        }
    })
}

pub fn candle_frame(instrument: &str, interval: &str, t: i64, close: &str) -> Value {
    json!({
        "method": "subscribe",
        "result": {
            "instrument_name": instrument,
            "subscription": format!("candlestick.{interval}.{instrument}"),
            "channel": "candlestick",
            "interval": interval,
            "data": [{"t": t, "o": "1", "h": "2", "l": "0.5", "c": close, "v": "10"}]
        }
    })
}

pub fn balance_frame(currency: &str, balance: &str, available: &str) -> Value {
    json!({
        "method": "subscribe",
        "result": {
            "subscription": "user.balance",
            "channel": "user.balance",
            "data": [{
                "currency": currency,
                "balance": balance,
                "available": available,
                "order": "0",
                "stake": "0"
            }]
        }
    })
}

pub fn order_frame(instrument: &str, order_id: &str, status: &str, filled: &str) -> Value {
    json!({
        "method": "subscribe",
        "result": {
            "instrument_name": instrument,
            "subscription": format!("user.order.{instrument}"),
            "channel": "user.order",
            "data": [{
                "status": status,
                "side": "BUY",
                "price": 1,
                "quantity": 2,
                "order_id": order_id,
                "client_oid": "my_order",
                "create_time": 1588758017375i64,
                "update_time": 1588758017411i64,
                "type": "LIMIT",
                "instrument_name": instrument,
                "cumulative_quantity": filled,
                "cumulative_value": 0,
                "avg_price": 0,
                "fee_currency": "CRO",
                "time_in_force": "GOOD_TILL_CANCEL"
            }]
        }
    })
}

/// True when `future` is still pending after a short grace period
pub async fn still_pending<F: std::future::Future>(future: F) -> bool {
    tokio::time::timeout(Duration::from_millis(50), future).await.is_err()
}
