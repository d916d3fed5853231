/*
[INPUT]:  WatchConfig, a shared CryptocomStream, CancellationToken
[OUTPUT]: One tokio task per watch logging every update until shutdown
[POS]:    Execution layer - per-watch orchestration
[UPDATE]: When changing retry or shutdown guarantees
*/

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result, anyhow};
use cryptocom_stream::{CryptocomStream, StreamError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{WatchConfig, WatchKind, WatchSpec};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_DELAY: Duration = Duration::from_secs(1);

struct ManagedWatch {
    task_id: String,
    handle: JoinHandle<Result<()>>,
}

/// Spawns and supervises watch tasks
pub struct WatchRunner {
    client: Arc<CryptocomStream>,
    shutdown: CancellationToken,
    watches: Vec<ManagedWatch>,
}

impl WatchRunner {
    pub fn new(client: Arc<CryptocomStream>) -> Self {
        Self {
            client,
            shutdown: CancellationToken::new(),
            watches: Vec::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancel every watch on Ctrl-C, or SIGTERM on unix
    pub fn cancel_on_signals(&self) {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let signal = tokio::select! {
                res = tokio::signal::ctrl_c() => res.map(|()| "SIGINT"),
                res = terminate() => res.map(|()| "SIGTERM"),
            };
            match signal {
                Ok(name) => info!(signal = name, "shutdown signal received"),
                Err(err) => warn!(error = %err, "signal listener failed, shutting down"),
            }
            shutdown.cancel();
        });
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    pub fn spawn_from_config(&mut self, config: &WatchConfig) -> Result<()> {
        for spec in &config.watches {
            let task_id = spec.task_id();
            let watch = Watch {
                task_id: task_id.clone(),
                spec: spec.clone(),
                client: Arc::clone(&self.client),
                shutdown: self.shutdown.child_token(),
            };
            let handle = tokio::spawn(watch.run());
            self.watches.push(ManagedWatch { task_id, handle });
        }
        Ok(())
    }

    /// Cancel every watch, wait for them within a bounded time, then close the client.
    pub async fn shutdown_and_wait(&mut self) -> Result<()> {
        self.shutdown.cancel();
        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        let mut first_error = None;

        for watch in std::mem::take(&mut self.watches) {
            let ManagedWatch { task_id, mut handle } = watch;
            tokio::select! {
                res = &mut handle => {
                    let outcome = match res {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(err)) => Err(err).with_context(|| format!("watch returned error task_id={task_id}")),
                        Err(join_err) => Err(anyhow!("watch join error task_id={task_id}: {join_err}")),
                    };
                    if let Err(err) = outcome {
                        warn!(task_id = %task_id, error = %err, "watch ended with error");
                        first_error.get_or_insert(err);
                    }
                }
                _ = tokio::time::sleep_until(deadline) => {
                    handle.abort();
                    first_error.get_or_insert(anyhow!("shutdown timed out after {SHUTDOWN_TIMEOUT:?}"));
                }
            }
        }

        self.client.close().await;
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(unix)]
async fn terminate() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn terminate() -> std::io::Result<()> {
    std::future::pending().await
}

struct Watch {
    task_id: String,
    spec: WatchSpec,
    client: Arc<CryptocomStream>,
    shutdown: CancellationToken,
}

impl Watch {
    async fn run(self) -> Result<()> {
        info!(task_id = %self.task_id, kind = ?self.spec.kind, "watch started");
        loop {
            let outcome = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                outcome = self.next_update() => outcome,
            };

            match outcome {
                Ok(summary) => info!(task_id = %self.task_id, "{summary}"),
                Err(err) if retryable(&err) => {
                    warn!(task_id = %self.task_id, error = %err, "watch interrupted, resubscribing");
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("watch failed task_id={}", self.task_id));
                }
            }
        }
        info!(task_id = %self.task_id, "watch stopped");
        Ok(())
    }

    /// Await one update and describe it in a log line
    async fn next_update(&self) -> std::result::Result<String, StreamError> {
        let client = &self.client;
        let symbol = self.spec.symbol.as_deref().unwrap_or_default();
        let limit = self.spec.limit;

        let summary = match self.spec.kind {
            WatchKind::OrderBook => {
                let book = client.watch_order_book(symbol, limit, None).await?;
                format!(
                    "book {} bid {:?} ask {:?} levels {}/{} seq {:?}",
                    book.symbol,
                    book.best_bid().map(|l| l.price),
                    book.best_ask().map(|l| l.price),
                    book.bids.len(),
                    book.asks.len(),
                    book.nonce
                )
            }
            WatchKind::Trades => {
                let trades = client.watch_trades(symbol, None, limit, None).await?;
                describe_trades(symbol, &trades)
            }
            WatchKind::Ticker => {
                let ticker = client.watch_ticker(symbol, None).await?;
                format!(
                    "ticker {} last {:?} bid {:?} ask {:?}",
                    ticker.symbol, ticker.last, ticker.bid, ticker.ask
                )
            }
            WatchKind::Ohlcv => {
                let timeframe = self
                    .spec
                    .timeframe()
                    .map_err(|err| StreamError::Config(err.to_string()))?;
                let candles = client.watch_ohlcv(symbol, timeframe, None, limit, None).await?;
                match candles.last() {
                    Some(bar) => format!(
                        "ohlcv {symbol} {timeframe} bars {} last t={} o={} h={} l={} c={} v={}",
                        candles.len(),
                        bar.timestamp,
                        bar.open,
                        bar.high,
                        bar.low,
                        bar.close,
                        bar.volume
                    ),
                    None => format!("ohlcv {symbol} {timeframe} empty"),
                }
            }
            WatchKind::MyTrades => {
                let trades = client
                    .watch_my_trades(self.spec.symbol.as_deref(), None, limit, None)
                    .await?;
                describe_trades("account", &trades)
            }
            WatchKind::Orders => {
                let orders = client
                    .watch_orders(self.spec.symbol.as_deref(), None, limit, None)
                    .await?;
                match orders.last() {
                    Some(order) => format!(
                        "orders {} last {} {} {:?} filled {:?}",
                        orders.len(),
                        order.symbol,
                        order.id,
                        order.status,
                        order.filled
                    ),
                    None => "orders empty".to_string(),
                }
            }
            WatchKind::Balance => {
                let balances = client.watch_balance(None).await?;
                let parts: Vec<String> = balances
                    .accounts
                    .iter()
                    .map(|(currency, account)| format!("{currency}={:?}/{:?}", account.free, account.total))
                    .collect();
                format!("balance {}", parts.join(" "))
            }
        };
        Ok(summary)
    }
}

fn describe_trades(scope: &str, trades: &[cryptocom_stream::Trade]) -> String {
    match trades.last() {
        Some(trade) => format!(
            "trades {scope} count {} last {:?} {} @ {}",
            trades.len(),
            trade.side,
            trade.amount,
            trade.price
        ),
        None => format!("trades {scope} empty"),
    }
}

/// Connection-level failures are retried; the client reconnects on the next subscribe.
fn retryable(err: &StreamError) -> bool {
    err.is_retryable()
}
