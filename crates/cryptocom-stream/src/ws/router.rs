/*
[INPUT]:  Decoded inbound frames for one connection
[OUTPUT]: Cache mutations, registry resolutions, heartbeat replies, failure propagation
[POS]:    WebSocket layer - frame classification and dispatch
[UPDATE]: When adding channels or changing the resolution keys of a handler
*/

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::channel::{CacheHandler, ChannelKind};
use super::connection::{Connection, truncate_for_log};
use super::errors;
use super::message::{AUTH_METHOD, AUTHENTICATED_HASH, HEARTBEAT_METHOD, heartbeat_reply};
use crate::cache::{StreamState, TradeScope, Update};
use crate::error::StreamError;
use crate::markets::MarketDirectory;
use crate::types::parse::{self, integer_field, string_field};
use crate::types::{OrderBook, Timeframe};

const RAW_LOG_MAX_BYTES: usize = 512;

/// What a frame resolves: registry key and the snapshot handed to its watchers
type Resolutions = Vec<(String, Update)>;

/// Routes frames into the shared caches and wakes watchers.
///
/// One router serves every connection of a client; each connection's reader
/// task calls [`Router::route`] for its frames in receipt order.
#[derive(Debug)]
pub struct Router {
    state: Arc<RwLock<StreamState>>,
    markets: Arc<RwLock<MarketDirectory>>,
}

impl Router {
    pub fn new(state: Arc<RwLock<StreamState>>, markets: Arc<RwLock<MarketDirectory>>) -> Self {
        Self { state, markets }
    }

    pub async fn route(&self, connection: &Arc<Connection>, frame: &Value) {
        if let Some(error) = errors::classify(frame) {
            self.handle_error(connection, error).await;
            return;
        }

        match frame.get("method").and_then(Value::as_str) {
            Some(HEARTBEAT_METHOD) => {
                respond_heartbeat(connection, frame);
                return;
            }
            Some(AUTH_METHOD) => {
                info!(url = %connection.url(), "ws authenticated");
                connection
                    .registry()
                    .resolve(AUTHENTICATED_HASH, Update::Authenticated(frame.clone()))
                    .await;
                return;
            }
            _ => {}
        }

        let Some(result) = frame.get("result").or_else(|| frame.get("info")) else {
            debug!(frame = %truncate_for_log(&frame.to_string(), RAW_LOG_MAX_BYTES), "ws frame without payload");
            return;
        };
        let Some(channel) = result.get("channel").and_then(Value::as_str) else {
            return;
        };
        let Some(kind) = ChannelKind::classify(channel) else {
            debug!(channel, "ws channel unrecognized");
            return;
        };

        let resolutions = self.apply(kind, result).await;
        for (message_hash, update) in resolutions {
            let kind = update.kind();
            if !connection.registry().resolve(&message_hash, update).await {
                debug!(message_hash = %message_hash, update = kind, "ws update without watchers");
            }
        }
    }

    async fn handle_error(&self, connection: &Arc<Connection>, error: StreamError) {
        if error.is_auth_error() {
            warn!(url = %connection.url(), error = %error, "ws authentication rejected");
            connection
                .registry()
                .reject_and_remove(AUTHENTICATED_HASH, error)
                .await;
        } else {
            warn!(url = %connection.url(), error = %error, "ws error frame");
            connection.fail(error).await;
        }
    }

    /// Mutate the matching cache and collect the keys to resolve
    async fn apply(&self, kind: ChannelKind, result: &Value) -> Resolutions {
        let markets = self.markets.read().await;
        let mut state = self.state.write().await;
        let keys = ResolutionKeys::new(kind, result);
        let symbol = string_field(result, "instrument_name").map(|id| markets.symbol_for_id(&id));
        let data = data_entries(result);

        match kind.handler() {
            CacheHandler::OrderBook => {
                let Some(symbol) = symbol else {
                    return Vec::new();
                };
                let Some(entry) = data.first() else {
                    return Vec::new();
                };
                let depth = integer_field(result, "depth").and_then(|d| usize::try_from(d).ok());
                let book = state.apply_order_book(order_book_snapshot(&symbol, entry), depth);
                debug!(symbol = %symbol, bids = book.bids.len(), asks = book.asks.len(), "order book replaced");
                keys.all(Update::OrderBook(book))
            }
            CacheHandler::Trades(scope) => {
                let mut by_symbol: BTreeMap<String, Vec<_>> = BTreeMap::new();
                for entry in data {
                    if let Some(trade) = parse::trade(entry, &markets, symbol.as_deref()) {
                        by_symbol.entry(trade.symbol.clone()).or_default().push(trade);
                    }
                }
                if by_symbol.is_empty() {
                    return Vec::new();
                }

                let mut resolutions = Vec::new();
                for (trade_symbol, trades) in by_symbol {
                    let log = state.append_trades(scope, &trade_symbol, trades);
                    let update = Update::Trades(log);
                    if symbol.as_deref() == Some(trade_symbol.as_str()) {
                        resolutions.extend(keys.specific(update.clone()));
                    } else {
                        // frame without instrument_name: wake each symbol's own key
                        let key = format!("{}.{}", kind.name(), markets.market(&trade_symbol).id);
                        resolutions.push((key, update.clone()));
                    }
                    if scope == TradeScope::Public && symbol.is_some() {
                        resolutions.extend(keys.broad(update));
                    }
                }
                if scope == TradeScope::Account {
                    resolutions.extend(keys.broad(Update::Trades(state.all_trades(scope))));
                }
                resolutions
            }
            CacheHandler::Ticker => {
                let Some(entry) = data.first() else {
                    return Vec::new();
                };
                let fallback = symbol.unwrap_or_default();
                let ticker = state.set_ticker(parse::ticker(entry, &markets, &fallback));
                keys.specific(Update::Ticker(ticker))
            }
            CacheHandler::Candles => {
                let Some(symbol) = symbol else {
                    return Vec::new();
                };
                let Some(timeframe) = string_field(result, "interval")
                    .as_deref()
                    .and_then(Timeframe::from_interval)
                else {
                    debug!(symbol = %symbol, "candle frame with unknown interval");
                    return Vec::new();
                };
                let bars = data.iter().filter_map(parse::candle).collect();
                let series = state.push_candles(&symbol, timeframe, bars);
                keys.all(Update::Candles(series))
            }
            CacheHandler::Orders => {
                let orders: Vec<_> = data
                    .iter()
                    .filter_map(|entry| parse::order(entry, &markets))
                    .collect();
                if orders.is_empty() {
                    return Vec::new();
                }
                let log = state.upsert_orders(orders);
                keys.all(Update::Orders(log))
            }
            CacheHandler::Balance => {
                let entries = data.iter().filter_map(parse::balance_entry).collect();
                let balances = state.apply_balances(entries, result.clone(), None);
                keys.all(Update::Balance(balances))
            }
        }
    }
}

/// Keys a data frame resolves.
///
/// `specific` holds the frame's subscription and the key rebuilt from its
/// fields (they differ for books, whose subscription carries the depth);
/// `broad` is the symbol-agnostic channel name and never appears in `specific`.
struct ResolutionKeys {
    specific: Vec<String>,
    broad: String,
}

impl ResolutionKeys {
    fn new(kind: ChannelKind, result: &Value) -> Self {
        let broad = kind.name().to_string();
        let mut specific = Vec::new();
        if let Some(subscription) = string_field(result, "subscription")
            && subscription != broad
        {
            specific.push(subscription);
        }
        if let Some(instrument) = string_field(result, "instrument_name") {
            let mut key = broad.clone();
            if kind == ChannelKind::Candlestick
                && let Some(interval) = string_field(result, "interval")
            {
                key.push('.');
                key.push_str(&interval);
            }
            key.push('.');
            key.push_str(&instrument);
            if !specific.contains(&key) {
                specific.push(key);
            }
        }
        Self { specific, broad }
    }

    fn specific(&self, update: Update) -> Resolutions {
        self.specific
            .iter()
            .map(|key| (key.clone(), update.clone()))
            .collect()
    }

    fn broad(&self, update: Update) -> Resolutions {
        vec![(self.broad.clone(), update)]
    }

    fn all(&self, update: Update) -> Resolutions {
        let mut resolutions = self.specific(update.clone());
        resolutions.extend(self.broad(update));
        resolutions
    }
}

fn data_entries(result: &Value) -> &[Value] {
    result
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// `{bids, asks, t, s}` where `s` is the sequence number
fn order_book_snapshot(symbol: &str, entry: &Value) -> OrderBook {
    let timestamp = integer_field(entry, "t");
    OrderBook {
        symbol: symbol.to_string(),
        bids: parse::book_levels(entry.get("bids")),
        asks: parse::book_levels(entry.get("asks")),
        nonce: integer_field(entry, "s").and_then(|s| u64::try_from(s).ok()),
        timestamp,
        datetime: parse::datetime(timestamp),
    }
}

/// Reply on a separate task so routing never waits on the socket
fn respond_heartbeat(connection: &Arc<Connection>, frame: &Value) {
    let id = frame.get("id").cloned().unwrap_or(Value::Null);
    let reply = heartbeat_reply(id);
    let connection = Arc::clone(connection);
    tokio::spawn(async move {
        match connection.send(&reply).await {
            Ok(()) => debug!(url = %connection.url(), id = %reply["id"], "ws heartbeat answered"),
            Err(err) => warn!(url = %connection.url(), error = %err, "ws heartbeat reply failed"),
        }
    });
}
