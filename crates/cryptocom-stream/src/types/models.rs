/*
[INPUT]:  Parsed stream payload fields
[OUTPUT]: Unified record structs handed out to watchers
[POS]:    Data layer - type definitions for stream payloads
[UPDATE]: When the exchange adds fields worth surfacing
*/

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{MarketKind, OrderStatus, Side, TakerOrMaker, TimeInForce};

/// Instrument metadata used for symbol/id resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Unified symbol, e.g. `BTC/USDT`
    pub symbol: String,
    /// Exchange instrument id, e.g. `BTC_USDT`
    pub id: String,
    pub base: String,
    pub quote: String,
    pub kind: MarketKind,
}

impl Market {
    pub fn spot(base: &str, quote: &str) -> Self {
        Self {
            symbol: format!("{base}/{quote}"),
            id: format!("{base}_{quote}"),
            base: base.to_string(),
            quote: quote.to_string(),
            kind: MarketKind::Spot,
        }
    }

    pub fn is_spot(&self) -> bool {
        self.kind == MarketKind::Spot
    }
}

/// Aggregated price level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub amount: Decimal,
    /// Number of orders at this level, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Full order book snapshot, best price first on both sides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    /// Exchange sequence number
    pub nonce: Option<u64>,
    pub timestamp: Option<i64>,
    pub datetime: Option<DateTime<Utc>>,
}

impl OrderBook {
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: Vec::new(),
            asks: Vec::new(),
            nonce: None,
            timestamp: None,
            datetime: None,
        }
    }

    /// Copy truncated to at most `depth` levels per side
    pub fn limit(&self, depth: Option<usize>) -> OrderBook {
        let mut book = self.clone();
        if let Some(depth) = depth {
            book.bids.truncate(depth);
            book.asks.truncate(depth);
        }
        book
    }

    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub cost: Decimal,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Option<String>,
    pub order_id: Option<String>,
    pub symbol: String,
    pub side: Option<Side>,
    pub price: Decimal,
    pub amount: Decimal,
    pub cost: Decimal,
    pub timestamp: Option<i64>,
    pub datetime: Option<DateTime<Utc>>,
    pub fee: Option<Fee>,
    pub taker_or_maker: Option<TakerOrMaker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub timestamp: Option<i64>,
    pub datetime: Option<DateTime<Utc>>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub last: Option<Decimal>,
    pub change: Option<Decimal>,
    pub base_volume: Option<Decimal>,
}

/// OHLCV bar keyed by its open timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub client_order_id: Option<String>,
    pub symbol: String,
    pub order_type: Option<String>,
    pub side: Option<Side>,
    pub status: Option<OrderStatus>,
    pub time_in_force: Option<TimeInForce>,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub filled: Option<Decimal>,
    pub remaining: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub average: Option<Decimal>,
    pub fee_currency: Option<String>,
    pub timestamp: Option<i64>,
    pub datetime: Option<DateTime<Utc>>,
    pub last_update_timestamp: Option<i64>,
}

/// Per-currency account record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub free: Option<Decimal>,
    pub used: Option<Decimal>,
    pub total: Option<Decimal>,
}

/// Balance table snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    pub accounts: BTreeMap<String, Account>,
    /// Raw `data` array of the latest update
    pub info: serde_json::Value,
    pub timestamp: Option<i64>,
}

impl Balances {
    pub fn get(&self, currency: &str) -> Option<&Account> {
        self.accounts.get(currency)
    }
}

/// Records that carry an exchange timestamp
pub trait Timestamped {
    fn timestamp(&self) -> Option<i64>;
}

/// Records that belong to a single market
pub trait Symbolic {
    fn symbol(&self) -> &str;
}

impl Timestamped for Trade {
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

impl Timestamped for Order {
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

impl Timestamped for Candle {
    fn timestamp(&self) -> Option<i64> {
        Some(self.timestamp)
    }
}

impl Symbolic for Trade {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Symbolic for Order {
    fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// Keep records with `timestamp >= since`, then the newest `limit` of them.
pub fn filter_since_limit<T>(items: Vec<T>, since: Option<i64>, limit: Option<usize>) -> Vec<T>
where
    T: Timestamped,
{
    let mut items: Vec<T> = match since {
        Some(since) => items
            .into_iter()
            .filter(|item| item.timestamp().is_some_and(|ts| ts >= since))
            .collect(),
        None => items,
    };

    if let Some(limit) = limit
        && items.len() > limit
    {
        items.drain(..items.len() - limit);
    }

    items
}

pub fn filter_by_symbol<T>(items: Vec<T>, symbol: Option<&str>) -> Vec<T>
where
    T: Symbolic,
{
    match symbol {
        Some(symbol) => items.into_iter().filter(|item| item.symbol() == symbol).collect(),
        None => items,
    }
}
