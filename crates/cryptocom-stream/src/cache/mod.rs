/*
[INPUT]:  Parsed records from the message router
[OUTPUT]: Incrementally maintained, bounded, queryable local state
[POS]:    Cache layer - state owned by the client, mutated only by router handlers
[UPDATE]: When adding a channel cache or changing retention rules
*/

pub mod balance;
pub mod book;
pub mod bounded;
pub mod candles;
pub mod orders;

use std::collections::HashMap;

use serde_json::Value;

pub use balance::BalanceTable;
pub use book::OrderBookState;
pub use bounded::BoundedLog;
pub use candles::CandleSeries;
pub use orders::OrderLog;

use crate::config::StreamConfig;
use crate::types::{Account, Balances, Candle, Order, OrderBook, Ticker, Timeframe, Trade};

/// Retention bounds for the bounded caches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub trades: usize,
    pub ohlcv: usize,
    pub orders: usize,
}

impl From<&StreamConfig> for CacheLimits {
    fn from(config: &StreamConfig) -> Self {
        Self {
            trades: config.trades_limit,
            ohlcv: config.ohlcv_limit,
            orders: config.orders_limit,
        }
    }
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

/// Which trade log a trade frame lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeScope {
    Public,
    Account,
}

/// Snapshot of a cache handed to watchers when a registry key resolves
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    OrderBook(OrderBook),
    Trades(Vec<Trade>),
    Ticker(Ticker),
    Candles(Vec<Candle>),
    Orders(Vec<Order>),
    Balance(Balances),
    /// Raw acknowledgement of the login request
    Authenticated(Value),
}

impl Update {
    pub fn kind(&self) -> &'static str {
        match self {
            Update::OrderBook(_) => "order_book",
            Update::Trades(_) => "trades",
            Update::Ticker(_) => "ticker",
            Update::Candles(_) => "candles",
            Update::Orders(_) => "orders",
            Update::Balance(_) => "balance",
            Update::Authenticated(_) => "authenticated",
        }
    }
}

/// All per-client caches
#[derive(Debug)]
pub struct StreamState {
    limits: CacheLimits,
    order_books: HashMap<String, OrderBookState>,
    trades: HashMap<(TradeScope, String), BoundedLog<Trade>>,
    tickers: HashMap<String, Ticker>,
    candles: HashMap<(String, Timeframe), CandleSeries>,
    orders: Option<OrderLog>,
    balance: BalanceTable,
}

impl StreamState {
    pub fn new(limits: CacheLimits) -> Self {
        Self {
            limits,
            order_books: HashMap::new(),
            trades: HashMap::new(),
            tickers: HashMap::new(),
            candles: HashMap::new(),
            orders: None,
            balance: BalanceTable::new(),
        }
    }

    /// Create the symbol's book on first sight (bounded to `depth`), then replace it.
    pub fn apply_order_book(&mut self, snapshot: OrderBook, depth: Option<usize>) -> OrderBook {
        let state = self
            .order_books
            .entry(snapshot.symbol.clone())
            .or_insert_with(|| OrderBookState::new(snapshot.symbol.clone(), depth));
        state.reset(snapshot);
        state.book().clone()
    }

    pub fn append_trades(&mut self, scope: TradeScope, symbol: &str, trades: Vec<Trade>) -> Vec<Trade> {
        let limit = self.limits.trades;
        let log = self
            .trades
            .entry((scope, symbol.to_string()))
            .or_insert_with(|| BoundedLog::new(limit));
        log.extend(trades);
        log.to_vec()
    }

    pub fn set_ticker(&mut self, ticker: Ticker) -> Ticker {
        self.tickers.insert(ticker.symbol.clone(), ticker.clone());
        ticker
    }

    pub fn push_candles(&mut self, symbol: &str, timeframe: Timeframe, bars: Vec<Candle>) -> Vec<Candle> {
        let limit = self.limits.ohlcv;
        let series = self
            .candles
            .entry((symbol.to_string(), timeframe))
            .or_insert_with(|| CandleSeries::new(limit));
        for bar in bars {
            series.push(bar);
        }
        series.to_vec()
    }

    pub fn upsert_orders(&mut self, orders: Vec<Order>) -> Vec<Order> {
        let limit = self.limits.orders;
        let log = self.orders.get_or_insert_with(|| OrderLog::new(limit));
        for order in orders {
            log.upsert(order);
        }
        log.to_vec()
    }

    pub fn apply_balances(&mut self, entries: Vec<(String, Account)>, info: Value, timestamp: Option<i64>) -> Balances {
        self.balance.set_info(info, timestamp);
        for (currency, account) in entries {
            self.balance.apply(currency, account);
        }
        self.balance.snapshot()
    }

    pub fn order_book(&self, symbol: &str) -> Option<OrderBook> {
        self.order_books.get(symbol).map(|state| state.book().clone())
    }

    pub fn trades(&self, scope: TradeScope, symbol: &str) -> Vec<Trade> {
        self.trades
            .get(&(scope, symbol.to_string()))
            .map(BoundedLog::to_vec)
            .unwrap_or_default()
    }

    /// Every trade of a scope, symbol logs concatenated and ordered by timestamp
    pub fn all_trades(&self, scope: TradeScope) -> Vec<Trade> {
        let mut all: Vec<Trade> = self
            .trades
            .iter()
            .filter(|((s, _), _)| *s == scope)
            .flat_map(|(_, log)| log.to_vec())
            .collect();
        all.sort_by_key(|trade| trade.timestamp);
        all
    }

    pub fn ticker(&self, symbol: &str) -> Option<Ticker> {
        self.tickers.get(symbol).cloned()
    }

    pub fn ohlcv(&self, symbol: &str, timeframe: Timeframe) -> Vec<Candle> {
        self.candles
            .get(&(symbol.to_string(), timeframe))
            .map(CandleSeries::to_vec)
            .unwrap_or_default()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.as_ref().map(OrderLog::to_vec).unwrap_or_default()
    }

    pub fn balance(&self) -> Balances {
        self.balance.snapshot()
    }
}

impl Default for StreamState {
    fn default() -> Self {
        Self::new(CacheLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn trade(id: &str, symbol: &str, ts: i64) -> Trade {
        Trade {
            id: Some(id.to_string()),
            order_id: None,
            symbol: symbol.to_string(),
            side: None,
            price: Decimal::ONE,
            amount: Decimal::ONE,
            cost: Decimal::ONE,
            timestamp: Some(ts),
            datetime: None,
            fee: None,
            taker_or_maker: None,
        }
    }

    #[test]
    fn trade_logs_are_bounded_per_symbol_and_scope() {
        let mut state = StreamState::new(CacheLimits {
            trades: 2,
            ohlcv: 10,
            orders: 10,
        });

        state.append_trades(TradeScope::Public, "ETH/USDT", vec![trade("1", "ETH/USDT", 1)]);
        state.append_trades(TradeScope::Public, "ETH/USDT", vec![trade("2", "ETH/USDT", 2)]);
        let log = state.append_trades(TradeScope::Public, "ETH/USDT", vec![trade("3", "ETH/USDT", 3)]);
        state.append_trades(TradeScope::Account, "ETH/USDT", vec![trade("9", "ETH/USDT", 4)]);

        let ids: Vec<_> = log.iter().filter_map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert_eq!(state.trades(TradeScope::Account, "ETH/USDT").len(), 1);
        assert!(state.trades(TradeScope::Public, "BTC/USDT").is_empty());
    }

    #[test]
    fn all_trades_merges_symbols_in_time_order() {
        let mut state = StreamState::default();
        state.append_trades(TradeScope::Account, "B/C", vec![trade("2", "B/C", 20)]);
        state.append_trades(TradeScope::Account, "A/C", vec![trade("1", "A/C", 10)]);

        let ids: Vec<_> = state
            .all_trades(TradeScope::Account)
            .into_iter()
            .filter_map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn update_kind_names() {
        assert_eq!(Update::Trades(Vec::new()).kind(), "trades");
        assert_eq!(Update::Authenticated(Value::Null).kind(), "authenticated");
    }
}
