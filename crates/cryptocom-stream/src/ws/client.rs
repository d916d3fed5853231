/*
[INPUT]:  StreamConfig, a Connector, unified symbols from callers
[OUTPUT]: Typed watch calls, raw Watchers, and read access to the caches
[POS]:    WebSocket layer - client facade owning connections and state
[UPDATE]: When adding watch methods or changing connection lifecycle
*/

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use super::channel::{Channel, Visibility};
use super::connection::Connection;
use super::message::{NonceSource, Params, subscribe_request};
use super::registry::Watcher;
use super::router::Router;
use super::transport::{Connector, TungsteniteConnector};
use crate::auth::Authenticator;
use crate::cache::{CacheLimits, StreamState, TradeScope, Update};
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::markets::MarketDirectory;
use crate::types::{
    Balances, Candle, Market, Order, OrderBook, Ticker, Timeframe, Trade, filter_by_symbol,
    filter_since_limit,
};

/// Streaming client for the exchange's market and user WebSocket endpoints.
///
/// Connections open lazily on the first subscribe to each endpoint and are
/// replaced transparently after they fail.
#[derive(Debug)]
pub struct CryptocomStream {
    config: StreamConfig,
    connector: Arc<dyn Connector>,
    connections: Mutex<HashMap<String, Arc<Connection>>>,
    state: Arc<RwLock<StreamState>>,
    markets: Arc<RwLock<MarketDirectory>>,
    router: Arc<Router>,
    nonces: Arc<NonceSource>,
}

impl CryptocomStream {
    /// Client over real sockets
    pub fn new(config: StreamConfig) -> Result<Self> {
        Self::with_connector(config, Arc::new(TungsteniteConnector::new()))
    }

    /// Client over an injected transport
    pub fn with_connector(config: StreamConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;
        let state = Arc::new(RwLock::new(StreamState::new(CacheLimits::from(&config))));
        let markets = Arc::new(RwLock::new(MarketDirectory::new()));
        let router = Arc::new(Router::new(Arc::clone(&state), Arc::clone(&markets)));
        Ok(Self {
            config,
            connector,
            connections: Mutex::new(HashMap::new()),
            state,
            markets,
            router,
            nonces: Arc::new(NonceSource::new()),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Preload market metadata; unknown symbols fall back to naming conventions
    pub async fn load_markets(&self, markets: impl IntoIterator<Item = Market>) {
        self.markets.write().await.load(markets);
    }

    pub async fn market(&self, symbol: &str) -> Market {
        self.markets.read().await.market(symbol)
    }

    /// Live connection for `url`, opening a new one if none exists or the last one failed
    async fn connection(&self, url: &str) -> Result<Arc<Connection>> {
        let mut connections = self.connections.lock().await;
        if let Some(existing) = connections.get(url)
            && !existing.is_failed().await
        {
            return Ok(Arc::clone(existing));
        }

        let (transport, inbound) = self
            .connector
            .connect(url, self.config.channel_capacity)
            .await?;
        let connection = Connection::new(url, transport);
        connection.spawn_reader(inbound, Arc::clone(&self.router));
        connections.insert(url.to_string(), Arc::clone(&connection));
        info!(url, "ws connection opened");
        Ok(connection)
    }

    /// Log in on the private connection; later calls reuse the same completion.
    pub async fn authenticate(&self) -> Result<Value> {
        self.authenticate_with(None).await
    }

    pub async fn authenticate_with(&self, params: Option<&Params>) -> Result<Value> {
        let authenticator = Authenticator::new(self.config.require_credentials()?, Arc::clone(&self.nonces));
        let connection = self.connection(&self.config.private_url).await?;
        authenticator.authenticate(&connection, params).await
    }

    /// Subscribe to `channel` and return a watcher over its registry entry.
    ///
    /// Concurrent subscribes to one channel share the entry and send a single
    /// request. Private channels wait for the login first.
    pub async fn subscribe(&self, channel: &Channel, params: Option<&Params>) -> Result<Watcher> {
        let connection = match channel.visibility() {
            Visibility::Public => self.connection(&self.config.public_url).await?,
            Visibility::Private => {
                let authenticator =
                    Authenticator::new(self.config.require_credentials()?, Arc::clone(&self.nonces));
                let connection = self.connection(&self.config.private_url).await?;
                authenticator.authenticate(&connection, None).await?;
                connection
            }
        };

        let key = channel.key();
        let request = subscribe_request(&key, self.nonces.next(), params);
        connection.watch(&key, &request).await
    }

    pub async fn watch_order_book(
        &self,
        symbol: &str,
        limit: Option<usize>,
        params: Option<&Params>,
    ) -> Result<OrderBook> {
        let market = self.spot_market(symbol, "watch_order_book").await?;
        let update = self.subscribe(&Channel::book(&market.id), params).await?.next().await?;
        match update {
            Update::OrderBook(book) => Ok(book.limit(limit)),
            _ => Err(unexpected("order_book")),
        }
    }

    pub async fn watch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<usize>,
        params: Option<&Params>,
    ) -> Result<Vec<Trade>> {
        let market = self.spot_market(symbol, "watch_trades").await?;
        let update = self.subscribe(&Channel::trade(&market.id), params).await?.next().await?;
        match update {
            Update::Trades(trades) => Ok(filter_since_limit(trades, since, limit)),
            _ => Err(unexpected("trades")),
        }
    }

    pub async fn watch_ticker(&self, symbol: &str, params: Option<&Params>) -> Result<Ticker> {
        let market = self.spot_market(symbol, "watch_ticker").await?;
        let update = self.subscribe(&Channel::ticker(&market.id), params).await?.next().await?;
        match update {
            Update::Ticker(ticker) => Ok(ticker),
            _ => Err(unexpected("ticker")),
        }
    }

    pub async fn watch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<usize>,
        params: Option<&Params>,
    ) -> Result<Vec<Candle>> {
        let market = self.spot_market(symbol, "watch_ohlcv").await?;
        let channel = Channel::candlestick(timeframe, &market.id);
        let update = self.subscribe(&channel, params).await?.next().await?;
        match update {
            Update::Candles(candles) => Ok(filter_since_limit(candles, since, limit)),
            _ => Err(unexpected("candles")),
        }
    }

    /// Account fills; all symbols when `symbol` is None
    pub async fn watch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
        params: Option<&Params>,
    ) -> Result<Vec<Trade>> {
        let market = self.optional_market(symbol).await;
        let channel = Channel::user_trades(self.config.account_type, market.as_ref().map(|m| m.id.as_str()));
        let update = self.subscribe(&channel, params).await?.next().await?;
        match update {
            Update::Trades(trades) => {
                let trades = filter_by_symbol(trades, market.as_ref().map(|m| m.symbol.as_str()));
                Ok(filter_since_limit(trades, since, limit))
            }
            _ => Err(unexpected("trades")),
        }
    }

    /// Account orders; all symbols when `symbol` is None
    pub async fn watch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
        params: Option<&Params>,
    ) -> Result<Vec<Order>> {
        let market = self.optional_market(symbol).await;
        let channel = Channel::user_orders(self.config.account_type, market.as_ref().map(|m| m.id.as_str()));
        let update = self.subscribe(&channel, params).await?.next().await?;
        match update {
            Update::Orders(orders) => {
                let orders = filter_by_symbol(orders, market.as_ref().map(|m| m.symbol.as_str()));
                Ok(filter_since_limit(orders, since, limit))
            }
            _ => Err(unexpected("orders")),
        }
    }

    pub async fn watch_balance(&self, params: Option<&Params>) -> Result<Balances> {
        let channel = Channel::user_balance(self.config.account_type);
        let update = self.subscribe(&channel, params).await?.next().await?;
        match update {
            Update::Balance(balances) => Ok(balances),
            _ => Err(unexpected("balance")),
        }
    }

    pub async fn order_book(&self, symbol: &str) -> Option<OrderBook> {
        self.state.read().await.order_book(symbol)
    }

    pub async fn trades(&self, symbol: &str) -> Vec<Trade> {
        self.state.read().await.trades(TradeScope::Public, symbol)
    }

    pub async fn my_trades(&self) -> Vec<Trade> {
        self.state.read().await.all_trades(TradeScope::Account)
    }

    pub async fn ticker(&self, symbol: &str) -> Option<Ticker> {
        self.state.read().await.ticker(symbol)
    }

    pub async fn ohlcv(&self, symbol: &str, timeframe: Timeframe) -> Vec<Candle> {
        self.state.read().await.ohlcv(symbol, timeframe)
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.orders()
    }

    pub async fn balance(&self) -> Balances {
        self.state.read().await.balance()
    }

    /// Close every connection; pending watchers fail with `ConnectionClosed`.
    pub async fn close(&self) {
        let connections: Vec<_> = self.connections.lock().await.drain().collect();
        for (url, connection) in connections {
            connection.fail(StreamError::ConnectionClosed).await;
            info!(url = %url, "ws connection closed by client");
        }
    }

    async fn spot_market(&self, symbol: &str, method: &str) -> Result<Market> {
        let market = self.market(symbol).await;
        if !market.is_spot() {
            return Err(StreamError::NotSupported(format!(
                "{method}() supports spot markets only"
            )));
        }
        Ok(market)
    }

    /// User channels accept any market kind
    async fn optional_market(&self, symbol: Option<&str>) -> Option<Market> {
        match symbol {
            Some(symbol) => Some(self.market(symbol).await),
            None => None,
        }
    }
}

fn unexpected(expected: &'static str) -> StreamError {
    StreamError::UnexpectedPayload { expected }
}
