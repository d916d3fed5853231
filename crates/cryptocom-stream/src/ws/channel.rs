/*
[INPUT]:  Channel type, optional interval, optional instrument id
[OUTPUT]: Deterministic channel keys and the static channel -> cache handler table
[POS]:    WebSocket layer - subscription naming and dispatch classification
[UPDATE]: When the exchange adds channels or renames namespaces
*/

use crate::cache::TradeScope;
use crate::types::{AccountType, Timeframe};

/// Whether a channel requires the signed login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
}

/// Cache update performed for a data frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHandler {
    OrderBook,
    Trades(TradeScope),
    Ticker,
    Candles,
    Orders,
    Balance,
}

/// Every channel namespace the router understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Book,
    Trade,
    Ticker,
    Candlestick,
    UserOrder,
    UserMarginOrder,
    UserTrade,
    UserMarginTrade,
    UserBalance,
    UserMarginBalance,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 10] = [
        ChannelKind::Book,
        ChannelKind::Trade,
        ChannelKind::Ticker,
        ChannelKind::Candlestick,
        ChannelKind::UserOrder,
        ChannelKind::UserMarginOrder,
        ChannelKind::UserTrade,
        ChannelKind::UserMarginTrade,
        ChannelKind::UserBalance,
        ChannelKind::UserMarginBalance,
    ];

    /// Wire name, also the symbol-agnostic registry key
    pub fn name(&self) -> &'static str {
        match self {
            ChannelKind::Book => "book",
            ChannelKind::Trade => "trade",
            ChannelKind::Ticker => "ticker",
            ChannelKind::Candlestick => "candlestick",
            ChannelKind::UserOrder => "user.order",
            ChannelKind::UserMarginOrder => "user.margin.order",
            ChannelKind::UserTrade => "user.trade",
            ChannelKind::UserMarginTrade => "user.margin.trade",
            ChannelKind::UserBalance => "user.balance",
            ChannelKind::UserMarginBalance => "user.margin.balance",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Like [`ChannelKind::from_name`] but also accepts symbol-suffixed
    /// names such as `user.order.ETH_CRO`; the longest namespace wins.
    pub fn classify(channel: &str) -> Option<Self> {
        Self::from_name(channel).or_else(|| {
            Self::ALL
                .into_iter()
                .filter(|kind| {
                    channel
                        .strip_prefix(kind.name())
                        .is_some_and(|rest| rest.starts_with('.'))
                })
                .max_by_key(|kind| kind.name().len())
        })
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            ChannelKind::Book | ChannelKind::Trade | ChannelKind::Ticker | ChannelKind::Candlestick => {
                Visibility::Public
            }
            _ => Visibility::Private,
        }
    }

    /// Normal and margin variants share a handler
    pub fn handler(&self) -> CacheHandler {
        match self {
            ChannelKind::Book => CacheHandler::OrderBook,
            ChannelKind::Trade => CacheHandler::Trades(TradeScope::Public),
            ChannelKind::UserTrade | ChannelKind::UserMarginTrade => {
                CacheHandler::Trades(TradeScope::Account)
            }
            ChannelKind::Ticker => CacheHandler::Ticker,
            ChannelKind::Candlestick => CacheHandler::Candles,
            ChannelKind::UserOrder | ChannelKind::UserMarginOrder => CacheHandler::Orders,
            ChannelKind::UserBalance | ChannelKind::UserMarginBalance => CacheHandler::Balance,
        }
    }
}

/// One logical subscription: `(kind, interval, instrument)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    kind: ChannelKind,
    interval: Option<String>,
    instrument: Option<String>,
}

impl Channel {
    pub fn new(kind: ChannelKind, interval: Option<String>, instrument: Option<String>) -> Self {
        Self {
            kind,
            interval,
            instrument,
        }
    }

    pub fn book(instrument: &str) -> Self {
        Self::new(ChannelKind::Book, None, Some(instrument.to_string()))
    }

    pub fn trade(instrument: &str) -> Self {
        Self::new(ChannelKind::Trade, None, Some(instrument.to_string()))
    }

    pub fn ticker(instrument: &str) -> Self {
        Self::new(ChannelKind::Ticker, None, Some(instrument.to_string()))
    }

    pub fn candlestick(timeframe: Timeframe, instrument: &str) -> Self {
        Self::new(
            ChannelKind::Candlestick,
            Some(timeframe.interval().to_string()),
            Some(instrument.to_string()),
        )
    }

    pub fn user_orders(account: AccountType, instrument: Option<&str>) -> Self {
        let kind = match account {
            AccountType::Spot => ChannelKind::UserOrder,
            AccountType::Margin => ChannelKind::UserMarginOrder,
        };
        Self::new(kind, None, instrument.map(str::to_string))
    }

    pub fn user_trades(account: AccountType, instrument: Option<&str>) -> Self {
        let kind = match account {
            AccountType::Spot => ChannelKind::UserTrade,
            AccountType::Margin => ChannelKind::UserMarginTrade,
        };
        Self::new(kind, None, instrument.map(str::to_string))
    }

    pub fn user_balance(account: AccountType) -> Self {
        let kind = match account {
            AccountType::Spot => ChannelKind::UserBalance,
            AccountType::Margin => ChannelKind::UserMarginBalance,
        };
        Self::new(kind, None, None)
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn instrument(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    pub fn visibility(&self) -> Visibility {
        self.kind.visibility()
    }

    /// Wire subscription token and registry key
    pub fn key(&self) -> String {
        let mut key = self.kind.name().to_string();
        for part in [self.interval.as_deref(), self.instrument.as_deref()]
            .into_iter()
            .flatten()
        {
            key.push('.');
            key.push_str(part);
        }
        key
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_exchange_namespaces() {
        assert_eq!(Channel::book("BTC_USDT").key(), "book.BTC_USDT");
        assert_eq!(Channel::trade("ETH_USDT").key(), "trade.ETH_USDT");
        assert_eq!(
            Channel::candlestick(Timeframe::OneDay, "BTC_USDT").key(),
            "candlestick.1D.BTC_USDT"
        );
        assert_eq!(Channel::user_orders(AccountType::Spot, None).key(), "user.order");
        assert_eq!(
            Channel::user_trades(AccountType::Margin, Some("ETH_CRO")).key(),
            "user.margin.trade.ETH_CRO"
        );
        assert_eq!(Channel::user_balance(AccountType::Spot).key(), "user.balance");
    }

    #[test]
    fn channel_names_map_to_handlers() {
        assert_eq!(
            ChannelKind::from_name("user.margin.trade").map(|k| k.handler()),
            Some(CacheHandler::Trades(TradeScope::Account))
        );
        assert_eq!(
            ChannelKind::from_name("user.margin.balance").map(|k| k.handler()),
            Some(CacheHandler::Balance)
        );
        assert_eq!(ChannelKind::from_name("book").map(|k| k.handler()), Some(CacheHandler::OrderBook));
        assert_eq!(ChannelKind::from_name("user.position"), None);
    }

    #[test]
    fn classify_accepts_suffixed_channel_names() {
        assert_eq!(ChannelKind::classify("user.order.ETH_CRO"), Some(ChannelKind::UserOrder));
        assert_eq!(
            ChannelKind::classify("user.margin.order.ETH_CRO"),
            Some(ChannelKind::UserMarginOrder)
        );
        assert_eq!(ChannelKind::classify("candlestick"), Some(ChannelKind::Candlestick));
        assert_eq!(ChannelKind::classify("bookish"), None);
    }

    #[test]
    fn visibility_by_namespace() {
        assert_eq!(Channel::ticker("BTC_USDT").visibility(), Visibility::Public);
        assert_eq!(Channel::user_balance(AccountType::Margin).visibility(), Visibility::Private);
    }
}
