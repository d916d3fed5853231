/*
[INPUT]:  Exchange enumerations (sides, statuses, intervals, market kinds)
[OUTPUT]: Typed Rust enums with wire-string conversions
[POS]:    Data layer - type definitions for stream payloads
[UPDATE]: When the exchange adds statuses, intervals, or market kinds
*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Closed,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "ACTIVE" => Some(OrderStatus::Open),
            "FILLED" => Some(OrderStatus::Closed),
            "CANCELED" | "CANCELLED" => Some(OrderStatus::Canceled),
            "REJECTED" => Some(OrderStatus::Rejected),
            "EXPIRED" => Some(OrderStatus::Expired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    #[serde(rename = "GTC")]
    Gtc,
    #[serde(rename = "IOC")]
    Ioc,
    #[serde(rename = "FOK")]
    Fok,
    #[serde(rename = "PO")]
    PostOnly,
}

impl TimeInForce {
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "GOOD_TILL_CANCEL" => Some(TimeInForce::Gtc),
            "IMMEDIATE_OR_CANCEL" => Some(TimeInForce::Ioc),
            "FILL_OR_KILL" => Some(TimeInForce::Fok),
            "POST_ONLY" => Some(TimeInForce::PostOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakerOrMaker {
    Taker,
    Maker,
}

/// Kind of instrument a market trades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Spot,
    Margin,
    Swap,
    Future,
}

/// Account namespace used for private channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Spot,
    Margin,
}

/// Candle timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "2w")]
    TwoWeeks,
    #[serde(rename = "1M")]
    OneMonth,
}

impl Timeframe {
    pub const ALL: [Timeframe; 12] = [
        Timeframe::OneMinute,
        Timeframe::FiveMinutes,
        Timeframe::FifteenMinutes,
        Timeframe::ThirtyMinutes,
        Timeframe::OneHour,
        Timeframe::FourHours,
        Timeframe::SixHours,
        Timeframe::TwelveHours,
        Timeframe::OneDay,
        Timeframe::OneWeek,
        Timeframe::TwoWeeks,
        Timeframe::OneMonth,
    ];

    /// Unified name ("1m", "1d", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1m",
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::ThirtyMinutes => "30m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
            Timeframe::SixHours => "6h",
            Timeframe::TwelveHours => "12h",
            Timeframe::OneDay => "1d",
            Timeframe::OneWeek => "1w",
            Timeframe::TwoWeeks => "2w",
            Timeframe::OneMonth => "1M",
        }
    }

    /// Interval string used inside channel keys
    pub fn interval(&self) -> &'static str {
        match self {
            Timeframe::OneDay => "1D",
            Timeframe::OneWeek => "7D",
            Timeframe::TwoWeeks => "14D",
            other => other.as_str(),
        }
    }

    /// Reverse lookup from a server interval string
    pub fn from_interval(interval: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tf| tf.interval() == interval)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tf| tf.as_str() == raw)
            .or_else(|| Self::from_interval(raw))
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_interval_roundtrip() {
        for tf in Timeframe::ALL {
            assert_eq!(Timeframe::from_interval(tf.interval()), Some(tf));
        }
    }

    #[test]
    fn timeframe_day_uses_exchange_interval() {
        assert_eq!(Timeframe::OneDay.interval(), "1D");
        assert_eq!(Timeframe::OneWeek.interval(), "7D");
        assert_eq!(Timeframe::parse("1d"), Some(Timeframe::OneDay));
        assert_eq!(Timeframe::parse("14D"), Some(Timeframe::TwoWeeks));
        assert_eq!(Timeframe::parse("3m"), None);
    }

    #[test]
    fn order_status_from_wire() {
        assert_eq!(OrderStatus::from_wire("ACTIVE"), Some(OrderStatus::Open));
        assert_eq!(OrderStatus::from_wire("FILLED"), Some(OrderStatus::Closed));
        assert_eq!(OrderStatus::from_wire("UNKNOWN"), None);
    }

    #[test]
    fn side_is_case_insensitive() {
        assert_eq!(Side::from_wire("SELL"), Some(Side::Sell));
        assert_eq!(Side::from_wire("buy"), Some(Side::Buy));
    }
}
