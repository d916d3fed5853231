/*
[INPUT]:  Raw `data` entries of stream frames (serde_json::Value)
[OUTPUT]: Unified records (trades, tickers, candles, orders, balances, book levels)
[POS]:    Data layer - lenient field extraction for push payloads
[UPDATE]: When payload field names change
*/

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use super::enums::{OrderStatus, Side, TakerOrMaker, TimeInForce};
use super::models::{Account, BookLevel, Candle, Fee, Order, Ticker, Trade};
use crate::markets::MarketDirectory;

/// Numbers arrive as JSON numbers or strings, sometimes in scientific notation.
pub(crate) fn decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if raw.is_empty() {
        return None;
    }
    if raw.contains(['e', 'E']) {
        return Decimal::from_scientific(&raw).ok();
    }
    Decimal::from_str(&raw).ok()
}

pub(crate) fn decimal_field(value: &Value, key: &str) -> Option<Decimal> {
    value.get(key).and_then(decimal)
}

pub(crate) fn integer_field(value: &Value, key: &str) -> Option<i64> {
    match value.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn datetime(timestamp: Option<i64>) -> Option<DateTime<Utc>> {
    timestamp.and_then(DateTime::from_timestamp_millis)
}

/// `[[price, amount, count], ...]`
pub(crate) fn book_levels(value: Option<&Value>) -> Vec<BookLevel> {
    let Some(Value::Array(rows)) = value else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let row = row.as_array()?;
            let price = decimal(row.first()?)?;
            let amount = decimal(row.get(1)?)?;
            let count = row.get(2).and_then(|c| match c {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            });
            Some(BookLevel {
                price,
                amount,
                count,
            })
        })
        .collect()
}

/// Public trade (`d`,`s`,`p`,`q`,`t`,`i`) or user trade
/// (`trade_id`,`side`,`traded_price`,`traded_quantity`,`create_time`, ...).
pub(crate) fn trade(value: &Value, markets: &MarketDirectory, fallback_symbol: Option<&str>) -> Option<Trade> {
    let price = decimal_field(value, "p").or_else(|| decimal_field(value, "traded_price"))?;
    let amount = decimal_field(value, "q").or_else(|| decimal_field(value, "traded_quantity"))?;
    let cost = price.checked_mul(amount)?;

    let symbol = string_field(value, "i")
        .or_else(|| string_field(value, "instrument_name"))
        .map(|id| markets.symbol_for_id(&id))
        .or_else(|| fallback_symbol.map(str::to_string))?;

    let timestamp = integer_field(value, "t").or_else(|| integer_field(value, "create_time"));
    let side = string_field(value, "s")
        .or_else(|| string_field(value, "side"))
        .and_then(|s| Side::from_wire(&s));

    let fee = decimal_field(value, "fee").map(|cost| Fee {
        cost,
        currency: string_field(value, "fee_currency"),
    });

    let taker_or_maker = string_field(value, "liquidity_indicator").and_then(|raw| match raw.as_str() {
        "TAKER" => Some(TakerOrMaker::Taker),
        "MAKER" => Some(TakerOrMaker::Maker),
        _ => None,
    });

    Some(Trade {
        id: string_field(value, "d").or_else(|| string_field(value, "trade_id")),
        order_id: string_field(value, "order_id"),
        symbol,
        side,
        price,
        amount,
        cost,
        timestamp,
        datetime: datetime(timestamp),
        fee,
        taker_or_maker,
    })
}

pub(crate) fn ticker(value: &Value, markets: &MarketDirectory, fallback_symbol: &str) -> Ticker {
    let symbol = string_field(value, "i")
        .map(|id| markets.symbol_for_id(&id))
        .unwrap_or_else(|| fallback_symbol.to_string());
    let timestamp = integer_field(value, "t");

    Ticker {
        symbol,
        timestamp,
        datetime: datetime(timestamp),
        high: decimal_field(value, "h"),
        low: decimal_field(value, "l"),
        bid: decimal_field(value, "b"),
        ask: decimal_field(value, "k"),
        last: decimal_field(value, "a"),
        change: decimal_field(value, "c"),
        base_volume: decimal_field(value, "v"),
    }
}

pub(crate) fn candle(value: &Value) -> Option<Candle> {
    Some(Candle {
        timestamp: integer_field(value, "t")?,
        open: decimal_field(value, "o")?,
        high: decimal_field(value, "h")?,
        low: decimal_field(value, "l")?,
        close: decimal_field(value, "c")?,
        volume: decimal_field(value, "v").unwrap_or(Decimal::ZERO),
    })
}

pub(crate) fn order(value: &Value, markets: &MarketDirectory) -> Option<Order> {
    let id = string_field(value, "order_id")?;
    let symbol = string_field(value, "instrument_name")
        .map(|id| markets.symbol_for_id(&id))
        .unwrap_or_default();

    let amount = decimal_field(value, "quantity");
    let filled = decimal_field(value, "cumulative_quantity");
    let remaining = match (amount, filled) {
        (Some(amount), Some(filled)) => amount.checked_sub(filled).map(|left| left.max(Decimal::ZERO)),
        _ => None,
    };
    let timestamp = integer_field(value, "create_time");

    Some(Order {
        id,
        client_order_id: string_field(value, "client_oid"),
        symbol,
        order_type: string_field(value, "type").map(|t| t.to_ascii_lowercase()),
        side: string_field(value, "side").and_then(|s| Side::from_wire(&s)),
        status: string_field(value, "status").and_then(|s| OrderStatus::from_wire(&s)),
        time_in_force: string_field(value, "time_in_force").and_then(|t| TimeInForce::from_wire(&t)),
        price: decimal_field(value, "price"),
        amount,
        filled,
        remaining,
        cost: decimal_field(value, "cumulative_value"),
        average: decimal_field(value, "avg_price"),
        fee_currency: string_field(value, "fee_currency"),
        timestamp,
        datetime: datetime(timestamp),
        last_update_timestamp: integer_field(value, "update_time"),
    })
}

/// `(currency code, account)`; `available` is free, `balance` is total.
pub(crate) fn balance_entry(value: &Value) -> Option<(String, Account)> {
    let currency = string_field(value, "currency")?.to_ascii_uppercase();
    let free = decimal_field(value, "available");
    let total = decimal_field(value, "balance");
    let used = match (free, total) {
        (Some(free), Some(total)) => total.checked_sub(free),
        _ => None,
    };
    Some((currency, Account { free, used, total }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimal_accepts_numbers_strings_and_scientific() {
        assert_eq!(decimal(&json!(122.21)), Decimal::from_str("122.21").ok());
        assert_eq!(decimal(&json!("0.5")), Decimal::from_str("0.5").ok());
        assert_eq!(decimal(&json!("2e-5")), Decimal::from_str("0.00002").ok());
        assert_eq!(decimal(&json!(null)), None);
        assert_eq!(decimal(&json!("")), None);
    }

    #[test]
    fn trade_with_overflowing_cost_is_skipped() {
        let markets = MarketDirectory::new();
        let raw = json!({"d": "1", "s": "BUY", "p": "1e19", "q": "1e19", "t": 1, "i": "BTC_USDT"});
        assert!(trade(&raw, &markets, None).is_none());
    }

    #[test]
    fn overflowing_differences_leave_fields_empty() {
        let markets = MarketDirectory::new();
        let raw = json!({
            "order_id": "9", "instrument_name": "BTC_USDT",
            "quantity": "-79228162514264337593543950335", "cumulative_quantity": "79228162514264337593543950335"
        });
        let parsed = order(&raw, &markets).expect("order");
        assert_eq!(parsed.remaining, None);

        let raw = json!({
            "currency": "btc",
            "balance": "-79228162514264337593543950335", "available": "79228162514264337593543950335"
        });
        let (_, account) = balance_entry(&raw).expect("balance");
        assert_eq!(account.used, None);
    }

    #[test]
    fn parses_public_trade() {
        let markets = MarketDirectory::new();
        let raw = json!({
            "dataTime": 1648122434405u64,
            "d": "2358394540212355488",
            "s": "SELL",
            "p": 42980.85,
            "q": 0.002325,
            "t": 1648122434404u64,
            "i": "BTC_USDT"
        });
        let parsed = trade(&raw, &markets, None).expect("trade");
        assert_eq!(parsed.symbol, "BTC/USDT");
        assert_eq!(parsed.side, Some(Side::Sell));
        assert_eq!(parsed.id.as_deref(), Some("2358394540212355488"));
        assert_eq!(parsed.timestamp, Some(1648122434404));
        assert!(parsed.datetime.is_some());
    }

    #[test]
    fn parses_user_trade_with_fee() {
        let markets = MarketDirectory::new();
        let raw = json!({
            "side": "BUY",
            "instrument_name": "ETH_CRO",
            "fee": 0.01,
            "trade_id": "1",
            "create_time": 1588902493045u64,
            "traded_price": 2,
            "traded_quantity": 3,
            "fee_currency": "CRO",
            "order_id": "42",
            "liquidity_indicator": "TAKER"
        });
        let parsed = trade(&raw, &markets, None).expect("trade");
        assert_eq!(parsed.symbol, "ETH/CRO");
        assert_eq!(parsed.cost, Decimal::from(6));
        assert_eq!(parsed.order_id.as_deref(), Some("42"));
        assert_eq!(parsed.taker_or_maker, Some(TakerOrMaker::Taker));
        assert_eq!(parsed.fee.and_then(|f| f.currency), Some("CRO".to_string()));
    }

    #[test]
    fn parses_order_and_derives_remaining() {
        let markets = MarketDirectory::new();
        let raw = json!({
            "status": "ACTIVE",
            "side": "BUY",
            "price": 1,
            "quantity": 5,
            "order_id": "366455245775097673",
            "client_oid": "my_order_0002",
            "create_time": 1588758017375u64,
            "update_time": 1588758017411u64,
            "type": "LIMIT",
            "instrument_name": "ETH_CRO",
            "cumulative_quantity": 2,
            "cumulative_value": 2,
            "avg_price": 1,
            "fee_currency": "CRO",
            "time_in_force": "GOOD_TILL_CANCEL"
        });
        let parsed = order(&raw, &markets).expect("order");
        assert_eq!(parsed.symbol, "ETH/CRO");
        assert_eq!(parsed.status, Some(OrderStatus::Open));
        assert_eq!(parsed.time_in_force, Some(TimeInForce::Gtc));
        assert_eq!(parsed.remaining, Some(Decimal::from(3)));
        assert_eq!(parsed.order_type.as_deref(), Some("limit"));
    }

    #[test]
    fn parses_balance_entry() {
        let raw = json!({
            "currency": "CRO",
            "balance": 100,
            "available": 60,
            "order": 40,
            "stake": 0
        });
        let (code, account) = balance_entry(&raw).expect("balance");
        assert_eq!(code, "CRO");
        assert_eq!(account.free, Some(Decimal::from(60)));
        assert_eq!(account.total, Some(Decimal::from(100)));
        assert_eq!(account.used, Some(Decimal::from(40)));
    }

    #[test]
    fn book_levels_skip_malformed_rows() {
        let raw = json!([[100, 1, 1], ["bad"], [101.5, "2", 3]]);
        let levels = book_levels(Some(&raw));
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].count, Some(3));
    }
}
