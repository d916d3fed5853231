/*
[INPUT]:  Preloaded market metadata (optional) and unified symbols / instrument ids
[OUTPUT]: Symbol <-> instrument id resolution
[POS]:    Market lookup - stands in for REST-loaded market metadata
[UPDATE]: When instrument naming conventions change
*/

use std::collections::HashMap;

use crate::types::{Market, MarketKind};

/// Resolves unified symbols to exchange instrument ids and back.
///
/// Preloaded markets take precedence; anything else falls back to the
/// exchange naming convention (`BTC_USDT` for spot, `BTCUSD-PERP` for swaps).
#[derive(Debug, Clone, Default)]
pub struct MarketDirectory {
    by_symbol: HashMap<String, Market>,
    by_id: HashMap<String, Market>,
}

impl MarketDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markets(markets: impl IntoIterator<Item = Market>) -> Self {
        let mut directory = Self::new();
        directory.load(markets);
        directory
    }

    /// Add or replace markets
    pub fn load(&mut self, markets: impl IntoIterator<Item = Market>) {
        for market in markets {
            self.by_id.insert(market.id.clone(), market.clone());
            self.by_symbol.insert(market.symbol.clone(), market);
        }
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    /// Market for a unified symbol (or a raw instrument id)
    pub fn market(&self, symbol: &str) -> Market {
        if let Some(market) = self.by_symbol.get(symbol) {
            return market.clone();
        }
        if let Some(market) = self.by_id.get(symbol) {
            return market.clone();
        }
        infer_from_symbol(symbol)
    }

    /// Market for an exchange instrument id
    pub fn market_by_id(&self, id: &str) -> Market {
        match self.by_id.get(id) {
            Some(market) => market.clone(),
            None => infer_from_id(id),
        }
    }

    pub fn symbol_for_id(&self, id: &str) -> String {
        self.market_by_id(id).symbol
    }
}

fn infer_from_symbol(symbol: &str) -> Market {
    if let Some((base, rest)) = symbol.split_once('/') {
        // BTC/USD:USD style contract symbols
        if let Some((quote, _settle)) = rest.split_once(':') {
            return Market {
                symbol: symbol.to_string(),
                id: format!("{base}{quote}-PERP"),
                base: base.to_string(),
                quote: quote.to_string(),
                kind: MarketKind::Swap,
            };
        }
        return Market::spot(base, rest);
    }
    infer_from_id(symbol)
}

fn infer_from_id(id: &str) -> Market {
    if let Some(pair) = id.strip_suffix("-PERP") {
        let (base, quote) = split_contract_pair(pair);
        return Market {
            symbol: format!("{base}/{quote}:{quote}"),
            id: id.to_string(),
            base,
            quote,
            kind: MarketKind::Swap,
        };
    }

    match id.split_once('_') {
        Some((base, quote)) => Market::spot(base, quote),
        None => Market {
            symbol: id.to_string(),
            id: id.to_string(),
            base: id.to_string(),
            quote: String::new(),
            kind: MarketKind::Spot,
        },
    }
}

fn split_contract_pair(pair: &str) -> (String, String) {
    for quote in ["USDT", "USD"] {
        if let Some(base) = pair.strip_suffix(quote)
            && !base.is_empty()
        {
            return (base.to_string(), quote.to_string());
        }
    }
    (pair.to_string(), String::new())
}
