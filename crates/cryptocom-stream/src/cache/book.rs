/*
[INPUT]:  Full order book snapshots
[OUTPUT]: Per-symbol book state, wholesale replaced on every snapshot
[POS]:    Cache layer - order book storage
[UPDATE]: When the book channel starts sending incremental diffs
*/

use std::cmp::Reverse;

use crate::types::OrderBook;

/// Per-symbol order book bounded to the server-advertised depth.
///
/// The newest snapshot always wins; sequence numbers are stored but not
/// compared against the previous snapshot.
#[derive(Debug, Clone)]
pub struct OrderBookState {
    depth: Option<usize>,
    book: OrderBook,
}

impl OrderBookState {
    pub fn new(symbol: impl Into<String>, depth: Option<usize>) -> Self {
        Self {
            depth,
            book: OrderBook::empty(symbol),
        }
    }

    /// Replace the stored book with `snapshot`
    pub fn reset(&mut self, mut snapshot: OrderBook) {
        snapshot.bids.sort_by_key(|level| Reverse(level.price));
        snapshot.asks.sort_by_key(|level| level.price);
        if let Some(depth) = self.depth {
            snapshot.bids.truncate(depth);
            snapshot.asks.truncate(depth);
        }
        self.book = snapshot;
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }
}
