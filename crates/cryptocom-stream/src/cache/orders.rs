/*
[INPUT]:  Order updates across all symbols
[OUTPUT]: Single bounded order log keyed by (symbol, order id)
[POS]:    Cache layer - user order storage
[UPDATE]: When order identity or eviction rules change
*/

use super::bounded::BoundedLog;
use crate::types::Order;

/// Upserts by `(symbol, id)`: a known key is updated in place, a new key is
/// appended and may evict the oldest entry by arrival.
#[derive(Debug, Clone)]
pub struct OrderLog {
    orders: BoundedLog<Order>,
}

impl OrderLog {
    pub fn new(limit: usize) -> Self {
        Self {
            orders: BoundedLog::new(limit),
        }
    }

    pub fn upsert(&mut self, order: Order) {
        let existing = self
            .orders
            .find_mut(|stored| stored.symbol == order.symbol && stored.id == order.id);
        match existing {
            Some(stored) => *stored = order,
            None => self.orders.push(order),
        }
    }

    pub fn get(&self, symbol: &str, id: &str) -> Option<&Order> {
        self.orders
            .iter()
            .find(|order| order.symbol == symbol && order.id == id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Order> {
        self.orders.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderStatus;

    fn order(symbol: &str, id: &str, status: OrderStatus) -> Order {
        Order {
            id: id.to_string(),
            client_order_id: None,
            symbol: symbol.to_string(),
            order_type: Some("limit".to_string()),
            side: None,
            status: Some(status),
            time_in_force: None,
            price: None,
            amount: None,
            filled: None,
            remaining: None,
            cost: None,
            average: None,
            fee_currency: None,
            timestamp: None,
            datetime: None,
            last_update_timestamp: None,
        }
    }

    #[test]
    fn upsert_updates_in_place() {
        let mut log = OrderLog::new(10);
        log.upsert(order("ETH/CRO", "1", OrderStatus::Open));
        log.upsert(order("ETH/CRO", "2", OrderStatus::Open));
        log.upsert(order("ETH/CRO", "1", OrderStatus::Closed));

        assert_eq!(log.len(), 2);
        let ids: Vec<String> = log.to_vec().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(
            log.get("ETH/CRO", "1").and_then(|o| o.status),
            Some(OrderStatus::Closed)
        );
    }

    #[test]
    fn same_id_on_other_symbol_is_a_new_key() {
        let mut log = OrderLog::new(10);
        log.upsert(order("ETH/CRO", "1", OrderStatus::Open));
        log.upsert(order("BTC/USDT", "1", OrderStatus::Open));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn new_key_evicts_oldest_when_full() {
        let mut log = OrderLog::new(2);
        log.upsert(order("A/B", "1", OrderStatus::Open));
        log.upsert(order("A/B", "2", OrderStatus::Open));
        log.upsert(order("A/B", "2", OrderStatus::Canceled));
        assert_eq!(log.len(), 2);

        log.upsert(order("A/B", "3", OrderStatus::Open));
        assert!(log.get("A/B", "1").is_none());
        assert_eq!(log.len(), 2);
    }
}
