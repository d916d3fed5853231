/*
[INPUT]:  Per-currency balance records
[OUTPUT]: Balance table merged by currency code
[POS]:    Cache layer - account balance storage
[UPDATE]: When account fields change
*/

use serde_json::Value;

use crate::types::{Account, Balances};

/// Each update replaces only the currencies it names.
#[derive(Debug, Clone, Default)]
pub struct BalanceTable {
    balances: Balances,
}

impl BalanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, currency: String, account: Account) {
        self.balances.accounts.insert(currency, account);
    }

    pub fn set_info(&mut self, info: Value, timestamp: Option<i64>) {
        self.balances.info = info;
        self.balances.timestamp = timestamp;
    }

    pub fn get(&self, currency: &str) -> Option<&Account> {
        self.balances.get(currency)
    }

    pub fn snapshot(&self) -> Balances {
        self.balances.clone()
    }
}
