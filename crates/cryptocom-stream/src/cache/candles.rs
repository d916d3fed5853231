/*
[INPUT]:  OHLCV bars for one (symbol, timeframe)
[OUTPUT]: Bounded candle series with in-progress bar coalescing
[POS]:    Cache layer - candle storage
[UPDATE]: When bar replacement rules change
*/

use super::bounded::BoundedLog;
use crate::types::Candle;

/// Bars keyed by open timestamp. A bar whose timestamp equals the last
/// stored bar replaces it; any other bar is appended.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    bars: BoundedLog<Candle>,
}

impl CandleSeries {
    pub fn new(limit: usize) -> Self {
        Self {
            bars: BoundedLog::new(limit),
        }
    }

    pub fn push(&mut self, candle: Candle) {
        if self.bars.last().is_some_and(|last| last.timestamp == candle.timestamp) {
            self.bars.replace_last(candle);
        } else {
            self.bars.push(candle);
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.bars.last()
    }

    pub fn to_vec(&self) -> Vec<Candle> {
        self.bars.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn bar(ts: i64, close: i64) -> Candle {
        Candle {
            timestamp: ts,
            open: Decimal::from(1),
            high: Decimal::from(close.max(1)),
            low: Decimal::from(1),
            close: Decimal::from(close),
            volume: Decimal::from(10),
        }
    }

    #[test]
    fn same_timestamp_replaces_last_bar() {
        let mut series = CandleSeries::new(10);
        series.push(bar(60_000, 5));
        series.push(bar(120_000, 6));
        series.push(bar(120_000, 9));

        assert_eq!(series.len(), 2);
        assert_eq!(series.last().map(|c| c.close), Some(Decimal::from(9)));
    }

    #[test]
    fn new_timestamp_appends_and_evicts_oldest() {
        let mut series = CandleSeries::new(2);
        series.push(bar(1, 1));
        series.push(bar(2, 2));
        series.push(bar(3, 3));

        let stamps: Vec<i64> = series.to_vec().iter().map(|c| c.timestamp).collect();
        assert_eq!(stamps, vec![2, 3]);
    }
}
