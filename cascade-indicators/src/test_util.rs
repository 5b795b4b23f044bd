use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use cascade_core::Candle;

/// Flat candles one minute apart, one per closing price.
pub(crate) fn closes(values: &[i64]) -> Vec<Candle> {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(offset, value)| {
            Candle::flat(
                Decimal::from(*value),
                Decimal::ONE,
                start + Duration::minutes(offset as i64),
            )
        })
        .collect()
}

/// `count` candles whose close rises by one every bar, starting at 100.
pub(crate) fn rising(count: usize) -> Vec<Candle> {
    let values: Vec<i64> = (0..count as i64).map(|step| 100 + step).collect();
    closes(&values)
}
