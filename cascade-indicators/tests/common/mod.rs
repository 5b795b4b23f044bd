#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use cascade_core::Candle;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

pub fn candle(close: Decimal, minute: i64) -> Candle {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    Candle {
        open: close,
        high: close + Decimal::ONE,
        low: close - Decimal::ONE,
        close,
        volume: Decimal::TEN,
        timestamp: start + Duration::minutes(minute),
    }
}

/// Monotonically increasing closes: 100, 101, 102, ...
pub fn rising(count: usize) -> Vec<Candle> {
    (0..count as i64)
        .map(|step| candle(Decimal::from(100 + step), step))
        .collect()
}

/// A deterministic zig-zag that exercises both signs of the MACD histogram.
pub fn wave(count: usize) -> Vec<Candle> {
    (0..count as i64)
        .map(|step| {
            let swing = Decimal::from((step % 7) * 3 - 9);
            candle(Decimal::from(200) + swing + Decimal::from(step) / Decimal::TWO, step)
        })
        .collect()
}
