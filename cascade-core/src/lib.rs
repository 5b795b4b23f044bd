//! Input-side domain types consumed by the Cascade indicator engine.
//!
//! Indicators never own their input. They are handed an [`InputRows`] view on
//! every calculation call and pull named fields out of individual [`Row`]s.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Field names understood by [`Candle`].
pub mod fields {
    /// Opening price.
    pub const OPEN: &str = "open";
    /// Highest traded price.
    pub const HIGH: &str = "high";
    /// Lowest traded price.
    pub const LOW: &str = "low";
    /// Closing price.
    pub const CLOSE: &str = "close";
    /// Traded volume.
    pub const VOLUME: &str = "volume";
    /// Median price, `(high + low) / 2`.
    pub const HL2: &str = "hl2";
    /// Typical price, `(high + low + close) / 3`.
    pub const HLC3: &str = "hlc3";
}

/// A single input row addressed by field name.
pub trait Row {
    /// Returns the value stored under `name`, or `None` when the row has no such field.
    fn field(&self, name: &str) -> Option<Decimal>;
}

/// Ordered, index-addressable collection of input rows. Index 0 is the earliest row.
pub trait InputRows {
    /// Number of rows currently available.
    fn row_count(&self) -> usize;

    /// Returns the row at `index`, if it exists.
    fn row(&self, index: usize) -> Option<&dyn Row>;

    /// Returns `true` when no rows are available.
    fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

/// OHLCV bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    /// Build a flat candle where every price equals `price`.
    pub fn flat(price: Decimal, volume: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
            timestamp,
        }
    }

    /// Typical price, `(high + low + close) / 3`.
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }
}

impl Row for Candle {
    fn field(&self, name: &str) -> Option<Decimal> {
        match name {
            fields::OPEN => Some(self.open),
            fields::HIGH => Some(self.high),
            fields::LOW => Some(self.low),
            fields::CLOSE => Some(self.close),
            fields::VOLUME => Some(self.volume),
            fields::HL2 => Some((self.high + self.low) / Decimal::TWO),
            fields::HLC3 => Some(self.typical_price()),
            _ => None,
        }
    }
}

impl Row for HashMap<String, Decimal> {
    fn field(&self, name: &str) -> Option<Decimal> {
        self.get(name).copied()
    }
}

impl Row for BTreeMap<String, Decimal> {
    fn field(&self, name: &str) -> Option<Decimal> {
        self.get(name).copied()
    }
}

impl<R: Row> Row for &R {
    fn field(&self, name: &str) -> Option<Decimal> {
        (**self).field(name)
    }
}

impl<R: Row> InputRows for Vec<R> {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> Option<&dyn Row> {
        self.get(index).map(|row| row as &dyn Row)
    }
}

impl<R: Row> InputRows for VecDeque<R> {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> Option<&dyn Row> {
        self.get(index).map(|row| row as &dyn Row)
    }
}

impl<R: Row, const N: usize> InputRows for [R; N] {
    fn row_count(&self) -> usize {
        N
    }

    fn row(&self, index: usize) -> Option<&dyn Row> {
        self.get(index).map(|row| row as &dyn Row)
    }
}
