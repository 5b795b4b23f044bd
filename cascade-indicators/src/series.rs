//! Index-addressable reading storage shared between an indicator and its readers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::{IndicatorError, IndicatorResult};

type Readings<T> = Rc<RefCell<Vec<Option<T>>>>;

/// Append-only store of one indicator's readings.
///
/// Slot `i` holds the reading for input row `i`; `None` marks an index where no
/// value could be produced yet. Only the owning indicator holds a `Series`, and
/// everybody else reads through a [`SeriesReader`].
pub struct Series<T> {
    name: Rc<str>,
    readings: Readings<T>,
}

impl<T: Clone> Series<T> {
    /// Creates an empty series labelled with the owning indicator's name.
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            readings: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Name of the owning indicator.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fails when writing `index` would rewrite history older than the trailing slot.
    pub fn ensure_writable(&self, index: usize) -> IndicatorResult<()> {
        match self.last_index() {
            Some(latest) if index < latest => Err(IndicatorError::NonMonotonic {
                name: self.name.to_string(),
                index,
                latest,
            }),
            _ => Ok(()),
        }
    }

    /// Stores `value` at `index`.
    ///
    /// Rewriting the trailing slot is allowed; writing past the end pads the gap
    /// with absent readings.
    pub fn set(&self, index: usize, value: Option<T>) -> IndicatorResult<()> {
        self.ensure_writable(index)?;
        let mut readings = self.readings.borrow_mut();
        if index < readings.len() {
            readings[index] = value;
        } else {
            readings.resize(index, None);
            readings.push(value);
        }
        Ok(())
    }

    /// Drops every stored reading.
    pub fn clear(&self) {
        self.readings.borrow_mut().clear();
    }

    /// Returns a read-only view over the same storage.
    pub fn reader(&self) -> SeriesReader<T> {
        SeriesReader {
            name: Rc::clone(&self.name),
            readings: Rc::clone(&self.readings),
        }
    }

    /// Reading at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        read_at(&self.readings, index)
    }

    /// Reading at the highest written index.
    pub fn latest(&self) -> Option<T> {
        read_latest(&self.readings)
    }

    /// Number of written slots, including absent ones.
    pub fn len(&self) -> usize {
        self.readings.borrow().len()
    }

    /// Returns `true` when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest written index.
    pub fn last_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    /// Number of slots holding a value.
    pub fn count(&self) -> usize {
        self.readings.borrow().iter().flatten().count()
    }
}

impl<T> fmt::Debug for Series<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Series")
            .field("name", &self.name)
            .field("len", &self.readings.borrow().len())
            .finish()
    }
}

/// Cloneable, read-only view over a [`Series`].
pub struct SeriesReader<T> {
    name: Rc<str>,
    readings: Readings<T>,
}

impl<T: Clone> SeriesReader<T> {
    /// Name of the indicator that owns the underlying series.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reading at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        read_at(&self.readings, index)
    }

    /// Reading at the highest written index.
    pub fn latest(&self) -> Option<T> {
        read_latest(&self.readings)
    }

    /// Number of written slots, including absent ones.
    pub fn len(&self) -> usize {
        self.readings.borrow().len()
    }

    /// Returns `true` when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Clone for SeriesReader<T> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            readings: Rc::clone(&self.readings),
        }
    }
}

impl<T> fmt::Debug for SeriesReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesReader")
            .field("name", &self.name)
            .finish()
    }
}

fn read_at<T: Clone>(readings: &Readings<T>, index: usize) -> Option<T> {
    readings.borrow().get(index).cloned().flatten()
}

fn read_latest<T: Clone>(readings: &Readings<T>) -> Option<T> {
    readings.borrow().last().cloned().flatten()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::Series;
    use crate::IndicatorError;

    #[test]
    fn absent_until_written() {
        let series: Series<Decimal> = Series::new("EMA_3");
        assert!(series.is_empty());
        assert_eq!(series.get(0), None);
        assert_eq!(series.latest(), None);
        assert_eq!(series.last_index(), None);
    }

    #[test]
    fn pads_gaps_with_absent_readings() {
        let series = Series::new("MACD_12_26_9_macd");
        series.set(3, Some(dec!(1.5))).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(2), None);
        assert_eq!(series.get(3), Some(dec!(1.5)));
        assert_eq!(series.count(), 1);
    }

    #[test]
    fn trailing_slot_can_be_rewritten() {
        let series = Series::new("SMA_2");
        series.set(0, Some(dec!(1))).unwrap();
        series.set(1, Some(dec!(2))).unwrap();
        series.set(1, Some(dec!(3))).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest(), Some(dec!(3)));
    }

    #[test]
    fn rejects_rewriting_older_history() {
        let series = Series::new("SMA_2");
        series.set(0, Some(dec!(1))).unwrap();
        series.set(1, Some(dec!(2))).unwrap();
        let err = series.set(0, Some(dec!(9))).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::NonMonotonic {
                name: "SMA_2".into(),
                index: 0,
                latest: 1,
            }
        );
        assert_eq!(series.get(0), Some(dec!(1)));
    }

    #[test]
    fn latest_reports_absent_trailing_slot() {
        let series = Series::new("EMA_2");
        series.set(0, Some(dec!(1))).unwrap();
        series.set(1, None).unwrap();
        assert_eq!(series.latest(), None);
    }

    #[test]
    fn readers_observe_writes_and_clears() {
        let series = Series::new("EMA_2");
        let reader = series.reader();
        series.set(0, Some(dec!(4))).unwrap();
        assert_eq!(reader.get(0), Some(dec!(4)));
        assert_eq!(reader.name(), "EMA_2");
        series.clear();
        assert!(reader.is_empty());
    }
}
