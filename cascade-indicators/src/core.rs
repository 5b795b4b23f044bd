//! The indicator contract, its error type, and shared helpers.

use std::fmt;

use cascade_core::InputRows;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::composition::Children;
use crate::series::Series;

/// Result alias used throughout the crate.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// Errors surfaced while configuring or calculating indicators.
///
/// Insufficient history is not an error: it is reported as an absent (`None`) reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    /// A period parameter was zero.
    #[error("{indicator} period must be greater than zero (got {period})")]
    InvalidPeriod {
        /// Indicator kind that rejected the period.
        indicator: &'static str,
        /// Offending period.
        period: usize,
    },
    /// A non-period parameter was out of range.
    #[error("{indicator} parameter `{parameter}` is invalid: {value}")]
    InvalidParameter {
        /// Indicator kind that rejected the parameter.
        indicator: &'static str,
        /// Parameter name.
        parameter: &'static str,
        /// Offending value, rendered for display.
        value: String,
    },
    /// A declarative configuration could not be parsed.
    #[error("invalid indicator configuration: {0}")]
    InvalidConfig(String),
    /// A raw-field source named a field the input row does not carry.
    #[error("input row {index} has no field `{field}`")]
    MissingField {
        /// Requested field name.
        field: String,
        /// Row index being calculated.
        index: usize,
    },
    /// A calculation was requested for a row that does not exist.
    #[error("index {index} is outside the {len} available input rows")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of available rows.
        len: usize,
    },
    /// A write targeted history older than the trailing reading.
    #[error("{name}: index {index} precedes the latest calculated index {latest}")]
    NonMonotonic {
        /// Indicator whose series rejected the write.
        name: String,
        /// Requested index.
        index: usize,
        /// Highest index already stored.
        latest: usize,
    },
    /// A calculation skipped over indices that were never calculated.
    #[error("{name}: index {index} skips ahead of the next uncalculated index {next}")]
    IndexGap {
        /// Indicator that was asked to skip ahead.
        name: String,
        /// Requested index.
        index: usize,
        /// Lowest index not calculated yet.
        next: usize,
    },
    /// An indicator was asked to calculate while it was already calculating.
    #[error("{name} is already being calculated")]
    Reentrant {
        /// Indicator that is busy.
        name: String,
    },
}

impl IndicatorError {
    /// Convenience constructor for [`IndicatorError::InvalidPeriod`].
    pub fn invalid_period(indicator: &'static str, period: usize) -> Self {
        Self::InvalidPeriod { indicator, period }
    }

    /// Convenience constructor for [`IndicatorError::InvalidParameter`].
    pub fn invalid_parameter(
        indicator: &'static str,
        parameter: &'static str,
        value: impl fmt::Display,
    ) -> Self {
        Self::InvalidParameter {
            indicator,
            parameter,
            value: value.to_string(),
        }
    }
}

/// Indicator outputs whose numeric fields can be addressed by name.
pub trait Record: Clone + fmt::Debug {
    /// Names of every field, in display order.
    const FIELDS: &'static [&'static str];

    /// Returns the field called `name`, or `None` for an unknown name.
    fn field(&self, name: &str) -> Option<Decimal>;
}

impl Record for Decimal {
    const FIELDS: &'static [&'static str] = &["value"];

    fn field(&self, name: &str) -> Option<Decimal> {
        (name == "value").then_some(*self)
    }
}

/// A named, parameterised unit producing one reading per input row.
///
/// Implementors supply [`calculate_reading`](Indicator::calculate_reading), the
/// per-index formula. The provided [`calculate_index`](Indicator::calculate_index)
/// wraps it with the calculation protocol: bounds and ordering checks, advancing
/// registered sub-indicators, then storing the result.
pub trait Indicator {
    /// Reading type. `Decimal` for single-line indicators, a struct for composite ones.
    type Output: Record;

    /// Deterministic display name, e.g. `MACD_12_26_9`.
    fn name(&self) -> &str;

    /// Store holding this indicator's readings.
    fn output(&self) -> &Series<Self::Output>;

    /// Owned sub-indicators and managed series, if any.
    fn children(&self) -> Option<&Children> {
        None
    }

    /// Computes the reading at `index`.
    ///
    /// Registered sub-indicators have already been advanced to `index` when this
    /// is called. Returns `Ok(None)` when there is not enough history yet.
    fn calculate_reading(
        &mut self,
        rows: &dyn InputRows,
        index: usize,
    ) -> IndicatorResult<Option<Self::Output>>;

    /// Calculates and stores the reading at `index`.
    ///
    /// `index` must be the trailing stored index (recalculation) or the next
    /// uncalculated one. Readings are recursive, so every earlier index has to
    /// be calculated first.
    fn calculate_index(&mut self, rows: &dyn InputRows, index: usize) -> IndicatorResult<()> {
        let len = rows.row_count();
        if index >= len {
            return Err(IndicatorError::IndexOutOfRange { index, len });
        }
        self.output().ensure_writable(index)?;
        let next = self.output().len();
        if index > next {
            return Err(IndicatorError::IndexGap {
                name: self.name().to_string(),
                index,
                next,
            });
        }
        if let Some(children) = self.children() {
            children.calculate_sub_indicators(rows, index)?;
        }
        let reading = self.calculate_reading(rows, index)?;
        tracing::trace!(
            indicator = self.name(),
            index,
            ready = reading.is_some(),
            "calculated reading"
        );
        self.output().set(index, reading)
    }

    /// Brings the indicator up to date with `rows`.
    ///
    /// The trailing stored index is recalculated, since its row may have changed,
    /// and every row after it is calculated once.
    fn calculate(&mut self, rows: &dyn InputRows) -> IndicatorResult<()> {
        let start = self.output().last_index().unwrap_or(0);
        for index in start..rows.row_count() {
            self.calculate_index(rows, index)?;
        }
        Ok(())
    }

    /// Drops all readings, including those of owned children, and recalculates every row.
    fn recalculate(&mut self, rows: &dyn InputRows) -> IndicatorResult<()> {
        self.reset();
        self.calculate(rows)
    }

    /// Drops all readings, including those of owned children.
    ///
    /// Sub-indicators adopted from another owner keep their readings. A child
    /// that is busy calculating cannot be cleared and is skipped with a
    /// `warn!`, leaving it ahead of this indicator; `calculate` then reuses
    /// its readings.
    fn reset(&mut self) {
        if let Some(children) = self.children() {
            children.reset();
        }
        self.output().clear();
        tracing::debug!(indicator = self.name(), "reset readings");
    }

    /// Reading at the highest calculated index.
    fn reading(&self) -> Option<Self::Output> {
        self.output().latest()
    }

    /// Reading at `index`.
    fn reading_at(&self, index: usize) -> Option<Self::Output> {
        self.output().get(index)
    }

    /// Returns `true` when the latest reading holds a value.
    fn has_reading(&self) -> bool {
        self.reading().is_some()
    }

    /// Number of calculated indices that hold a value.
    fn reading_count(&self) -> usize {
        self.output().count()
    }
}

/// Builds a display name from a kind tag and its effective parameters.
///
/// The result depends only on the arguments, so callers may use it as a cache key.
pub fn indicator_name<P: fmt::Display>(kind: &str, params: &[P]) -> String {
    let mut name = kind.to_string();
    for param in params {
        name.push('_');
        name.push_str(&param.to_string());
    }
    name
}

pub(crate) fn decimal_from_usize(value: usize) -> Decimal {
    Decimal::from(value)
}

pub(crate) fn mean(values: &[Decimal]) -> Decimal {
    let sum: Decimal = values.iter().copied().sum();
    sum / decimal_from_usize(values.len())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn names_join_kind_and_params() {
        assert_eq!(indicator_name("MACD", &[12, 26, 9]), "MACD_12_26_9");
        assert_eq!(indicator_name::<usize>("OBV", &[]), "OBV");
        assert_eq!(indicator_name("EMA", &["9", "open"]), "EMA_9_open");
    }

    #[test]
    fn decimal_record_exposes_value_field() {
        let value = dec!(2.5);
        assert_eq!(value.field("value"), Some(dec!(2.5)));
        assert_eq!(value.field("signal"), None);
        assert_eq!(<Decimal as Record>::FIELDS, &["value"]);
    }

    #[test]
    fn mean_of_window() {
        assert_eq!(mean(&[dec!(1), dec!(2), dec!(6)]), dec!(3));
    }

    #[test]
    fn errors_render_context() {
        let err = IndicatorError::invalid_period("EMA", 0);
        assert_eq!(err.to_string(), "EMA period must be greater than zero (got 0)");
        let err = IndicatorError::MissingField {
            field: "vwap".into(),
            index: 4,
        };
        assert_eq!(err.to_string(), "input row 4 has no field `vwap`");
    }
}
