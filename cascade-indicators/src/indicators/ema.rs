//! Exponential Moving Average (EMA).

use std::num::NonZeroUsize;

use cascade_core::InputRows;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::composition::IntoIndicator;
use crate::core::{decimal_from_usize, mean, Indicator, IndicatorError, IndicatorResult};
use crate::indicators::sma::leaf_name;
use crate::series::Series;
use crate::source::Source;

/// Declarative EMA parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaConfig {
    /// Input source, `close` by default.
    pub source: Source,
    /// Smoothing period.
    pub period: usize,
}

impl Default for EmaConfig {
    fn default() -> Self {
        Self {
            source: Source::default(),
            period: 10,
        }
    }
}

impl EmaConfig {
    /// EMA over the `close` field.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    /// Replaces the source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<Source>) -> Self {
        self.source = source.into();
        self
    }

    /// Checks the parameters.
    pub fn validate(self) -> IndicatorResult<EmaParams> {
        let period = NonZeroUsize::new(self.period)
            .ok_or_else(|| IndicatorError::invalid_period("EMA", self.period))?;
        Ok(EmaParams {
            source: self.source,
            period,
        })
    }
}

/// Validated EMA parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EmaParams {
    source: Source,
    period: NonZeroUsize,
}

impl EmaParams {
    /// Smoothing period.
    pub fn period(&self) -> usize {
        self.period.get()
    }

    /// Input source.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Display name, e.g. `EMA_12`.
    pub fn name(&self) -> String {
        leaf_name("EMA", self.period(), &self.source)
    }
}

/// Exponentially weighted moving average with smoothing factor `2 / (period + 1)`.
///
/// The first value is the SMA of the first `period` source values; afterwards
/// each reading moves the previous one towards the new value. Whenever the
/// previous reading is absent the EMA seeds itself again from the SMA window.
#[derive(Debug)]
pub struct Ema {
    params: EmaParams,
    name: String,
    multiplier: Decimal,
    series: Series<Decimal>,
}

impl Ema {
    /// Creates an EMA from validated parameters.
    pub fn new(params: EmaParams) -> Self {
        let name = params.name();
        let multiplier = Decimal::TWO / decimal_from_usize(params.period() + 1);
        Self {
            series: Series::new(name.as_str()),
            name,
            multiplier,
            params,
        }
    }

    /// Smoothing period.
    pub fn period(&self) -> usize {
        self.params.period()
    }

    /// Input source.
    pub fn source(&self) -> &Source {
        self.params.source()
    }
}

impl Indicator for Ema {
    type Output = Decimal;

    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> &Series<Decimal> {
        &self.series
    }

    fn calculate_reading(
        &mut self,
        rows: &dyn InputRows,
        index: usize,
    ) -> IndicatorResult<Option<Decimal>> {
        let Some(value) = self.params.source.resolve(rows, index)? else {
            return Ok(None);
        };
        let previous = index
            .checked_sub(1)
            .and_then(|previous| self.series.get(previous));
        if let Some(previous) = previous {
            return Ok(Some((value - previous) * self.multiplier + previous));
        }
        let seed = self
            .params
            .source
            .window(rows, index, self.params.period())?;
        Ok(seed.map(|values| mean(&values)))
    }
}

impl IntoIndicator for EmaConfig {
    type Indicator = Ema;

    fn into_indicator(self) -> IndicatorResult<Ema> {
        Ok(Ema::new(self.validate()?))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_util::closes;

    fn ema(period: usize) -> Ema {
        EmaConfig::new(period).into_indicator().unwrap()
    }

    #[test]
    fn produces_average_after_warmup() {
        let rows = closes(&[1, 2, 3]);
        let mut ema = ema(3);
        ema.calculate(&rows).unwrap();
        assert_eq!(ema.reading_at(0), None);
        assert_eq!(ema.reading_at(1), None);
        assert_eq!(ema.reading_at(2), Some(dec!(2)));
    }

    #[test]
    fn applies_recursive_formula_after_seed() {
        // period 3 gives a multiplier of 0.5
        let rows = closes(&[2, 4, 6, 8, 10]);
        let mut ema = ema(3);
        ema.calculate(&rows).unwrap();
        assert_eq!(ema.reading_at(2), Some(dec!(4)));
        assert_eq!(ema.reading_at(3), Some(dec!(6)));
        assert_eq!(ema.reading_at(4), Some(dec!(8)));
    }

    #[test]
    fn recalculating_the_same_index_is_idempotent() {
        let rows = closes(&[2, 4, 6, 8]);
        let mut ema = ema(3);
        ema.calculate(&rows).unwrap();
        let first = ema.reading_at(3);
        ema.calculate_index(&rows, 3).unwrap();
        assert_eq!(ema.reading_at(3), first);
        assert_eq!(ema.output().len(), 4);
    }

    #[test]
    fn rejects_going_back_in_time() {
        let rows = closes(&[2, 4, 6, 8]);
        let mut ema = ema(2);
        ema.calculate(&rows).unwrap();
        let err = ema.calculate_index(&rows, 1).unwrap_err();
        assert!(matches!(err, IndicatorError::NonMonotonic { index: 1, latest: 3, .. }));
    }

    #[test]
    fn rejects_skipping_uncalculated_indices() {
        let rows = closes(&[2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22]);
        let mut ema = ema(5);
        let err = ema.calculate_index(&rows, 10).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::IndexGap {
                name: "EMA_5".into(),
                index: 10,
                next: 0,
            }
        );
        assert!(ema.output().is_empty());

        ema.calculate(&rows).unwrap();
        let mut stepped = self::ema(5);
        for index in 0..rows.len() {
            stepped.calculate_index(&rows, index).unwrap();
        }
        assert_eq!(ema.reading_at(10), stepped.reading_at(10));
    }

    #[test]
    fn rejects_index_past_input() {
        let rows = closes(&[2, 4]);
        let mut ema = ema(2);
        let err = ema.calculate_index(&rows, 2).unwrap_err();
        assert_eq!(err, IndicatorError::IndexOutOfRange { index: 2, len: 2 });
    }

    #[test]
    fn missing_source_field_fails() {
        let rows = closes(&[2, 4]);
        let mut ema = EmaConfig::new(2)
            .with_source("vwap")
            .into_indicator()
            .unwrap();
        let err = ema.calculate_index(&rows, 0).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::MissingField {
                field: "vwap".into(),
                index: 0
            }
        );
    }
}
