//! Simple Moving Average (SMA).

use std::num::NonZeroUsize;

use cascade_core::InputRows;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::composition::IntoIndicator;
use crate::core::{indicator_name, mean, Indicator, IndicatorError, IndicatorResult};
use crate::series::Series;
use crate::source::Source;

/// Declarative SMA parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaConfig {
    /// Input source, `close` by default.
    pub source: Source,
    /// Lookback period.
    pub period: usize,
}

impl Default for SmaConfig {
    fn default() -> Self {
        Self {
            source: Source::default(),
            period: 10,
        }
    }
}

impl SmaConfig {
    /// SMA over the `close` field.
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
    pub fn validate(self) -> IndicatorResult<SmaParams> {
        let period = NonZeroUsize::new(self.period)
            .ok_or_else(|| IndicatorError::invalid_period("SMA", self.period))?;
        Ok(SmaParams {
            source: self.source,
            period,
        })
    }
}

/// Validated SMA parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SmaParams {
    source: Source,
    period: NonZeroUsize,
}

impl SmaParams {
    /// Lookback period.
    pub fn period(&self) -> usize {
        self.period.get()
    }

    /// Input source.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Display name, e.g. `SMA_10`.
    pub fn name(&self) -> String {
        leaf_name("SMA", self.period(), &self.source)
    }
}

/// Arithmetic mean of the last `period` source values.
#[derive(Debug)]
pub struct Sma {
    params: SmaParams,
    name: String,
    series: Series<Decimal>,
}

impl Sma {
    /// Creates an SMA from validated parameters.
    pub fn new(params: SmaParams) -> Self {
        let name = params.name();
        Self {
            series: Series::new(name.as_str()),
            name,
            params,
        }
    }

    /// Lookback period.
    pub fn period(&self) -> usize {
        self.params.period()
    }
}

impl Indicator for Sma {
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
        let window = self
            .params
            .source
            .window(rows, index, self.params.period())?;
        Ok(window.map(|values| mean(&values)))
    }
}

impl IntoIndicator for SmaConfig {
    type Indicator = Sma;

    fn into_indicator(self) -> IndicatorResult<Sma> {
        Ok(Sma::new(self.validate()?))
    }
}

/// Names a single-source indicator; the source is only spelled out when it is not `close`.
pub(crate) fn leaf_name(kind: &str, period: usize, source: &Source) -> String {
    if source.is_default() {
        indicator_name(kind, &[period])
    } else {
        indicator_name(kind, &[period.to_string(), source.label()])
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::test_util::closes;

    fn sma(period: usize) -> Sma {
        SmaConfig::new(period).into_indicator().unwrap()
    }

    #[test]
    fn waits_for_full_window() {
        let rows = closes(&[1, 2, 3]);
        let mut sma = sma(3);
        sma.calculate(&rows).unwrap();
        assert_eq!(sma.reading_at(0), None);
        assert_eq!(sma.reading_at(1), None);
        assert_eq!(sma.reading_at(2), Some(dec!(2)));
    }

    #[test]
    fn rolls_forward() {
        let rows = closes(&[1, 2, 3, 4, 5]);
        let mut sma = sma(3);
        sma.calculate(&rows).unwrap();
        assert_eq!(sma.reading_at(3), Some(dec!(3)));
        assert_eq!(sma.reading(), Some(dec!(4)));
        assert_eq!(sma.reading_count(), 3);
    }

    #[test]
    fn reset_clears_readings() {
        let rows = closes(&[5, 7, 9]);
        let mut sma = sma(2);
        sma.calculate(&rows).unwrap();
        assert_eq!(sma.reading(), Some(dec!(8)));
        sma.reset();
        assert!(!sma.has_reading());
        assert!(sma.output().is_empty());
    }

    #[test]
    fn rejects_zero_period() {
        let err = SmaConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidPeriod { period: 0, .. }));
    }

    #[test]
    fn name_mentions_non_default_source() {
        assert_eq!(sma(3).name(), "SMA_3");
        let open = SmaConfig::new(3).with_source("open").validate().unwrap();
        assert_eq!(open.name(), "SMA_3_open");
    }
}
