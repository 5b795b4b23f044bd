//! Moving Average Convergence Divergence indicator implementation.

use std::num::NonZeroUsize;

use cascade_core::InputRows;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::composition::{Children, Handle, Initialiser, IntoIndicator};
use crate::core::{indicator_name, Indicator, IndicatorError, IndicatorResult, Record};
use crate::indicators::apo::ordered_periods;
use crate::indicators::ema::{Ema, EmaConfig};
use crate::managed::Managed;
use crate::series::Series;
use crate::source::Source;

/// MACD output (line, signal line, and histogram).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdOutput {
    /// MACD line value (fast EMA minus slow EMA).
    pub macd: Decimal,
    /// Signal line value (EMA of the MACD line).
    pub signal: Decimal,
    /// Histogram representing the distance between MACD and signal lines.
    pub histogram: Decimal,
}

impl Record for MacdOutput {
    const FIELDS: &'static [&'static str] = &["MACD", "signal", "histogram"];

    fn field(&self, name: &str) -> Option<Decimal> {
        match name {
            "MACD" => Some(self.macd),
            "signal" => Some(self.signal),
            "histogram" => Some(self.histogram),
            _ => None,
        }
    }
}

/// Declarative MACD parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    /// Input source, `close` by default.
    pub source: Source,
    /// Period of the fast EMA.
    pub fast_period: usize,
    /// Period of the slow EMA.
    pub slow_period: usize,
    /// Period of the signal EMA applied to the MACD line.
    pub signal_period: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            source: Source::default(),
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl MacdConfig {
    /// MACD over `close` with custom periods.
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            source: Source::default(),
            fast_period,
            slow_period,
            signal_period,
        }
    }

    /// Normalises the parameters; misordered fast/slow periods are swapped.
    pub fn validate(self) -> IndicatorResult<MacdParams> {
        let (fast_period, slow_period) =
            ordered_periods("MACD", self.fast_period, self.slow_period)?;
        let signal_period = NonZeroUsize::new(self.signal_period)
            .ok_or_else(|| IndicatorError::invalid_period("MACD", self.signal_period))?;
        Ok(MacdParams {
            source: self.source,
            fast_period,
            slow_period,
            signal_period,
        })
    }
}

/// Validated MACD parameters, with `fast_period <= slow_period`.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdParams {
    source: Source,
    fast_period: NonZeroUsize,
    slow_period: NonZeroUsize,
    signal_period: NonZeroUsize,
}

impl MacdParams {
    /// Fast EMA period.
    pub fn fast_period(&self) -> usize {
        self.fast_period.get()
    }

    /// Slow EMA period.
    pub fn slow_period(&self) -> usize {
        self.slow_period.get()
    }

    /// Signal EMA period.
    pub fn signal_period(&self) -> usize {
        self.signal_period.get()
    }

    /// Input source.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Display name, e.g. `MACD_12_26_9`.
    pub fn name(&self) -> String {
        let mut params = vec![
            self.fast_period().to_string(),
            self.slow_period().to_string(),
            self.signal_period().to_string(),
        ];
        if !self.source.is_default() {
            params.push(self.source.label());
        }
        indicator_name("MACD", params.as_slice())
    }
}

/// Moving Average Convergence Divergence indicator.
///
/// The MACD line (fast EMA minus slow EMA) is published through a managed
/// series named `{name}_macd`, which feeds the signal EMA. Every field stays
/// absent until both the slow EMA and the signal EMA have warmed up.
#[derive(Debug)]
pub struct Macd {
    params: MacdParams,
    name: String,
    series: Series<MacdOutput>,
    children: Children,
    line: Handle<Managed>,
    fast: Handle<Ema>,
    slow: Handle<Ema>,
    signal: Handle<Ema>,
}

impl Macd {
    /// Create a MACD indicator from validated parameters.
    pub fn new(params: MacdParams) -> IndicatorResult<Self> {
        let name = params.name();
        let mut init = Initialiser::new(name.as_str());
        let line = init.add_managed_indicator(Managed::new(format!("{name}_macd")))?;
        let fast = init.add_sub_indicator(
            EmaConfig::new(params.fast_period()).with_source(params.source.clone()),
        )?;
        let slow = init.add_sub_indicator(
            EmaConfig::new(params.slow_period()).with_source(params.source.clone()),
        )?;
        let signal = init.add_managed_indicator(
            EmaConfig::new(params.signal_period()).with_source(line.source()),
        )?;

        Ok(Self {
            series: Series::new(name.as_str()),
            name,
            params,
            children: init.finish(),
            line,
            fast,
            slow,
            signal,
        })
    }

    /// Effective parameters.
    pub fn params(&self) -> &MacdParams {
        &self.params
    }

    /// The raw MACD line, addressable by index.
    pub fn line(&self) -> &Handle<Managed> {
        &self.line
    }

    /// Fast EMA, shareable with other composites.
    pub fn fast(&self) -> &Handle<Ema> {
        &self.fast
    }

    /// Slow EMA, shareable with other composites.
    pub fn slow(&self) -> &Handle<Ema> {
        &self.slow
    }

    /// Signal EMA of the MACD line.
    pub fn signal(&self) -> &Handle<Ema> {
        &self.signal
    }
}

impl Indicator for Macd {
    type Output = MacdOutput;

    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> &Series<MacdOutput> {
        &self.series
    }

    fn children(&self) -> Option<&Children> {
        Some(&self.children)
    }

    fn calculate_reading(
        &mut self,
        rows: &dyn InputRows,
        index: usize,
    ) -> IndicatorResult<Option<MacdOutput>> {
        let line = match (self.fast.reading_at(index), self.slow.reading_at(index)) {
            (Some(fast), Some(slow)) => Some(fast - slow),
            _ => None,
        };

        // The signal EMA reads the line, so the line must be written first. It
        // is advanced even while the line is absent to keep its history contiguous.
        self.line.set_reading(index, line)?;
        self.signal.calculate_index(rows, index)?;

        let (Some(line), Some(signal)) = (line, self.signal.reading_at(index)) else {
            return Ok(None);
        };
        Ok(Some(MacdOutput {
            macd: line,
            signal,
            histogram: line - signal,
        }))
    }
}

impl IntoIndicator for MacdConfig {
    type Indicator = Macd;

    fn into_indicator(self) -> IndicatorResult<Macd> {
        Macd::new(self.validate()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{closes, rising};

    fn macd(fast: usize, slow: usize, signal: usize) -> Macd {
        MacdConfig::new(fast, slow, signal).into_indicator().unwrap()
    }

    #[test]
    fn macd_emits_after_warmup() {
        let rows = rising(16);
        let mut macd = macd(3, 6, 3);
        macd.calculate(&rows).unwrap();
        // slow EMA ready at 5, signal needs two more lines
        assert_eq!(macd.reading_at(6), None);
        assert!(macd.reading_at(7).is_some());
        assert!(macd.reading().is_some());
    }

    #[test]
    fn first_reading_of_standard_macd_is_at_index_33() {
        let rows = rising(40);
        let mut macd = MacdConfig::default().into_indicator().unwrap();
        macd.calculate(&rows).unwrap();
        assert_eq!(macd.name(), "MACD_12_26_9");
        assert!((0..33).all(|index| macd.reading_at(index).is_none()));
        let first = macd.reading_at(33).unwrap();
        assert_eq!(first.macd - first.signal, first.histogram);
        assert_eq!(macd.line().reading_at(24), None);
        assert!(macd.line().reading_at(25).is_some());
    }

    #[test]
    fn line_is_fast_minus_slow() {
        let rows = closes(&[1, 2, 3, 4, 5, 6]);
        let mut macd = macd(2, 3, 2);
        macd.calculate(&rows).unwrap();
        for index in 2..6 {
            let expected =
                macd.fast().reading_at(index).unwrap() - macd.slow().reading_at(index).unwrap();
            assert_eq!(macd.line().reading_at(index), Some(expected));
        }
    }

    #[test]
    fn histogram_is_exact_difference() {
        let rows = closes(&[10, 12, 11, 15, 14, 13, 17, 19, 18, 16, 21, 22]);
        let mut macd = macd(3, 5, 2);
        macd.calculate(&rows).unwrap();
        let mut seen = 0;
        for index in 0..rows.len() {
            if let Some(output) = macd.reading_at(index) {
                assert_eq!(output.histogram, output.macd - output.signal);
                assert_eq!(output.field("histogram"), Some(output.histogram));
                seen += 1;
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn swapped_periods_are_normalised() {
        let swapped = macd(26, 12, 9);
        let ordered = macd(12, 26, 9);
        assert_eq!(swapped.name(), "MACD_12_26_9");
        assert_eq!(swapped.params(), ordered.params());
        assert_eq!(swapped.fast().name(), "EMA_12");
        assert_eq!(swapped.slow().name(), "EMA_26");
    }

    #[test]
    fn children_are_registered_once() {
        let macd = macd(12, 26, 9);
        let children = macd.children().unwrap();
        assert_eq!(children.sub_indicator_names(), vec!["EMA_12", "EMA_26"]);
        assert_eq!(
            children.managed_names(),
            vec!["MACD_12_26_9_macd", "EMA_9_MACD_12_26_9_macd"]
        );
    }

    #[test]
    fn signal_ema_advances_with_every_index() {
        let rows = rising(8);
        let mut macd = macd(2, 4, 2);
        macd.calculate(&rows).unwrap();
        assert_eq!(macd.signal().len(), 8);
        assert_eq!(macd.line().len(), 8);
        assert_eq!(macd.signal().reading_at(3), None);
        assert!(macd.signal().reading_at(4).is_some());
    }

    #[test]
    fn rejects_zero_signal_period() {
        let err = MacdConfig::new(12, 26, 0).validate().unwrap_err();
        assert_eq!(err, IndicatorError::invalid_period("MACD", 0));
    }

    #[test]
    fn reset_clears_every_child() {
        let rows = rising(12);
        let mut macd = macd(2, 4, 2);
        macd.calculate(&rows).unwrap();
        assert!(macd.has_reading());
        macd.reset();
        assert!(macd.output().is_empty());
        assert!(macd.line().is_empty());
        assert!(macd.signal().is_empty());
        assert!(macd.fast().is_empty());
        assert_eq!(macd.reading(), None);
    }
}
