//! Absolute Price Oscillator (APO).

use std::num::NonZeroUsize;

use cascade_core::InputRows;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::composition::{Children, Handle, Initialiser, IntoIndicator};
use crate::core::{indicator_name, Indicator, IndicatorError, IndicatorResult};
use crate::indicators::ema::{Ema, EmaConfig};
use crate::series::Series;
use crate::source::Source;

/// Declarative APO parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApoConfig {
    /// Input source, `close` by default.
    pub source: Source,
    /// Period of the fast EMA.
    pub fast_period: usize,
    /// Period of the slow EMA.
    pub slow_period: usize,
}

impl Default for ApoConfig {
    fn default() -> Self {
        Self {
            source: Source::default(),
            fast_period: 12,
            slow_period: 26,
        }
    }
}

impl ApoConfig {
    /// Normalises the parameters; misordered periods are swapped.
    pub fn validate(self) -> IndicatorResult<ApoParams> {
        let (fast, slow) = ordered_periods("APO", self.fast_period, self.slow_period)?;
        Ok(ApoParams {
            source: self.source,
            fast_period: fast,
            slow_period: slow,
        })
    }
}

/// Validated APO parameters, with `fast_period <= slow_period`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApoParams {
    source: Source,
    fast_period: NonZeroUsize,
    slow_period: NonZeroUsize,
}

impl ApoParams {
    /// Fast EMA period.
    pub fn fast_period(&self) -> usize {
        self.fast_period.get()
    }

    /// Slow EMA period.
    pub fn slow_period(&self) -> usize {
        self.slow_period.get()
    }

    /// Display name, e.g. `APO_12_26`.
    pub fn name(&self) -> String {
        let mut params = vec![self.fast_period().to_string(), self.slow_period().to_string()];
        if !self.source.is_default() {
            params.push(self.source.label());
        }
        indicator_name("APO", params.as_slice())
    }

    fn ema(&self, period: usize) -> EmaConfig {
        EmaConfig::new(period).with_source(self.source.clone())
    }
}

/// Difference between a fast and a slow EMA of the same source.
#[derive(Debug)]
pub struct Apo {
    name: String,
    series: Series<Decimal>,
    children: Children,
    fast: Handle<Ema>,
    slow: Handle<Ema>,
}

impl Apo {
    /// Creates an APO owning its two EMAs.
    pub fn new(params: ApoParams) -> IndicatorResult<Self> {
        let name = params.name();
        let mut init = Initialiser::new(name.as_str());
        let fast = init.add_sub_indicator(params.ema(params.fast_period()))?;
        let slow = init.add_sub_indicator(params.ema(params.slow_period()))?;
        Ok(Self::assemble(name, init.finish(), fast, slow))
    }

    /// Creates an APO over EMAs that are also owned elsewhere.
    ///
    /// The EMAs are swapped if `fast` has the longer period. Calculation of the
    /// shared EMAs must not interleave conflicting indices between owners.
    pub fn from_shared(fast: Handle<Ema>, slow: Handle<Ema>) -> IndicatorResult<Self> {
        let (fast, slow) = match (fast.with(Ema::period)?, slow.with(Ema::period)?) {
            (f, s) if s < f => (slow, fast),
            _ => (fast, slow),
        };
        let name = indicator_name("APO", &[fast.with(Ema::period)?, slow.with(Ema::period)?]);
        let mut init = Initialiser::new(name.as_str());
        init.adopt_sub_indicator(&fast);
        init.adopt_sub_indicator(&slow);
        Ok(Self::assemble(name, init.finish(), fast, slow))
    }

    fn assemble(name: String, children: Children, fast: Handle<Ema>, slow: Handle<Ema>) -> Self {
        Self {
            series: Series::new(name.as_str()),
            name,
            children,
            fast,
            slow,
        }
    }
}

impl Indicator for Apo {
    type Output = Decimal;

    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> &Series<Decimal> {
        &self.series
    }

    fn children(&self) -> Option<&Children> {
        Some(&self.children)
    }

    fn calculate_reading(
        &mut self,
        _rows: &dyn InputRows,
        index: usize,
    ) -> IndicatorResult<Option<Decimal>> {
        match (self.fast.reading_at(index), self.slow.reading_at(index)) {
            (Some(fast), Some(slow)) => Ok(Some(fast - slow)),
            _ => Ok(None),
        }
    }
}

impl IntoIndicator for ApoConfig {
    type Indicator = Apo;

    fn into_indicator(self) -> IndicatorResult<Apo> {
        Apo::new(self.validate()?)
    }
}

/// Rejects zero periods and orders a fast/slow pair so that `fast <= slow`.
pub(crate) fn ordered_periods(
    indicator: &'static str,
    fast: usize,
    slow: usize,
) -> IndicatorResult<(NonZeroUsize, NonZeroUsize)> {
    let fast_period =
        NonZeroUsize::new(fast).ok_or_else(|| IndicatorError::invalid_period(indicator, fast))?;
    let slow_period =
        NonZeroUsize::new(slow).ok_or_else(|| IndicatorError::invalid_period(indicator, slow))?;
    if slow_period < fast_period {
        tracing::debug!(
            indicator,
            fast,
            slow,
            "slow period shorter than fast period; swapping"
        );
        return Ok((slow_period, fast_period));
    }
    Ok((fast_period, slow_period))
}
