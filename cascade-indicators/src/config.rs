//! Declarative indicator configuration and the factory that builds from it.

use cascade_core::InputRows;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::composition::IntoIndicator;
use crate::core::{Indicator, IndicatorError, IndicatorResult, Record};
use crate::indicators::{Apo, ApoConfig, Ema, EmaConfig, Macd, MacdConfig, Sma, SmaConfig};

/// Any built-in indicator, described by its parameters.
///
/// ```toml
/// kind = "macd"
/// fast_period = 12
/// slow_period = 26
/// signal_period = 9
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IndicatorConfig {
    /// Simple moving average.
    Sma(SmaConfig),
    /// Exponential moving average.
    Ema(EmaConfig),
    /// Absolute price oscillator.
    Apo(ApoConfig),
    /// Moving average convergence divergence.
    Macd(MacdConfig),
}

impl TryFrom<toml::Value> for IndicatorConfig {
    type Error = IndicatorError;

    fn try_from(value: toml::Value) -> Result<Self, Self::Error> {
        value.try_into().map_err(|err: toml::de::Error| {
            IndicatorError::InvalidConfig(format!("failed to parse indicator config: {err}"))
        })
    }
}

impl IndicatorConfig {
    /// Parses a TOML document describing one indicator.
    pub fn from_toml_str(raw: &str) -> IndicatorResult<Self> {
        toml::from_str(raw).map_err(|err| {
            IndicatorError::InvalidConfig(format!("failed to parse indicator config: {err}"))
        })
    }

    /// Name the built indicator will carry, after parameter normalisation.
    ///
    /// Two configs with the same effective parameters yield the same name.
    pub fn name(&self) -> IndicatorResult<String> {
        Ok(match self.clone() {
            Self::Sma(config) => config.validate()?.name(),
            Self::Ema(config) => config.validate()?.name(),
            Self::Apo(config) => config.validate()?.name(),
            Self::Macd(config) => config.validate()?.name(),
        })
    }

    /// Validates the parameters and builds the indicator.
    pub fn build(self) -> IndicatorResult<AnyIndicator> {
        let indicator = match self {
            Self::Sma(config) => AnyIndicator::Sma(config.into_indicator()?),
            Self::Ema(config) => AnyIndicator::Ema(config.into_indicator()?),
            Self::Apo(config) => AnyIndicator::Apo(config.into_indicator()?),
            Self::Macd(config) => AnyIndicator::Macd(config.into_indicator()?),
        };
        tracing::debug!(indicator = indicator.name(), "built indicator from config");
        Ok(indicator)
    }
}

/// A built-in indicator chosen at runtime.
#[derive(Debug)]
pub enum AnyIndicator {
    /// Simple moving average.
    Sma(Sma),
    /// Exponential moving average.
    Ema(Ema),
    /// Absolute price oscillator.
    Apo(Apo),
    /// Moving average convergence divergence.
    Macd(Macd),
}

macro_rules! dispatch {
    ($self:expr, $indicator:ident => $body:expr) => {
        match $self {
            AnyIndicator::Sma($indicator) => $body,
            AnyIndicator::Ema($indicator) => $body,
            AnyIndicator::Apo($indicator) => $body,
            AnyIndicator::Macd($indicator) => $body,
        }
    };
}

impl AnyIndicator {
    /// Display name.
    pub fn name(&self) -> &str {
        dispatch!(self, indicator => indicator.name())
    }

    /// Output field names, in display order.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::Sma(_) | Self::Ema(_) | Self::Apo(_) => <Decimal as Record>::FIELDS,
            Self::Macd(_) => <crate::indicators::MacdOutput as Record>::FIELDS,
        }
    }

    /// See [`Indicator::calculate_index`].
    pub fn calculate_index(&mut self, rows: &dyn InputRows, index: usize) -> IndicatorResult<()> {
        dispatch!(self, indicator => indicator.calculate_index(rows, index))
    }

    /// See [`Indicator::calculate`].
    pub fn calculate(&mut self, rows: &dyn InputRows) -> IndicatorResult<()> {
        dispatch!(self, indicator => indicator.calculate(rows))
    }

    /// See [`Indicator::reset`].
    pub fn reset(&mut self) {
        dispatch!(self, indicator => indicator.reset())
    }

    /// Number of calculated slots.
    pub fn len(&self) -> usize {
        dispatch!(self, indicator => indicator.output().len())
    }

    /// Returns `true` before the first calculation.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field `field` of the reading at `index`; absent readings and unknown fields yield `None`.
    pub fn field_at(&self, index: usize, field: &str) -> Option<Decimal> {
        dispatch!(self, indicator => indicator.reading_at(index)?.field(field))
    }

    /// Every field of the reading at `index`, in display order.
    pub fn fields_at(&self, index: usize) -> Vec<(&'static str, Option<Decimal>)> {
        self.fields()
            .iter()
            .map(|field| (*field, self.field_at(index, field)))
            .collect()
    }
}
