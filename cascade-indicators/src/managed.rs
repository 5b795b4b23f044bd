//! Externally written series exposed as an indicator.

use cascade_core::InputRows;
use rust_decimal::Decimal;

use crate::composition::IntoIndicator;
use crate::core::{Indicator, IndicatorResult};
use crate::series::Series;

/// An indicator whose readings are written by its owner instead of a formula.
///
/// Composites use it to publish an intermediate quantity, such as the raw MACD
/// line, so further sub-indicators can take it as their source.
#[derive(Debug)]
pub struct Managed {
    name: String,
    series: Series<Decimal>,
}

impl Managed {
    /// Creates an empty managed series.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            series: Series::new(name.as_str()),
            name,
        }
    }

    /// Writes the reading at `index`.
    pub fn set_reading(&self, index: usize, value: Option<Decimal>) -> IndicatorResult<()> {
        self.series.set(index, value)
    }
}

impl Indicator for Managed {
    type Output = Decimal;

    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> &Series<Decimal> {
        &self.series
    }

    fn calculate_reading(
        &mut self,
        _rows: &dyn InputRows,
        index: usize,
    ) -> IndicatorResult<Option<Decimal>> {
        Ok(self.series.get(index))
    }
}

impl IntoIndicator for Managed {
    type Indicator = Self;

    fn into_indicator(self) -> IndicatorResult<Self> {
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::Managed;
    use crate::test_util::closes;
    use crate::Indicator;

    #[test]
    fn stores_what_the_owner_writes() {
        let managed = Managed::new("line");
        managed.set_reading(0, None).unwrap();
        managed.set_reading(1, Some(dec!(0.25))).unwrap();
        assert_eq!(managed.reading(), Some(dec!(0.25)));
        assert_eq!(managed.reading_at(0), None);
        assert_eq!(managed.reading_count(), 1);
    }

    #[test]
    fn calculation_passes_the_stored_value_through() {
        let rows = closes(&[1, 2]);
        let mut managed = Managed::new("line");
        managed.set_reading(1, Some(dec!(3))).unwrap();
        managed.calculate_index(&rows, 1).unwrap();
        assert_eq!(managed.reading_at(1), Some(dec!(3)));
        assert_eq!(managed.output().len(), 2);
    }
}
