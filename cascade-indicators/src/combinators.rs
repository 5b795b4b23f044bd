//! Combinators that allow indicators to be chained together.

use cascade_core::InputRows;
use rust_decimal::Decimal;

use crate::composition::{Children, Handle, Initialiser, IntoIndicator};
use crate::core::{Indicator, IndicatorResult};
use crate::series::Series;
use crate::source::Source;

/// Chains two indicators together, feeding the output of the first into the second.
///
/// Both stages are sub-indicators, registered first-then-second, so the first is
/// always advanced before the second reads it. The piped indicator is named
/// after its second stage, whose name already mentions the first.
#[derive(Debug)]
pub struct PipedIndicator<First, Second>
where
    First: Indicator<Output = Decimal>,
    Second: Indicator,
{
    name: String,
    series: Series<Second::Output>,
    children: Children,
    first: Handle<First>,
    second: Handle<Second>,
}

impl<First, Second> PipedIndicator<First, Second>
where
    First: Indicator<Output = Decimal> + 'static,
    Second: Indicator + 'static,
{
    /// Creates a piped indicator; `second` receives a source reading `first`.
    pub fn new<A, B>(first: A, second: impl FnOnce(Source) -> B) -> IndicatorResult<Self>
    where
        A: IntoIndicator<Indicator = First>,
        B: IntoIndicator<Indicator = Second>,
    {
        let mut init = Initialiser::new("PIPE");
        let first = init.add_sub_indicator(first)?;
        let second = init.add_sub_indicator(second(first.source()))?;
        let name = second.name().to_string();
        Ok(Self {
            series: Series::new(name.as_str()),
            name,
            children: init.finish(),
            first,
            second,
        })
    }

    /// First stage.
    pub fn first(&self) -> &Handle<First> {
        &self.first
    }

    /// Second stage.
    pub fn second(&self) -> &Handle<Second> {
        &self.second
    }
}

impl<First, Second> Indicator for PipedIndicator<First, Second>
where
    First: Indicator<Output = Decimal>,
    Second: Indicator,
{
    type Output = Second::Output;

    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> &Series<Self::Output> {
        &self.series
    }

    fn children(&self) -> Option<&Children> {
        Some(&self.children)
    }

    fn calculate_reading(
        &mut self,
        _rows: &dyn InputRows,
        index: usize,
    ) -> IndicatorResult<Option<Self::Output>> {
        Ok(self.second.reading_at(index))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::indicators::{EmaConfig, SmaConfig};
    use crate::test_util::closes;

    #[test]
    fn second_stage_reads_first_stage_output() {
        let rows = closes(&[1, 2, 3, 4, 5]);
        let mut piped =
            PipedIndicator::new(SmaConfig::new(2), |source| SmaConfig::new(2).with_source(source))
                .unwrap();
        piped.calculate(&rows).unwrap();
        assert_eq!(piped.name(), "SMA_2_SMA_2");
        // first stage ready at 1, second stage needs one more reading
        assert_eq!(piped.reading_at(1), None);
        assert_eq!(piped.reading_at(2), Some(dec!(2)));
        assert_eq!(piped.reading(), Some(dec!(4)));
        assert_eq!(piped.first().reading(), Some(dec!(4.5)));
    }

    #[test]
    fn warmup_lengths_add_up() {
        let rows = closes(&[3, 3, 3, 3, 3, 3, 3]);
        let mut piped =
            PipedIndicator::new(EmaConfig::new(3), |source| EmaConfig::new(3).with_source(source))
                .unwrap();
        piped.calculate(&rows).unwrap();
        assert_eq!(piped.reading_at(3), None);
        assert_eq!(piped.reading_at(4), Some(dec!(3)));
        assert_eq!(piped.reading_count(), 3);
    }

    #[test]
    fn reset_clears_both_stages() {
        let rows = closes(&[1, 2, 3]);
        let mut piped =
            PipedIndicator::new(SmaConfig::new(1), |source| SmaConfig::new(1).with_source(source))
                .unwrap();
        piped.calculate(&rows).unwrap();
        piped.reset();
        assert!(piped.first().is_empty());
        assert!(piped.second().is_empty());
    }
}
