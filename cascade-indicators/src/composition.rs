//! Registration and calculation of the indicators a composite is built from.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use cascade_core::InputRows;
use rust_decimal::Decimal;

use crate::core::{Indicator, IndicatorError, IndicatorResult, Record};
use crate::managed::Managed;
use crate::series::SeriesReader;
use crate::source::{SeriesRef, Source};

/// Anything that can be turned into a ready-to-calculate indicator.
///
/// Parameter configs implement this by validating themselves and initialising the
/// indicator they describe.
pub trait IntoIndicator {
    /// Indicator produced.
    type Indicator: Indicator + 'static;

    /// Validates the parameters and builds the indicator.
    fn into_indicator(self) -> IndicatorResult<Self::Indicator>;
}

/// Type-erased view of an indicator, used to drive children generically.
pub trait Node {
    /// Display name of the indicator.
    fn node_name(&self) -> &str;

    /// See [`Indicator::calculate_index`].
    fn calculate_node(&mut self, rows: &dyn InputRows, index: usize) -> IndicatorResult<()>;

    /// See [`Indicator::reset`].
    fn reset_node(&mut self);

    /// Number of calculated slots.
    fn calculated_len(&self) -> usize;
}

impl<I: Indicator> Node for I {
    fn node_name(&self) -> &str {
        self.name()
    }

    fn calculate_node(&mut self, rows: &dyn InputRows, index: usize) -> IndicatorResult<()> {
        self.calculate_index(rows, index)
    }

    fn reset_node(&mut self) {
        self.reset();
    }

    fn calculated_len(&self) -> usize {
        self.output().len()
    }
}

/// Shared handle to an indicator owned by a composite.
///
/// Readings go straight to the indicator's series, so they stay available while
/// the indicator itself is being calculated.
pub struct Handle<I: Indicator> {
    name: Rc<str>,
    inner: Rc<RefCell<I>>,
    readings: SeriesReader<I::Output>,
}

impl<I: Indicator> Handle<I> {
    /// Wraps an indicator so it can be shared between composites.
    pub fn new(indicator: I) -> Self {
        let name = Rc::from(indicator.name());
        let readings = indicator.output().reader();
        Self {
            name,
            inner: Rc::new(RefCell::new(indicator)),
            readings,
        }
    }

    /// Display name of the indicator.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latest reading.
    pub fn reading(&self) -> Option<I::Output> {
        self.readings.latest()
    }

    /// Reading at `index`.
    pub fn reading_at(&self, index: usize) -> Option<I::Output> {
        self.readings.get(index)
    }

    /// Read-only view over every reading.
    pub fn readings(&self) -> SeriesReader<I::Output> {
        self.readings.clone()
    }

    /// Number of calculated slots.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Returns `true` before the first calculation.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Calculates the indicator at `index`.
    pub fn calculate_index(&self, rows: &dyn InputRows, index: usize) -> IndicatorResult<()> {
        self.borrow_mut()?.calculate_index(rows, index)
    }

    /// Drops the indicator's readings.
    pub fn reset(&self) -> IndicatorResult<()> {
        self.borrow_mut()?.reset();
        Ok(())
    }

    /// Source reading one named field of every output.
    pub fn field_source(&self, field: &'static str) -> Source
    where
        I::Output: 'static,
    {
        Source::Indicator(SeriesRef::field(self.readings(), field))
    }

    /// Runs `f` against the indicator itself.
    pub fn with<R>(&self, f: impl FnOnce(&I) -> R) -> IndicatorResult<R> {
        let indicator = self
            .inner
            .try_borrow()
            .map_err(|_| IndicatorError::Reentrant {
                name: self.name.to_string(),
            })?;
        Ok(f(&indicator))
    }

    fn borrow_mut(&self) -> IndicatorResult<std::cell::RefMut<'_, I>> {
        self.inner
            .try_borrow_mut()
            .map_err(|_| IndicatorError::Reentrant {
                name: self.name.to_string(),
            })
    }

    fn node(&self) -> Rc<RefCell<dyn Node>>
    where
        I: 'static,
    {
        let node: Rc<RefCell<dyn Node>> = self.inner.clone();
        node
    }
}

impl<I> Handle<I>
where
    I: Indicator<Output = Decimal>,
{
    /// Source reading this indicator's values.
    pub fn source(&self) -> Source {
        Source::Indicator(SeriesRef::new(self.readings()))
    }
}

impl Handle<Managed> {
    /// Writes the managed series at `index`.
    pub fn set_reading(&self, index: usize, value: Option<Decimal>) -> IndicatorResult<()> {
        self.with(|managed| managed.set_reading(index, value))?
    }
}

impl<I: Indicator> Clone for Handle<I> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            inner: Rc::clone(&self.inner),
            readings: self.readings.clone(),
        }
    }
}

impl<I: Indicator> fmt::Debug for Handle<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("name", &self.name)
            .field("len", &self.readings.len())
            .finish()
    }
}

struct Child {
    name: Rc<str>,
    node: Rc<RefCell<dyn Node>>,
    // Adopted children belong to another owner too and survive our resets.
    owned: bool,
}

impl Child {
    fn new<I: Indicator + 'static>(handle: &Handle<I>, owned: bool) -> Self {
        Self {
            name: Rc::clone(&handle.name),
            node: handle.node(),
            owned,
        }
    }

    fn borrow_mut(&self) -> IndicatorResult<std::cell::RefMut<'_, dyn Node + 'static>> {
        self.node
            .try_borrow_mut()
            .map_err(|_| IndicatorError::Reentrant {
                name: self.name.to_string(),
            })
    }
}

/// Collects the children of a composite while it is being initialised.
///
/// Children can only be registered through an `Initialiser`, and
/// [`finish`](Initialiser::finish) consumes it, so the set is fixed once the
/// composite exists.
pub struct Initialiser {
    owner: String,
    sub_indicators: Vec<Child>,
    managed: Vec<Child>,
}

impl Initialiser {
    /// Starts initialising the composite called `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            sub_indicators: Vec::new(),
            managed: Vec::new(),
        }
    }

    /// Builds and registers a sub-indicator.
    ///
    /// Sub-indicators are advanced to the requested index before the owner's
    /// formula runs.
    pub fn add_sub_indicator<S: IntoIndicator>(
        &mut self,
        spec: S,
    ) -> IndicatorResult<Handle<S::Indicator>> {
        let handle = Handle::new(spec.into_indicator()?);
        self.register_sub_indicator(&handle, true);
        Ok(handle)
    }

    /// Registers an indicator that is already shared with other owners.
    ///
    /// An adopted sub-indicator is advanced like any other, but resetting this
    /// composite leaves its readings in place for the other owners.
    pub fn adopt_sub_indicator<I: Indicator + 'static>(&mut self, handle: &Handle<I>) {
        self.register_sub_indicator(handle, false);
    }

    fn register_sub_indicator<I: Indicator + 'static>(&mut self, handle: &Handle<I>, owned: bool) {
        tracing::debug!(
            indicator = self.owner.as_str(),
            child = handle.name(),
            owned,
            "registered sub-indicator"
        );
        self.sub_indicators.push(Child::new(handle, owned));
    }

    /// Builds and registers a managed indicator.
    ///
    /// Managed indicators are only calculated when the owner's formula asks for it.
    pub fn add_managed_indicator<S: IntoIndicator>(
        &mut self,
        spec: S,
    ) -> IndicatorResult<Handle<S::Indicator>> {
        let handle = Handle::new(spec.into_indicator()?);
        tracing::debug!(
            indicator = self.owner.as_str(),
            child = handle.name(),
            "registered managed indicator"
        );
        self.managed.push(Child::new(&handle, true));
        Ok(handle)
    }

    /// Ends initialisation.
    pub fn finish(self) -> Children {
        Children {
            sub_indicators: self.sub_indicators,
            managed: self.managed,
        }
    }
}

/// The fixed set of children owned by a composite.
pub struct Children {
    sub_indicators: Vec<Child>,
    managed: Vec<Child>,
}

impl Children {
    /// Advances every sub-indicator to `index`, in registration order.
    ///
    /// A sub-indicator shared with another owner may already be past `index`;
    /// its readings are reused as they are.
    pub fn calculate_sub_indicators(
        &self,
        rows: &dyn InputRows,
        index: usize,
    ) -> IndicatorResult<()> {
        for child in &self.sub_indicators {
            let mut node = child.borrow_mut()?;
            if node.calculated_len() > index + 1 {
                tracing::trace!(child = node.node_name(), index, "sub-indicator already ahead");
                continue;
            }
            node.calculate_node(rows, index)?;
        }
        Ok(())
    }

    /// Resets every owned sub-indicator and managed indicator.
    ///
    /// Adopted sub-indicators are skipped. A child that is busy calculating is
    /// skipped with a warning.
    pub fn reset(&self) {
        let owned = self
            .sub_indicators
            .iter()
            .chain(&self.managed)
            .filter(|child| child.owned);
        for child in owned {
            match child.borrow_mut() {
                Ok(mut node) => node.reset_node(),
                Err(err) => tracing::warn!(error = %err, "skipping reset of busy child"),
            }
        }
    }

    /// Names of the sub-indicators, in registration order.
    pub fn sub_indicator_names(&self) -> Vec<&str> {
        self.sub_indicators.iter().map(|child| &*child.name).collect()
    }

    /// Names of the managed indicators, in registration order.
    pub fn managed_names(&self) -> Vec<&str> {
        self.managed.iter().map(|child| &*child.name).collect()
    }
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Children")
            .field("sub_indicators", &self.sub_indicator_names())
            .field("managed", &self.managed_names())
            .finish()
    }
}

/// Convenience for reading a single field out of any handle's output.
pub fn field_at<I: Indicator>(handle: &Handle<I>, index: usize, field: &str) -> Option<Decimal> {
    handle.reading_at(index)?.field(field)
}
