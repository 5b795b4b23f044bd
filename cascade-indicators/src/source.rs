//! Resolution of calculation inputs: raw row fields or other indicators' readings.

use std::fmt;
use std::rc::Rc;

use cascade_core::{fields, InputRows};
use rust_decimal::Decimal;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{IndicatorError, IndicatorResult, Record};
use crate::series::SeriesReader;

/// Numeric, index-addressable readings that can feed a calculation.
pub trait ValueSeries {
    /// Name used when describing the source.
    fn label(&self) -> String;

    /// Value at `index`, `None` while it has not been produced.
    fn value_at(&self, index: usize) -> Option<Decimal>;
}

impl ValueSeries for SeriesReader<Decimal> {
    fn label(&self) -> String {
        self.name().to_string()
    }

    fn value_at(&self, index: usize) -> Option<Decimal> {
        self.get(index)
    }
}

/// One named field of a structured indicator output.
struct Projection<T> {
    reader: SeriesReader<T>,
    field: &'static str,
}

impl<T: Record> ValueSeries for Projection<T> {
    fn label(&self) -> String {
        format!("{}.{}", self.reader.name(), self.field)
    }

    fn value_at(&self, index: usize) -> Option<Decimal> {
        self.reader.get(index)?.field(self.field)
    }
}

/// Shared, read-only reference to another indicator's readings.
///
/// The reference does not own the indicator; it only keeps its storage alive.
#[derive(Clone)]
pub struct SeriesRef(Rc<dyn ValueSeries>);

impl SeriesRef {
    /// References a numeric series.
    pub fn new(reader: SeriesReader<Decimal>) -> Self {
        Self(Rc::new(reader))
    }

    /// References the `field` of every reading in a structured series.
    pub fn field<T: Record + 'static>(reader: SeriesReader<T>, field: &'static str) -> Self {
        Self(Rc::new(Projection { reader, field }))
    }

    /// Name of the referenced series.
    pub fn label(&self) -> String {
        self.0.label()
    }

    /// Value at `index`.
    pub fn value_at(&self, index: usize) -> Option<Decimal> {
        self.0.value_at(index)
    }
}

impl fmt::Debug for SeriesRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SeriesRef").field(&self.label()).finish()
    }
}

/// Where a calculation reads its input from.
#[derive(Clone, Debug)]
pub enum Source {
    /// A field of the input row, e.g. `close`.
    Field(String),
    /// The reading of another indicator at the same index.
    Indicator(SeriesRef),
}

impl Source {
    /// Raw input field source.
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Returns `true` for the conventional `close` field.
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Field(name) if name == fields::CLOSE)
    }

    /// Label used when deriving indicator names.
    pub fn label(&self) -> String {
        match self {
            Self::Field(name) => name.clone(),
            Self::Indicator(series) => series.label(),
        }
    }

    /// Value feeding a calculation at `index`.
    ///
    /// A missing raw field is a wiring error and fails; an indicator that has not
    /// produced a value yet resolves to `Ok(None)`.
    pub fn resolve(&self, rows: &dyn InputRows, index: usize) -> IndicatorResult<Option<Decimal>> {
        match self {
            Self::Field(name) => {
                let row = rows.row(index).ok_or(IndicatorError::IndexOutOfRange {
                    index,
                    len: rows.row_count(),
                })?;
                row.field(name)
                    .map(Some)
                    .ok_or_else(|| IndicatorError::MissingField {
                        field: name.clone(),
                        index,
                    })
            }
            Self::Indicator(series) => Ok(series.value_at(index)),
        }
    }

    /// The `period` values ending at `index`, oldest first.
    ///
    /// `None` when fewer than `period` rows precede `index` or any value in the
    /// window is absent.
    pub fn window(
        &self,
        rows: &dyn InputRows,
        index: usize,
        period: usize,
    ) -> IndicatorResult<Option<Vec<Decimal>>> {
        if period == 0 || index + 1 < period {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(period);
        for position in index + 1 - period..=index {
            match self.resolve(rows, position)? {
                Some(value) => values.push(value),
                None => return Ok(None),
            }
        }
        Ok(Some(values))
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::field(fields::CLOSE)
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Field(lhs), Self::Field(rhs)) => lhs == rhs,
            (Self::Indicator(lhs), Self::Indicator(rhs)) => Rc::ptr_eq(&lhs.0, &rhs.0),
            _ => false,
        }
    }
}

impl From<&str> for Source {
    fn from(name: &str) -> Self {
        Self::field(name)
    }
}

impl From<String> for Source {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<SeriesRef> for Source {
    fn from(series: SeriesRef) -> Self {
        Self::Indicator(series)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// Declarative configs can only name raw fields; indicator references are wired in code.
impl Serialize for Source {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Field(name) => serializer.serialize_str(name),
            Self::Indicator(series) => Err(S::Error::custom(format!(
                "indicator source `{}` cannot be serialized",
                series.label()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::Field)
    }
}
