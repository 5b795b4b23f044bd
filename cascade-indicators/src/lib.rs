#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

//! Composable technical indicators with index-by-index, incremental calculation.

/// Indicator composition helpers such as `PipedIndicator`.
pub mod combinators;
/// Registration and calculation of a composite's children.
pub mod composition;
/// Declarative configuration and the runtime indicator factory.
pub mod config;
/// Foundational traits and shared abstractions.
pub mod core;
/// Built-in indicator implementations.
pub mod indicators;
/// Externally written series.
pub mod managed;
/// Reading storage.
pub mod series;
/// Calculation inputs.
pub mod source;

#[cfg(test)]
mod test_util;

/// Re-export of the piped indicator combinator for convenience.
pub use crate::combinators::PipedIndicator;
/// Re-export of the composition types used to build composites.
pub use crate::composition::{Children, Handle, Initialiser, IntoIndicator, Node};
/// Re-export of the configuration entry points.
pub use crate::config::{AnyIndicator, IndicatorConfig};
/// Re-export of the core traits and error type to make the crate easy to consume.
pub use crate::core::{indicator_name, Indicator, IndicatorError, IndicatorResult, Record};
/// Re-export of the managed series.
pub use crate::managed::Managed;
/// Re-export of the reading store.
pub use crate::series::{Series, SeriesReader};
/// Re-export of the source resolver.
pub use crate::source::{SeriesRef, Source, ValueSeries};
