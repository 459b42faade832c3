//! Statistics and binning for paired `(value, position)` series.
//!
//! This crate provides three building blocks:
//!
//! - **Series statistics**: an immutable paired series whose derived statistics
//!   (sorted and unique values, inflection count, mean and spread) are computed
//!   lazily and memoized
//! - **Series aggregation**: an append-only collection that tracks running
//!   extrema over its members and builds a concatenated series on demand
//! - **Alignment-aware binning**: a fixed-shape 2-D occurrence histogram that
//!   places series elements by index from the start or end, anchored at an
//!   extremum, or by the paired position
//!
//! # Modules
//!
//! - [`numeric`]: the [`Numeric`] bound for element types
//! - [`series`]: [`NumericSeries`] and its trait vector [`SeriesSummary`]
//! - [`collection`]: [`SeriesCollection`] and [`CollectionSummary`]
//! - [`grid`]: [`HistogramGrid`] and the [`Alignment`] policies
//!
//! # Examples
//!
//! ## Summarizing a series
//!
//! ```
//! use seriesgram_stats::{Basis, NumericSeries};
//!
//! let series = NumericSeries::new(vec![1, 2, 3, 4, 3, 5, 1], vec![1, 2, 3, 4, 5, 6, 7]).unwrap();
//! assert_eq!(series.unique_values(), &[1, 2, 3, 4, 5]);
//! assert_eq!(series.inflection_count(), 3);
//! assert!((series.mean(Basis::All) - 19.0 / 7.0).abs() < 1e-12);
//! ```
//!
//! ## Pooling series
//!
//! ```
//! use seriesgram_stats::{NumericSeries, SeriesCollection};
//!
//! let mut collection = SeriesCollection::new();
//! collection.append(NumericSeries::new(vec![3, 1], vec![0, 1]).unwrap());
//! collection.append(NumericSeries::new(vec![7, 2, 5], vec![0, 1, 2]).unwrap());
//!
//! let summary = collection.summary().unwrap();
//! assert_eq!((summary.max_length, summary.min_length), (3, 2));
//! assert_eq!((summary.max_value, summary.min_value), (7, 1));
//! ```
//!
//! ## Binning series
//!
//! ```
//! use seriesgram_stats::{Alignment, HistogramGrid, NumericSeries};
//!
//! let mut grid = HistogramGrid::new(4, 4, 0.0, 4.0, 0.0, 4.0).unwrap();
//! let series = NumericSeries::new(vec![1, 2, 3], vec![0, 1, 3]).unwrap();
//! grid.add_series(&series, Alignment::ByX).unwrap();
//! assert_eq!(grid.count(3, 3), Some(1));
//! assert_eq!(grid.total(), 3);
//! ```

pub use self::{
    collection::{CollectionSummary, SeriesCollection},
    grid::{Alignment, Axis, GridError, HistogramGrid, ParseAlignmentError, RangePolicy},
    numeric::Numeric,
    series::{Basis, EMPTY_STATISTIC, NumericSeries, SeriesError, SeriesSummary},
};

pub mod collection;
pub mod grid;
pub mod numeric;
pub mod series;

mod render;
