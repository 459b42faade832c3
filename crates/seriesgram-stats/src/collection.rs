//! Append-only pool of series with running extrema.

use std::{fmt, io, slice, sync::OnceLock};

use serde::Serialize;
use tracing::debug;

use crate::{
    numeric::Numeric,
    series::{NumericSeries, SeriesError},
};

/// An ordered, append-only collection of [`NumericSeries`].
///
/// Length bounds and value/position extrema are updated on every append. The
/// concatenation of all members is built on demand and cached until the next
/// append.
///
/// # Examples
///
/// ```
/// use seriesgram_stats::{Basis, NumericSeries, SeriesCollection};
///
/// let collection = [
///     NumericSeries::new(vec![1, 2], vec![0, 1]).unwrap(),
///     NumericSeries::new(vec![6], vec![4]).unwrap(),
/// ]
/// .into_iter()
/// .collect::<SeriesCollection<_>>();
///
/// let all = collection.concatenate().unwrap();
/// assert_eq!(all.values(), &[1, 2, 6]);
/// assert_eq!(all.positions(), &[0, 1, 4]);
/// assert_eq!(all.mean(Basis::All), 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct SeriesCollection<T> {
    series: Vec<NumericSeries<T>>,
    bounds: Option<RunningBounds<T>>,
    concatenated: OnceLock<NumericSeries<T>>,
}

#[derive(Debug, Clone, Copy)]
struct RunningBounds<T> {
    max_length: usize,
    min_length: usize,
    max_value: T,
    min_value: T,
    max_position: T,
    min_position: T,
}

impl<T> RunningBounds<T>
where
    T: Numeric,
{
    fn of(series: &NumericSeries<T>) -> Self {
        Self {
            max_length: series.len(),
            min_length: series.len(),
            max_value: series.max_value(),
            min_value: series.min_value(),
            max_position: series.max_position(),
            min_position: series.min_position(),
        }
    }

    fn absorb(&mut self, series: &NumericSeries<T>) {
        fn keep_max<T: PartialOrd>(current: &mut T, candidate: T) {
            if candidate > *current {
                *current = candidate;
            }
        }
        fn keep_min<T: PartialOrd>(current: &mut T, candidate: T) {
            if candidate < *current {
                *current = candidate;
            }
        }

        keep_max(&mut self.max_length, series.len());
        keep_min(&mut self.min_length, series.len());
        keep_max(&mut self.max_value, series.max_value());
        keep_min(&mut self.min_value, series.min_value());
        keep_max(&mut self.max_position, series.max_position());
        keep_min(&mut self.min_position, series.min_position());
    }
}

impl<T> Default for SeriesCollection<T> {
    fn default() -> Self {
        Self {
            series: Vec::new(),
            bounds: None,
            concatenated: OnceLock::new(),
        }
    }
}

impl<T> SeriesCollection<T>
where
    T: Numeric,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection holding `series` in order.
    #[must_use]
    pub fn from_series(series: Vec<NumericSeries<T>>) -> Self {
        series.into_iter().collect()
    }

    /// Appends `series`, updates the running bounds and drops any cached
    /// concatenation.
    pub fn append(&mut self, series: NumericSeries<T>) {
        match &mut self.bounds {
            Some(bounds) => bounds.absorb(&series),
            None => self.bounds = Some(RunningBounds::of(&series)),
        }
        self.series.push(series);
        self.concatenated.take();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    #[must_use]
    pub fn series(&self) -> &[NumericSeries<T>] {
        &self.series
    }

    pub fn iter(&self) -> slice::Iter<'_, NumericSeries<T>> {
        self.series.iter()
    }

    #[must_use]
    pub fn max_length(&self) -> Option<usize> {
        self.bounds.map(|b| b.max_length)
    }

    #[must_use]
    pub fn min_length(&self) -> Option<usize> {
        self.bounds.map(|b| b.min_length)
    }

    #[must_use]
    pub fn max_value(&self) -> Option<T> {
        self.bounds.map(|b| b.max_value)
    }

    #[must_use]
    pub fn min_value(&self) -> Option<T> {
        self.bounds.map(|b| b.min_value)
    }

    #[must_use]
    pub fn max_position(&self) -> Option<T> {
        self.bounds.map(|b| b.max_position)
    }

    #[must_use]
    pub fn min_position(&self) -> Option<T> {
        self.bounds.map(|b| b.min_position)
    }

    /// Returns one series holding every member's values and positions, in
    /// append order.
    ///
    /// The result is cached; calls without an intervening
    /// [`append`](Self::append) return the same series.
    ///
    /// # Errors
    ///
    /// [`SeriesError::EmptyInput`] if the collection has no members.
    pub fn concatenate(&self) -> Result<&NumericSeries<T>, SeriesError> {
        if let Some(concatenated) = self.concatenated.get() {
            return Ok(concatenated);
        }

        let total = self.series.iter().map(NumericSeries::len).sum();
        let mut values = Vec::with_capacity(total);
        let mut positions = Vec::with_capacity(total);
        for series in &self.series {
            values.extend_from_slice(series.values());
            positions.extend_from_slice(series.positions());
        }
        let concatenated = NumericSeries::new(values, positions)?;
        debug!(
            members = self.series.len(),
            length = total,
            "built concatenated series"
        );
        Ok(self.concatenated.get_or_init(|| concatenated))
    }

    /// Aggregate extrema of the collection.
    ///
    /// Length bounds come from the running bounds; value and position extrema
    /// are read from the concatenated series.
    ///
    /// # Errors
    ///
    /// [`SeriesError::EmptyInput`] if the collection has no members.
    pub fn summary(&self) -> Result<CollectionSummary<T>, SeriesError> {
        let concatenated = self.concatenate()?;
        let bounds = self.bounds.ok_or(SeriesError::EmptyInput)?;
        Ok(CollectionSummary {
            max_length: bounds.max_length,
            min_length: bounds.min_length,
            max_value: concatenated.max_value(),
            min_value: concatenated.min_value(),
            max_position: concatenated.max_position(),
            min_position: concatenated.min_position(),
        })
    }

    /// Renders every member in order.
    pub fn render<W>(&self, sink: &mut W) -> io::Result<()>
    where
        W: io::Write + ?Sized,
    {
        for series in &self.series {
            series.render(sink)?;
        }
        Ok(())
    }
}

impl<T> FromIterator<NumericSeries<T>> for SeriesCollection<T>
where
    T: Numeric,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = NumericSeries<T>>,
    {
        let mut collection = Self::new();
        collection.extend(iter);
        collection
    }
}

impl<T> Extend<NumericSeries<T>> for SeriesCollection<T>
where
    T: Numeric,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = NumericSeries<T>>,
    {
        for series in iter {
            self.append(series);
        }
    }
}

impl<'a, T> IntoIterator for &'a SeriesCollection<T> {
    type Item = &'a NumericSeries<T>;
    type IntoIter = slice::Iter<'a, NumericSeries<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}

/// Aggregate extrema of a [`SeriesCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionSummary<T> {
    pub max_length: usize,
    pub min_length: usize,
    pub max_value: T,
    pub min_value: T,
    pub max_position: T,
    pub min_position: T,
}

impl<T> CollectionSummary<T>
where
    T: Numeric,
{
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.max_length as f64,
            self.min_length as f64,
            self.max_value.as_f64(),
            self.min_value.as_f64(),
            self.max_position.as_f64(),
            self.min_position.as_f64(),
        ]
    }
}

impl<T> fmt::Display for CollectionSummary<T>
where
    T: Numeric,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.to_array().iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::series::Basis;

    fn series(values: &[i32], positions: &[i32]) -> NumericSeries<i32> {
        NumericSeries::new(values.to_vec(), positions.to_vec()).unwrap()
    }

    #[test]
    fn test_empty_collection() {
        let collection = SeriesCollection::<i32>::new();
        assert!(collection.is_empty());
        assert_eq!(collection.max_length(), None);
        assert_eq!(collection.min_value(), None);
        assert_eq!(collection.concatenate().unwrap_err(), SeriesError::EmptyInput);
        assert_eq!(collection.summary().unwrap_err(), SeriesError::EmptyInput);
    }

    #[test]
    fn test_running_bounds() {
        let mut collection = SeriesCollection::new();
        collection.append(series(&[5, 3, 8], &[10, 11, 12]));
        assert_eq!(collection.max_length(), Some(3));
        assert_eq!(collection.min_length(), Some(3));

        collection.append(series(&[-2], &[40]));
        collection.append(series(&[1, 9, 0, 4], &[-3, 0, 1, 2]));
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.max_length(), Some(4));
        assert_eq!(collection.min_length(), Some(1));
        assert_eq!(collection.max_value(), Some(9));
        assert_eq!(collection.min_value(), Some(-2));
        assert_eq!(collection.max_position(), Some(40));
        assert_eq!(collection.min_position(), Some(-3));
    }

    #[test]
    fn test_summary_matches_running_bounds() {
        let collection = SeriesCollection::from_series(vec![
            series(&[5, 3, 8], &[10, 11, 12]),
            series(&[-2], &[40]),
            series(&[1, 9, 0, 4], &[-3, 0, 1, 2]),
        ]);
        let summary = collection.summary().unwrap();
        assert_eq!(
            summary,
            CollectionSummary {
                max_length: 4,
                min_length: 1,
                max_value: 9,
                min_value: -2,
                max_position: 40,
                min_position: -3,
            }
        );
        assert_eq!(summary.to_string(), "4,1,9,-2,40,-3");
    }

    #[test]
    fn test_concatenate_is_cached() {
        let collection = SeriesCollection::from_series(vec![
            series(&[1, 2], &[1, 2]),
            series(&[3], &[3]),
        ]);
        let first = collection.concatenate().unwrap();
        let second = collection.concatenate().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.values(), &[1, 2, 3]);
    }

    #[test]
    fn test_append_invalidates_concatenation() {
        let mut collection = SeriesCollection::new();
        collection.append(series(&[1, 2], &[1, 2]));
        assert_eq!(collection.concatenate().unwrap().len(), 2);

        collection.append(series(&[7, 8, 9], &[3, 4, 5]));
        let concatenated = collection.concatenate().unwrap();
        assert_eq!(concatenated.values(), &[1, 2, 7, 8, 9]);
        assert_eq!(concatenated.positions(), &[1, 2, 3, 4, 5]);
        assert_eq!(collection.summary().unwrap().max_value, 9);
    }

    #[test]
    fn test_render_members_in_order() {
        let collection = SeriesCollection::from_series(vec![
            series(&[1, 2], &[3, 4]),
            series(&[5], &[6]),
        ]);
        let mut out = Vec::new();
        collection.render(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Y values\n1, 2\nX values\n3, 4\nY values\n5\nX values\n6\n"
        );
    }

    #[test]
    fn test_iteration_order() {
        let collection: SeriesCollection<i32> =
            [series(&[1], &[0]), series(&[2], &[0]), series(&[3], &[0])]
                .into_iter()
                .collect();
        let firsts = collection.iter().map(|s| s.values()[0]).collect::<Vec<_>>();
        assert_eq!(firsts, [1, 2, 3]);
        assert_eq!((&collection).into_iter().count(), 3);
    }

    fn arb_series() -> impl Strategy<Value = NumericSeries<i64>> {
        prop::collection::vec((-1000i64..1000, -1000i64..1000), 1..16).prop_map(|pairs| {
            let (values, positions) = pairs.into_iter().unzip();
            NumericSeries::new(values, positions).unwrap()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_concatenated_mean_equals_flattened_mean(
            members in prop::collection::vec(arb_series(), 1..8),
        ) {
            let collection = members.iter().cloned().collect::<SeriesCollection<_>>();
            let flattened_values = members
                .iter()
                .flat_map(|s| s.values().iter().copied())
                .collect::<Vec<_>>();
            let flattened_positions = members
                .iter()
                .flat_map(|s| s.positions().iter().copied())
                .collect::<Vec<_>>();
            let flattened = NumericSeries::new(flattened_values, flattened_positions).unwrap();

            let concatenated = collection.concatenate().unwrap();
            prop_assert_eq!(concatenated.values(), flattened.values());
            prop_assert_eq!(
                concatenated.mean(Basis::All).to_bits(),
                flattened.mean(Basis::All).to_bits()
            );

            // integer sums are exact in f64, so append order cannot matter
            let reversed = members.iter().rev().cloned().collect::<SeriesCollection<_>>();
            prop_assert_eq!(
                reversed.concatenate().unwrap().mean(Basis::All).to_bits(),
                flattened.mean(Basis::All).to_bits()
            );
        }

        #[test]
        fn prop_summary_extrema_independent_of_order(
            members in prop::collection::vec(arb_series(), 1..8),
        ) {
            let forward = members.iter().cloned().collect::<SeriesCollection<_>>();
            let backward = members.iter().rev().cloned().collect::<SeriesCollection<_>>();
            prop_assert_eq!(forward.summary().unwrap(), backward.summary().unwrap());
            prop_assert_eq!(forward.max_value(), Some(forward.summary().unwrap().max_value));
        }
    }
}
