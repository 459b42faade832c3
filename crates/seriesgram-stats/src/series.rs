//! Immutable paired series with lazily memoized statistics.

use std::{cmp::Ordering, fmt, io, sync::OnceLock};

use serde::Serialize;

use crate::{
    numeric::{self, Numeric},
    render,
};

/// Value returned by [`NumericSeries::mean`] and [`NumericSeries::variance`]
/// when the selected basis holds no values.
pub const EMPTY_STATISTIC: f64 = -999.0;

/// Reasons a [`NumericSeries`] cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SeriesError {
    #[display("series needs at least one value and one position")]
    EmptyInput,
    #[display("series has {values} values but {positions} positions")]
    LengthMismatch { values: usize, positions: usize },
}

/// Which value set a statistic is computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Basis {
    /// Every value of the series, duplicates included.
    #[default]
    All,
    /// The sorted, deduplicated values of the series.
    UniqueOnly,
}

/// A paired sequence of values and positions, e.g. a ranking over time.
///
/// The series is immutable once built. Minimum and maximum of both sequences
/// are computed eagerly; everything else is computed on first access and
/// cached, so repeated calls return the same data.
///
/// # Examples
///
/// ```
/// use seriesgram_stats::{NumericSeries, SeriesError};
///
/// let series = NumericSeries::new(vec![4, 1, 4, 2], vec![10, 11, 12, 13]).unwrap();
/// assert_eq!(series.len(), 4);
/// assert_eq!(series.sorted_values(), &[1, 2, 4, 4]);
/// assert_eq!(series.unique_count(), 3);
///
/// let err = NumericSeries::new(vec![1, 2, 3, 4], vec![1, 2, 3]).unwrap_err();
/// assert_eq!(err, SeriesError::LengthMismatch { values: 4, positions: 3 });
/// ```
#[derive(Debug, Clone)]
#[allow(clippy::len_without_is_empty)]
pub struct NumericSeries<T> {
    values: Vec<T>,
    positions: Vec<T>,
    min_value: T,
    max_value: T,
    min_position: T,
    max_position: T,
    sorted: OnceLock<Vec<T>>,
    unique: OnceLock<Vec<T>>,
    inflections: OnceLock<usize>,
    all_moments: OnceLock<Moments>,
    unique_moments: OnceLock<Moments>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Moments {
    mean: f64,
    spread: f64,
}

impl Moments {
    const EMPTY: Self = Self {
        mean: EMPTY_STATISTIC,
        spread: EMPTY_STATISTIC,
    };

    /// Mean and population variance, `sum((v - mean)^2) / n`.
    #[expect(clippy::cast_precision_loss)]
    fn population<T>(values: &[T]) -> Self
    where
        T: Numeric,
    {
        if values.is_empty() {
            return Self::EMPTY;
        }
        let n = values.len() as f64;
        let mean = values.iter().map(|v| v.as_f64()).sum::<f64>() / n;
        let spread = values
            .iter()
            .map(|v| (v.as_f64() - mean).powi(2))
            .sum::<f64>()
            / n;
        Self { mean, spread }
    }

    /// Mean and `sqrt(sum(v^2) / n - mean^2)`.
    #[expect(clippy::cast_precision_loss)]
    fn rooted<T>(values: &[T]) -> Self
    where
        T: Numeric,
    {
        if values.is_empty() {
            return Self::EMPTY;
        }
        let n = values.len() as f64;
        let mean = values.iter().map(|v| v.as_f64()).sum::<f64>() / n;
        let square_sum = values.iter().map(|v| v.as_f64().powi(2)).sum::<f64>();
        let spread = (square_sum / n - mean * mean).sqrt();
        Self { mean, spread }
    }
}

impl<T> NumericSeries<T>
where
    T: Numeric,
{
    /// Builds a series from values and their paired positions.
    ///
    /// # Errors
    ///
    /// * [`SeriesError::EmptyInput`] if either sequence is empty
    /// * [`SeriesError::LengthMismatch`] if the sequences differ in length
    pub fn new(values: Vec<T>, positions: Vec<T>) -> Result<Self, SeriesError> {
        let (min_value, max_value) = numeric::extrema(&values).ok_or(SeriesError::EmptyInput)?;
        let (min_position, max_position) =
            numeric::extrema(&positions).ok_or(SeriesError::EmptyInput)?;
        if values.len() != positions.len() {
            return Err(SeriesError::LengthMismatch {
                values: values.len(),
                positions: positions.len(),
            });
        }

        Ok(Self {
            values,
            positions,
            min_value,
            max_value,
            min_position,
            max_position,
            sorted: OnceLock::new(),
            unique: OnceLock::new(),
            inflections: OnceLock::new(),
            all_moments: OnceLock::new(),
            unique_moments: OnceLock::new(),
        })
    }

    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[must_use]
    pub fn positions(&self) -> &[T] {
        &self.positions
    }

    /// Number of `(value, position)` pairs. Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn min_value(&self) -> T {
        self.min_value
    }

    #[must_use]
    pub fn max_value(&self) -> T {
        self.max_value
    }

    #[must_use]
    pub fn min_position(&self) -> T {
        self.min_position
    }

    #[must_use]
    pub fn max_position(&self) -> T {
        self.max_position
    }

    /// Values in ascending order.
    ///
    /// The sort is stable; incomparable values (NaN) are treated as equal to
    /// their neighbours.
    #[must_use]
    pub fn sorted_values(&self) -> &[T] {
        self.sorted.get_or_init(|| {
            let mut sorted = self.values.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            sorted
        })
    }

    /// Sorted values with adjacent duplicates removed.
    ///
    /// Duplicates are detected with exact equality, so floating-point values
    /// that differ by rounding error stay distinct.
    #[must_use]
    pub fn unique_values(&self) -> &[T] {
        self.unique.get_or_init(|| {
            let mut unique = self.sorted_values().to_vec();
            unique.dedup();
            unique
        })
    }

    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.unique_values().len()
    }

    /// Number of direction changes in the series.
    ///
    /// The differences are taken over `values[1..]`, with the first retained
    /// value kept as is. Each adjacent pair of differences whose signs
    /// disagree (negative vs. non-negative) counts as one change. Positions
    /// are not consulted.
    ///
    /// ```
    /// use seriesgram_stats::NumericSeries;
    ///
    /// let series = NumericSeries::new(vec![1, 2, 3, 4, 3, 5, 1], vec![0; 7]).unwrap();
    /// assert_eq!(series.inflection_count(), 3);
    /// ```
    #[must_use]
    pub fn inflection_count(&self) -> usize {
        *self.inflections.get_or_init(|| {
            let tail = &self.values[1..];
            // A difference is negative exactly when the value falls. Comparing
            // instead of subtracting keeps unsigned types from underflowing.
            let falls = tail
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    if i == 0 {
                        v < T::zero()
                    } else {
                        v < tail[i - 1]
                    }
                })
                .collect::<Vec<_>>();
            falls.windows(2).filter(|w| w[0] != w[1]).count()
        })
    }

    fn moments(&self, basis: Basis) -> Moments {
        match basis {
            Basis::All => *self
                .all_moments
                .get_or_init(|| Moments::population(&self.values)),
            Basis::UniqueOnly => *self
                .unique_moments
                .get_or_init(|| Moments::rooted(self.unique_values())),
        }
    }

    /// Arithmetic mean over the selected basis.
    ///
    /// Returns [`EMPTY_STATISTIC`] if the basis holds no values.
    #[must_use]
    pub fn mean(&self, basis: Basis) -> f64 {
        self.moments(basis).mean
    }

    /// Spread over the selected basis.
    ///
    /// The two bases use different formulas:
    ///
    /// * [`Basis::All`]: population variance, `sum((v - mean)^2) / n`. No
    ///   square root is taken.
    /// * [`Basis::UniqueOnly`]: `sqrt(sum(u^2) / n - mean^2)` over the unique
    ///   values, i.e. a standard deviation.
    ///
    /// The trait vector ([`summary`](Self::summary)) carries the
    /// [`Basis::All`] form.
    ///
    /// Returns [`EMPTY_STATISTIC`] if the basis holds no values.
    ///
    /// ```
    /// use seriesgram_stats::{Basis, NumericSeries};
    ///
    /// let series = NumericSeries::new(vec![2, 4, 4, 4, 5, 5, 7, 9], vec![0; 8]).unwrap();
    /// assert_eq!(series.variance(Basis::All), 4.0);
    /// ```
    #[must_use]
    pub fn variance(&self, basis: Basis) -> f64 {
        self.moments(basis).spread
    }

    /// The trait vector of this series.
    #[must_use]
    pub fn summary(&self) -> SeriesSummary<T> {
        SeriesSummary {
            length: self.len(),
            min_value: self.min_value,
            max_value: self.max_value,
            min_position: self.min_position,
            max_position: self.max_position,
            inflection_count: self.inflection_count(),
            unique_count: self.unique_count(),
            mean: self.mean(Basis::All),
            variance: self.variance(Basis::All),
        }
    }

    /// Writes the values and then the positions, each after a marker line.
    pub fn render<W>(&self, sink: &mut W) -> io::Result<()>
    where
        W: io::Write + ?Sized,
    {
        writeln!(sink, "Y values")?;
        render::write_joined(sink, &self.values, ", ")?;
        writeln!(sink, "X values")?;
        render::write_joined(sink, &self.positions, ", ")
    }
}

/// Fixed nine-field statistical summary of one series.
///
/// `Display` writes the fields comma-separated in declaration order, which is
/// the line format of a trait report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSummary<T> {
    pub length: usize,
    pub min_value: T,
    pub max_value: T,
    pub min_position: T,
    pub max_position: T,
    pub inflection_count: usize,
    pub unique_count: usize,
    pub mean: f64,
    /// Population variance, see [`NumericSeries::variance`].
    pub variance: f64,
}

impl<T> SeriesSummary<T>
where
    T: Numeric,
{
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn to_array(&self) -> [f64; 9] {
        [
            self.length as f64,
            self.min_value.as_f64(),
            self.max_value.as_f64(),
            self.min_position.as_f64(),
            self.max_position.as_f64(),
            self.inflection_count as f64,
            self.unique_count as f64,
            self.mean,
            self.variance,
        ]
    }
}

impl<T> fmt::Display for SeriesSummary<T>
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
