//! Two-dimensional occurrence histogram over many series.
//!
//! A [`HistogramGrid`] partitions `[x_min, x_max] x [y_min, y_max]` into
//! uniform cells and counts how many series elements land in each cell. The
//! y coordinate of an element is always its value; the x coordinate depends
//! on the [`Alignment`]:
//!
//! | Alignment | x coordinate | order |
//! |---|---|---|
//! | [`Front`](Alignment::Front) | `0, 1, 2, ...` | forward |
//! | [`Back`](Alignment::Back) | `y_bins - 1, y_bins - 2, ...` | reversed |
//! | [`AtMax`](Alignment::AtMax) | `y_bins / 2 - first_index(max) + i` | forward |
//! | [`AtMin`](Alignment::AtMin) | `y_bins / 2 - first_index(min) + i` | forward |
//! | [`ByX`](Alignment::ByX) | `positions[i]` | forward |
//!
//! Every alignment except `ByX` ignores the series' positions, so series of
//! different scales can be compared by shape.

use std::{fmt, io, str::FromStr};

use serde::Serialize;
use tracing::{debug, warn};

use crate::{collection::SeriesCollection, numeric::Numeric, series::NumericSeries};

/// Policy mapping series elements to grid x coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    /// Aligned at the first element.
    #[display("front")]
    Front,
    /// Aligned at the last element.
    #[display("back")]
    Back,
    /// Aligned at the first occurrence of the maximum value.
    #[display("at-max")]
    AtMax,
    /// Aligned at the first occurrence of the minimum value.
    #[display("at-min")]
    AtMin,
    /// Placed by the paired position.
    #[display("by-x")]
    ByX,
}

impl Alignment {
    pub const ALL: [Self; 5] = [
        Self::Front,
        Self::Back,
        Self::AtMax,
        Self::AtMin,
        Self::ByX,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown alignment `{name}` (expected front, back, at-max, at-min or by-x)")]
pub struct ParseAlignmentError {
    pub name: String,
}

/// Parses alignment names, ignoring case and `-` / `_` separators.
///
/// ```
/// use seriesgram_stats::Alignment;
///
/// assert_eq!("by-x".parse(), Ok(Alignment::ByX));
/// assert_eq!("AtMax".parse(), Ok(Alignment::AtMax));
/// assert_eq!("at_min".parse(), Ok(Alignment::AtMin));
/// assert!("middle".parse::<Alignment>().is_err());
/// ```
impl FromStr for Alignment {
    type Err = ParseAlignmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn normalize(name: &str) -> String {
            name.chars()
                .filter(|c| !matches!(c, '-' | '_'))
                .map(|c| c.to_ascii_lowercase())
                .collect()
        }

        let wanted = normalize(s.trim());
        Self::ALL
            .into_iter()
            .find(|alignment| normalize(&alignment.to_string()) == wanted)
            .ok_or_else(|| ParseAlignmentError { name: s.to_owned() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Axis {
    #[display("x")]
    X,
    #[display("y")]
    Y,
}

/// What to do with a coordinate outside the grid range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RangePolicy {
    /// Fail the whole add operation; no cell is incremented.
    #[default]
    Reject,
    /// Count the element in the first or last bin of the axis.
    ///
    /// NaN coordinates are still rejected.
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
pub enum GridError {
    #[display("{axis} axis needs at least one bin")]
    InvalidBinCount { axis: Axis },
    #[display("{axis} axis range [{min}, {max}] is empty or not finite")]
    InvalidRange { axis: Axis, min: f64, max: f64 },
    #[display("{axis} coordinate {value} lies outside the grid")]
    OutOfRange { axis: Axis, value: f64 },
}

/// A fixed-shape matrix of occurrence counts, `y_bins` rows by `x_bins`
/// columns.
///
/// Bin edges are fixed at construction. Counts only change through the
/// `add_*` methods, each of which either applies all of its increments or
/// none of them.
///
/// # Examples
///
/// ```
/// use seriesgram_stats::{Alignment, HistogramGrid, NumericSeries};
///
/// let mut grid = HistogramGrid::new(4, 4, 0.0, 4.0, 0.0, 4.0).unwrap();
/// let series = NumericSeries::new(vec![1, 2, 3], vec![9, 9, 9]).unwrap();
///
/// grid.add_series(&series, Alignment::Front).unwrap();
/// assert_eq!(grid.count(1, 0), Some(1));
/// assert_eq!(grid.count(2, 1), Some(1));
/// assert_eq!(grid.count(3, 2), Some(1));
///
/// // positions 9 fall outside [0, 4]
/// assert!(grid.add_series(&series, Alignment::ByX).is_err());
/// assert_eq!(grid.total(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramGrid {
    x_bins: usize,
    y_bins: usize,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    x_edges: Vec<f64>,
    y_edges: Vec<f64>,
    #[serde(skip)]
    range_policy: RangePolicy,
    /// Row-major, `y_bins * x_bins` cells.
    counts: Vec<u64>,
}

impl Default for HistogramGrid {
    /// 26 x 28 bins over `[-0.1, 24] x [-0.1, 25.1]`: hours of a day against
    /// ranks 0 to 25.
    fn default() -> Self {
        Self::build(26, 28, -0.1, 24.0, -0.1, 25.1)
    }
}

impl HistogramGrid {
    /// Creates a grid with every count at zero.
    ///
    /// # Errors
    ///
    /// * [`GridError::InvalidBinCount`] if an axis has zero bins
    /// * [`GridError::InvalidRange`] if an axis minimum is not below its
    ///   maximum, or either is not finite
    pub fn new(
        x_bins: usize,
        y_bins: usize,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    ) -> Result<Self, GridError> {
        for (axis, bins, min, max) in [
            (Axis::X, x_bins, x_min, x_max),
            (Axis::Y, y_bins, y_min, y_max),
        ] {
            if bins == 0 {
                return Err(GridError::InvalidBinCount { axis });
            }
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(GridError::InvalidRange { axis, min, max });
            }
        }
        Ok(Self::build(x_bins, y_bins, x_min, x_max, y_min, y_max))
    }

    fn build(x_bins: usize, y_bins: usize, x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_bins,
            y_bins,
            x_min,
            x_max,
            y_min,
            y_max,
            x_edges: uniform_edges(x_min, x_max, x_bins),
            y_edges: uniform_edges(y_min, y_max, y_bins),
            range_policy: RangePolicy::default(),
            counts: vec![0; x_bins * y_bins],
        }
    }

    #[must_use]
    pub fn with_range_policy(mut self, range_policy: RangePolicy) -> Self {
        self.range_policy = range_policy;
        self
    }

    #[must_use]
    pub fn range_policy(&self) -> RangePolicy {
        self.range_policy
    }

    #[must_use]
    pub fn x_bins(&self) -> usize {
        self.x_bins
    }

    #[must_use]
    pub fn y_bins(&self) -> usize {
        self.y_bins
    }

    #[must_use]
    pub fn x_range(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    #[must_use]
    pub fn y_range(&self) -> (f64, f64) {
        (self.y_min, self.y_max)
    }

    #[must_use]
    pub fn x_edges(&self) -> &[f64] {
        &self.x_edges
    }

    #[must_use]
    pub fn y_edges(&self) -> &[f64] {
        &self.y_edges
    }

    /// Count at `row` (y bin) and `col` (x bin).
    #[must_use]
    pub fn count(&self, row: usize, col: usize) -> Option<u64> {
        (row < self.y_bins && col < self.x_bins).then(|| self.counts[row * self.x_bins + col])
    }

    /// Rows of the matrix, lowest y bin first.
    pub fn rows(&self) -> impl Iterator<Item = &[u64]> + '_ {
        self.counts.chunks_exact(self.x_bins)
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Index `k` of the bin with `edges[k] <= value < edges[k + 1]`.
    ///
    /// `edges` must be sorted ascending. A value equal to the last edge
    /// belongs to the last bin. Values outside `[edges[0], edges[last]]` and
    /// NaN have no bin.
    ///
    /// ```
    /// use seriesgram_stats::HistogramGrid;
    ///
    /// let edges = [0.0, 1.0, 2.0, 3.0];
    /// assert_eq!(HistogramGrid::bin_index(&edges, 0.0), Some(0));
    /// assert_eq!(HistogramGrid::bin_index(&edges, 1.0), Some(1));
    /// assert_eq!(HistogramGrid::bin_index(&edges, 2.5), Some(2));
    /// assert_eq!(HistogramGrid::bin_index(&edges, 3.0), Some(2));
    /// assert_eq!(HistogramGrid::bin_index(&edges, 3.5), None);
    /// assert_eq!(HistogramGrid::bin_index(&edges, -0.1), None);
    /// ```
    #[must_use]
    pub fn bin_index(edges: &[f64], value: f64) -> Option<usize> {
        let (&first, &last) = (edges.first()?, edges.last()?);
        if edges.len() < 2 || !(first..=last).contains(&value) {
            return None;
        }
        // last edge not exceeding `value`
        let k = edges.partition_point(|&edge| edge <= value) - 1;
        Some(k.min(edges.len() - 2))
    }

    fn resolve(&self, axis: Axis, value: f64) -> Result<usize, GridError> {
        let (edges, min) = match axis {
            Axis::X => (&self.x_edges, self.x_min),
            Axis::Y => (&self.y_edges, self.y_min),
        };
        if let Some(k) = Self::bin_index(edges, value) {
            return Ok(k);
        }
        match self.range_policy {
            RangePolicy::Clamp if !value.is_nan() => {
                let k = if value < min { 0 } else { edges.len() - 2 };
                debug!(%axis, value, bin = k, "clamped coordinate into grid");
                Ok(k)
            }
            _ => Err(GridError::OutOfRange { axis, value }),
        }
    }

    /// Flat cell indices for every element of `series`.
    fn cells<T>(&self, series: &NumericSeries<T>, alignment: Alignment) -> Result<Vec<usize>, GridError>
    where
        T: Numeric,
    {
        coordinates(series, alignment, self.y_bins)
            .into_iter()
            .map(|(x, y)| {
                let row = self.resolve(Axis::Y, y)?;
                let col = self.resolve(Axis::X, x)?;
                Ok(row * self.x_bins + col)
            })
            .collect()
    }

    fn increment(&mut self, cells: impl IntoIterator<Item = usize>) {
        for cell in cells {
            self.counts[cell] += 1;
        }
    }

    /// Counts every element of `series` under `alignment`.
    ///
    /// # Errors
    ///
    /// [`GridError::OutOfRange`] if an element falls outside the grid and the
    /// range policy is [`RangePolicy::Reject`]. The grid is left unchanged.
    pub fn add_series<T>(&mut self, series: &NumericSeries<T>, alignment: Alignment) -> Result<(), GridError>
    where
        T: Numeric,
    {
        let cells = self.cells(series, alignment)?;
        self.increment(cells);
        Ok(())
    }

    /// Counts every member of `collection`, in order, under `alignment`.
    ///
    /// # Errors
    ///
    /// [`GridError::OutOfRange`] as for [`add_series`](Self::add_series). If
    /// any member fails, no member is counted.
    pub fn add_collection<T>(
        &mut self,
        collection: &SeriesCollection<T>,
        alignment: Alignment,
    ) -> Result<(), GridError>
    where
        T: Numeric,
    {
        let cells = collection
            .iter()
            .map(|series| self.cells(series, alignment))
            .collect::<Result<Vec<_>, _>>()?;
        self.increment(cells.into_iter().flatten());
        Ok(())
    }

    /// Like [`add_series`](Self::add_series) with the alignment given by name.
    ///
    /// An unrecognized name is reported as a warning and leaves the grid
    /// unchanged.
    pub fn add_series_named<T>(&mut self, series: &NumericSeries<T>, alignment: &str) -> Result<(), GridError>
    where
        T: Numeric,
    {
        match alignment.parse() {
            Ok(alignment) => self.add_series(series, alignment),
            Err(err) => {
                warn!(%err, "series not added to histogram");
                Ok(())
            }
        }
    }

    /// Like [`add_collection`](Self::add_collection) with the alignment given
    /// by name.
    ///
    /// An unrecognized name is reported as a warning and leaves the grid
    /// unchanged.
    pub fn add_collection_named<T>(
        &mut self,
        collection: &SeriesCollection<T>,
        alignment: &str,
    ) -> Result<(), GridError>
    where
        T: Numeric,
    {
        match alignment.parse() {
            Ok(alignment) => self.add_collection(collection, alignment),
            Err(err) => {
                warn!(%err, members = collection.len(), "collection not added to histogram");
                Ok(())
            }
        }
    }

    /// Writes the parameter header followed by one line per row.
    ///
    /// ```
    /// use seriesgram_stats::{Alignment, HistogramGrid, NumericSeries};
    ///
    /// let mut grid = HistogramGrid::new(2, 2, 0.0, 2.0, 0.0, 2.0).unwrap();
    /// grid.add_series(&NumericSeries::new(vec![0, 1], vec![1, 1]).unwrap(), Alignment::ByX)
    ///     .unwrap();
    ///
    /// let mut out = Vec::new();
    /// grid.render(&mut out).unwrap();
    /// assert_eq!(
    ///     String::from_utf8(out).unwrap(),
    ///     "xbins, ybins, xmin, xmax, ymin, ymax\n2, 2, 0, 2, 0, 2\n 0,  1\n 0,  1\n",
    /// );
    /// ```
    pub fn render<W>(&self, sink: &mut W) -> io::Result<()>
    where
        W: io::Write + ?Sized,
    {
        writeln!(sink, "xbins, ybins, xmin, xmax, ymin, ymax")?;
        writeln!(
            sink,
            "{}, {}, {}, {}, {}, {}",
            self.x_bins, self.y_bins, self.x_min, self.x_max, self.y_min, self.y_max
        )?;
        for row in self.rows() {
            let cells = row.iter().map(|count| Cell(*count)).collect::<Vec<_>>();
            crate::render::write_joined(sink, &cells, ", ")?;
        }
        Ok(())
    }
}

/// A count as written in a histogram dump, with its leading space.
struct Cell(u64);

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " {}", self.0)
    }
}

/// `bins + 1` uniformly spaced edges from `min` to `max`.
#[expect(clippy::cast_precision_loss)]
fn uniform_edges(min: f64, max: f64, bins: usize) -> Vec<f64> {
    let increment = (max - min) / bins as f64;
    (0..=bins)
        .map(|i| if i == bins { max } else { min + i as f64 * increment })
        .collect()
}

/// `(x, y)` coordinates of every element of `series` under `alignment`.
#[expect(clippy::cast_precision_loss)]
fn coordinates<T>(series: &NumericSeries<T>, alignment: Alignment, y_bins: usize) -> Vec<(f64, f64)>
where
    T: Numeric,
{
    let values = series.values();
    let anchored = |anchor: T| -> Vec<(f64, f64)> {
        let anchor_index = values.iter().position(|&v| v == anchor).unwrap_or(0);
        let start = (y_bins / 2) as f64 - anchor_index as f64;
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + i as f64, v.as_f64()))
            .collect()
    };

    match alignment {
        Alignment::Front => values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, v.as_f64()))
            .collect(),
        Alignment::Back => {
            let start = y_bins as f64 - 1.0;
            values
                .iter()
                .rev()
                .enumerate()
                .map(|(i, v)| (start - i as f64, v.as_f64()))
                .collect()
        }
        Alignment::AtMax => anchored(series.max_value()),
        Alignment::AtMin => anchored(series.min_value()),
        Alignment::ByX => series
            .positions()
            .iter()
            .zip(values)
            .map(|(p, v)| (p.as_f64(), v.as_f64()))
            .collect(),
    }
}
