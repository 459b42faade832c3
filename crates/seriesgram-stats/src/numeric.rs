//! Element types accepted by series, collections and grids.

use std::fmt;

use num_traits::{Num, ToPrimitive};

/// Element type of a [`NumericSeries`](crate::series::NumericSeries).
///
/// Implemented for every primitive integer and floating-point type. Statistics
/// and bin lookups are evaluated in `f64` regardless of the element type.
///
/// # Examples
///
/// ```
/// use seriesgram_stats::Numeric;
///
/// assert_eq!(7_u8.as_f64(), 7.0);
/// assert_eq!((-3_i64).as_f64(), -3.0);
/// ```
pub trait Numeric:
    Num + ToPrimitive + Copy + PartialOrd + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Converts the value to `f64`, yielding `NaN` when no conversion exists.
    #[must_use]
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

macro_rules! impl_numeric {
    ($($ty:ty),* $(,)?) => {
        $(impl Numeric for $ty {})*
    };
}

impl_numeric!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

/// Returns `(min, max)` of `values`, or `None` if empty.
///
/// Incomparable values (NaN) never replace a current extremum.
pub(crate) fn extrema<T>(values: &[T]) -> Option<(T, T)>
where
    T: Numeric,
{
    let (&first, rest) = values.split_first()?;
    Some(rest.iter().fold((first, first), |(min, max), &v| {
        (if v < min { v } else { min }, if v > max { v } else { max })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extrema_empty() {
        assert_eq!(extrema::<i32>(&[]), None);
    }

    #[test]
    fn test_extrema_mixed() {
        assert_eq!(extrema(&[3, 9, -2, 9, 0]), Some((-2, 9)));
        assert_eq!(extrema(&[4_u16]), Some((4, 4)));
    }

    #[test]
    fn test_extrema_skips_nan() {
        assert_eq!(extrema(&[1.5, f64::NAN, -0.5]), Some((-0.5, 1.5)));
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(200_u8.as_f64(), 200.0);
        assert_eq!((-1.25_f32).as_f64(), -1.25);
        assert!(f32::NAN.as_f64().is_nan());
    }
}
