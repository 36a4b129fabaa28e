//! Curve reduction: sorted ratio column to step-function breakpoints.
//!
//! A sorted column of `n` ratios defines the right-continuous empirical
//! distribution `F(t) = #{ratio <= t} / n`. Drawing one step per row is
//! wasteful when many rows tie, so [`breakpoints`] keeps only the last row
//! of every group of equal values. A positive tolerance additionally folds
//! every value within `tolerance` of the previous breakpoint into the next
//! one, which gives a coarser curve that never lies above the exact one and
//! is never more than `tolerance` behind it horizontally.

use serde::{Deserialize, Serialize};

/// Returns the (0-based) indices of `column` where the step function has a
/// visible step.
///
/// `column` must be sorted ascending. The last index is always included.
/// With `tolerance == 0.0` the result is exactly the last index of every
/// run of equal values.
///
/// Runs in O(n): the reference value only grows, so the scan pointer never
/// moves backwards.
///
/// ```
/// use perf_profile::curve::breakpoints;
///
/// let column = [1.0, 1.0, 1.5, 2.0, 2.0, 4.0];
/// assert_eq!(breakpoints(&column, 0.0), vec![1, 2, 4, 5]);
/// assert_eq!(breakpoints(&column, 1.0), vec![1, 4, 5]);
/// assert_eq!(breakpoints(&[3.0, 3.0, 3.0], 0.0), vec![2]);
/// ```
#[must_use]
pub fn breakpoints(column: &[f64], tolerance: f64) -> Vec<usize> {
    let Some(&max) = column.last() else {
        return Vec::new();
    };

    let mut indices = Vec::new();
    let mut reference = column[0];
    let mut idx = 0;

    while reference < max {
        while idx + 1 < column.len() && column[idx + 1] <= reference {
            idx += 1;
        }
        if indices.last() != Some(&idx) {
            indices.push(idx);
        }
        // reference < max guarantees idx + 1 is in bounds
        reference = (column[idx] + tolerance).max(column[idx + 1]);
    }

    let last = column.len() - 1;
    if indices.last() != Some(&last) {
        indices.push(last);
    }
    indices
}

/// Breakpoints of one solver's curve as plot coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepCurve {
    /// Ratio at each breakpoint (ascending).
    pub x: Vec<f64>,
    /// Fraction of problems with ratio `<= x` (non-decreasing, at most 1).
    pub y: Vec<f64>,
}

impl StepCurve {
    /// Reduces a sorted column to its step curve.
    ///
    /// `problems` is the number of real problems. The column may be one
    /// longer than that (the synthetic right-edge row); fractions are capped
    /// at 1.0 so that row maps to the full set of problems.
    ///
    /// ```
    /// use perf_profile::StepCurve;
    ///
    /// let curve = StepCurve::from_column(&[1.0, 1.0, 2.0, 4.0], 3, 0.0);
    /// assert_eq!(curve.x, vec![1.0, 2.0, 4.0]);
    /// assert_eq!(curve.y[..2], [2.0 / 3.0, 1.0]);
    /// assert_eq!(curve.y[2], 1.0);
    /// ```
    #[must_use]
    pub fn from_column(column: &[f64], problems: usize, tolerance: f64) -> Self {
        let total = problems.max(1) as f64;
        let (x, y) = breakpoints(column, tolerance)
            .into_iter()
            .map(|idx| (column[idx], ((idx + 1) as f64 / total).min(1.0)))
            .unzip();
        Self { x, y }
    }

    /// Number of breakpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True if the curve has no breakpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterates over `(x, y)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Evaluates the right-continuous step function at `t`.
    ///
    /// Returns 0 left of the first breakpoint.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        match self.x.partition_point(|&x| x <= t) {
            0 => 0.0,
            k => self.y[k - 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Straightforward rescanning variant: find the last index `<= reference`
    /// from scratch on every step.
    fn breakpoints_rescan(column: &[f64], tolerance: f64) -> Vec<usize> {
        let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut reference = column.iter().copied().fold(f64::INFINITY, f64::min);
        let mut out = Vec::new();
        while reference < max {
            let idx = column.iter().rposition(|&v| v <= reference).unwrap();
            out.push(idx);
            reference = (column[idx] + tolerance).max(column[idx + 1]);
        }
        out.push(column.len() - 1);
        out.dedup();
        out
    }

    /// Small xorshift generator so tests stay deterministic.
    fn sorted_column(seed: u64, len: usize, levels: u64) -> Vec<f64> {
        let mut state = seed.max(1);
        let mut column: Vec<f64> = (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                1.0 + (state % levels) as f64 * 0.25
            })
            .collect();
        column.sort_by(f64::total_cmp);
        column
    }

    fn exact_fraction(column: &[f64], t: f64) -> f64 {
        column.iter().filter(|&&v| v <= t).count() as f64 / column.len() as f64
    }

    #[test]
    fn test_empty_column() {
        assert!(breakpoints(&[], 0.0).is_empty());
        assert!(StepCurve::from_column(&[], 0, 0.0).is_empty());
    }

    #[test]
    fn test_single_value() {
        assert_eq!(breakpoints(&[2.5], 0.0), vec![0]);
    }

    #[test]
    fn test_constant_column_single_breakpoint() {
        let column = vec![1.0; 10];
        assert_eq!(breakpoints(&column, 0.0), vec![9]);
        assert_eq!(breakpoints(&column, 5.0), vec![9]);
    }

    #[test]
    fn test_zero_tolerance_marks_every_increase() {
        for seed in 1..40 {
            let column = sorted_column(seed, 25, 8);
            let got = breakpoints(&column, 0.0);
            let expected: Vec<usize> = (0..column.len())
                .filter(|&i| i + 1 == column.len() || column[i] < column[i + 1])
                .collect();
            assert_eq!(got, expected, "seed {seed}");
        }
    }

    #[test]
    fn test_matches_rescan_variant() {
        for seed in 1..60 {
            let column = sorted_column(seed, 30, 12);
            for tolerance in [0.0, 0.1, 0.25, 0.3, 0.75, 1.0, 10.0] {
                assert_eq!(
                    breakpoints(&column, tolerance),
                    breakpoints_rescan(&column, tolerance),
                    "seed {seed}, tolerance {tolerance}"
                );
            }
        }
    }

    #[test]
    fn test_length_non_increasing_in_tolerance() {
        for seed in 1..40 {
            let column = sorted_column(seed, 40, 20);
            let mut previous = usize::MAX;
            for tolerance in [0.0, 0.1, 0.2, 0.3, 0.5, 0.8, 1.3, 2.1, 5.0] {
                let n = breakpoints(&column, tolerance).len();
                assert!(n <= previous, "seed {seed}, tolerance {tolerance}");
                previous = n;
            }
        }
    }

    #[test]
    fn test_reconstruction_exact_at_zero_tolerance() {
        let column = sorted_column(7, 50, 9);
        let curve = StepCurve::from_column(&column, column.len(), 0.0);
        for &v in &column {
            assert_eq!(curve.evaluate(v), exact_fraction(&column, v));
        }
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(*curve.y.last().unwrap(), 1.0);
    }

    #[test]
    fn test_reconstruction_within_tolerance() {
        for seed in 1..30 {
            let column = sorted_column(seed, 40, 16);
            for tolerance in [0.25, 0.5, 1.0] {
                let curve = StepCurve::from_column(&column, column.len(), tolerance);
                for &v in &column {
                    let approx = curve.evaluate(v);
                    assert!(approx <= exact_fraction(&column, v));
                    assert!(approx >= exact_fraction(&column, v - tolerance));
                }
            }
        }
    }

    #[test]
    fn test_synthetic_edge_row_capped_at_one() {
        // 3 real problems plus the right-edge row
        let curve = StepCurve::from_column(&[1.0, 2.0, 2.0, 4.0], 3, 0.0);
        assert_eq!(curve.x, vec![1.0, 2.0, 4.0]);
        assert_eq!(curve.y, vec![1.0 / 3.0, 1.0, 1.0]);
        assert_eq!(curve.evaluate(3.0), 1.0);
    }

    #[test]
    fn test_points_iter() {
        let curve = StepCurve::from_column(&[1.0, 3.0], 2, 0.0);
        let points: Vec<_> = curve.points().collect();
        assert_eq!(points, vec![(1.0, 0.5), (3.0, 1.0)]);
        assert_eq!(curve.len(), 2);
    }
}
