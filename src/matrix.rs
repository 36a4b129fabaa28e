//! Performance matrix input boundary.
//!
//! Raw benchmark tables overload floating point values to mean "failed":
//! NaN, infinities and negative numbers all mark a solver that did not
//! solve a problem. This module converts that permissive encoding into a
//! tagged [`Measurement`] once, so the rest of the crate never has to
//! guess what a NaN means.
//!
//! Matrices are always copied on entry. Nothing in this crate mutates
//! caller-owned data.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single solver measurement on a single problem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Measurement {
    /// The solver finished with this cost (zero or positive, finite).
    Ok(f64),
    /// The solver failed on this problem.
    Failed,
}

impl Measurement {
    /// Converts a raw value, mapping NaN, infinities and negatives to
    /// [`Measurement::Failed`].
    ///
    /// `-0.0` compares equal to zero and is kept as a (zero) measurement.
    ///
    /// ```
    /// use perf_profile::Measurement;
    ///
    /// assert_eq!(Measurement::from_raw(3.5), Measurement::Ok(3.5));
    /// assert_eq!(Measurement::from_raw(-1.0), Measurement::Failed);
    /// assert_eq!(Measurement::from_raw(f64::NAN), Measurement::Failed);
    /// assert_eq!(Measurement::from_raw(f64::INFINITY), Measurement::Failed);
    /// ```
    #[must_use]
    pub fn from_raw(value: f64) -> Self {
        if value.is_finite() && value >= 0.0 {
            Self::Ok(value)
        } else {
            Self::Failed
        }
    }

    /// Returns the measured value, or `None` for a failure.
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Ok(v) => Some(v),
            Self::Failed => None,
        }
    }

    /// Returns true if the solver failed.
    #[must_use]
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns true for an exact zero measurement.
    #[must_use]
    pub fn is_zero(self) -> bool {
        matches!(self, Self::Ok(v) if v == 0.0)
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Self::from_raw(value)
    }
}

/// Problems x solvers table of measurements, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMatrix {
    problems: usize,
    solvers: usize,
    data: Vec<Measurement>,
}

impl PerformanceMatrix {
    /// Builds a matrix from raw numeric rows (one row per problem).
    ///
    /// ```
    /// use perf_profile::PerformanceMatrix;
    ///
    /// let m = PerformanceMatrix::from_rows(&[vec![1.0, 2.0], vec![-1.0, 4.0]]).unwrap();
    /// assert_eq!((m.problems(), m.solvers()), (2, 2));
    /// assert_eq!(m.failure_count(), 1);
    /// ```
    pub fn from_rows<T>(rows: &[Vec<T>]) -> Result<Self>
    where
        T: Into<f64> + Copy,
    {
        let tagged: Vec<Vec<Measurement>> = rows
            .iter()
            .map(|row| row.iter().map(|&v| Measurement::from_raw(v.into())).collect())
            .collect();
        Self::from_measurements(&tagged)
    }

    /// Builds a matrix from already-tagged rows.
    pub fn from_measurements(rows: &[Vec<Measurement>]) -> Result<Self> {
        let problems = rows.len();
        let solvers = rows.first().map_or(0, Vec::len);
        if problems == 0 || solvers == 0 {
            return Err(Error::EmptyInput {
                rows: problems,
                cols: solvers,
            });
        }

        let mut data = Vec::with_capacity(problems * solvers);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != solvers {
                return Err(Error::RaggedMatrix {
                    row,
                    expected: solvers,
                    actual: values.len(),
                });
            }
            data.extend_from_slice(values);
        }

        Ok(Self {
            problems,
            solvers,
            data,
        })
    }

    /// Number of problems (rows).
    #[must_use]
    pub fn problems(&self) -> usize {
        self.problems
    }

    /// Number of solvers (columns).
    #[must_use]
    pub fn solvers(&self) -> usize {
        self.solvers
    }

    /// Measurement of `solver` on `problem`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[must_use]
    pub fn get(&self, problem: usize, solver: usize) -> Measurement {
        assert!(solver < self.solvers, "solver index out of range");
        self.data[problem * self.solvers + solver]
    }

    /// All measurements for one problem.
    #[must_use]
    pub fn row(&self, problem: usize) -> &[Measurement] {
        let start = problem * self.solvers;
        &self.data[start..start + self.solvers]
    }

    /// Iterates over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Measurement]> {
        self.data.chunks_exact(self.solvers)
    }

    /// Number of failed runs.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.data.iter().filter(|m| m.is_failed()).count()
    }

    /// Position of the first exact zero in row-major order.
    #[must_use]
    pub fn first_zero(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .position(|m| m.is_zero())
            .map(|i| (i / self.solvers, i % self.solvers))
    }

    /// Returns a copy with `offset` added to every successful measurement.
    #[must_use]
    pub(crate) fn shifted(&self, offset: f64) -> Self {
        let data = self
            .data
            .iter()
            .map(|m| match *m {
                Measurement::Ok(v) => Measurement::Ok(v + offset),
                Measurement::Failed => Measurement::Failed,
            })
            .collect();
        Self {
            problems: self.problems,
            solvers: self.solvers,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_classification() {
        assert_eq!(Measurement::from_raw(0.0), Measurement::Ok(0.0));
        assert!(Measurement::from_raw(-0.0).is_zero());
        assert!(Measurement::from_raw(-1e-12).is_failed());
        assert!(Measurement::from_raw(f64::NEG_INFINITY).is_failed());
        assert_eq!(Measurement::from_raw(2.0).value(), Some(2.0));
        assert_eq!(Measurement::Failed.value(), None);
    }

    #[test]
    fn test_from_rows_integer_input() {
        let m = PerformanceMatrix::from_rows(&[vec![1_i32, 2], vec![3, 4]]).unwrap();
        assert_eq!(m.get(1, 0), Measurement::Ok(3.0));
        assert_eq!(m.row(0), &[Measurement::Ok(1.0), Measurement::Ok(2.0)]);
    }

    #[test]
    fn test_empty_input() {
        let rows: Vec<Vec<f64>> = vec![];
        assert!(matches!(
            PerformanceMatrix::from_rows(&rows),
            Err(Error::EmptyInput { rows: 0, cols: 0 })
        ));

        let rows: Vec<Vec<f64>> = vec![vec![], vec![]];
        assert!(matches!(
            PerformanceMatrix::from_rows(&rows),
            Err(Error::EmptyInput { rows: 2, cols: 0 })
        ));
    }

    #[test]
    fn test_ragged_rows() {
        let err = PerformanceMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(
            err,
            Error::RaggedMatrix {
                row: 1,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_first_zero_and_shift() {
        let m = PerformanceMatrix::from_rows(&[vec![1.0, f64::NAN], vec![0.0, 2.0]]).unwrap();
        assert_eq!(m.first_zero(), Some((1, 0)));

        let shifted = m.shifted(1.0);
        assert_eq!(shifted.get(1, 0), Measurement::Ok(1.0));
        assert!(shifted.get(0, 1).is_failed());
        assert_eq!(shifted.first_zero(), None);
        // Original untouched
        assert!(m.get(1, 0).is_zero());
    }

    #[test]
    fn test_caller_rows_not_aliased() {
        let mut rows = vec![vec![1.0, 2.0]];
        let m = PerformanceMatrix::from_rows(&rows).unwrap();
        rows[0][0] = 100.0;
        assert_eq!(m.get(0, 0), Measurement::Ok(1.0));
    }
}
