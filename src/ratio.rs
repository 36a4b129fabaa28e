//! Ratio engine: raw performance matrix to sorted, sentinel-filled ratios.
//!
//! The pipeline, applied to a private copy of the input:
//!
//! 1. Zero handling according to [`ZeroPolicy`].
//! 2. Per-problem normalisation: divide by the best successful measurement
//!    (performance profile) or by a problem budget (data profile).
//! 3. Optional `log2` transform of every finite ratio.
//! 4. `max_ratio` = largest finite ratio in the whole table.
//! 5. Failures replaced by the sentinel `2 * max_ratio`. Ratios above
//!    [`MAX_RATIO`] count as failures so the sentinel cannot overflow.
//! 6. Every solver column sorted ascending, independently.
//!
//! After step 6 rows no longer correspond to problems; only the column
//! (solver) identity survives.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::matrix::PerformanceMatrix;

/// What to do when a measurement is exactly zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZeroPolicy {
    /// Warn and add 1.0 to every successful measurement.
    #[default]
    ShiftAndWarn,
    /// Reject the matrix with [`Error::ZeroMeasurement`].
    Fail,
}

/// Per-problem divisor used to turn measurements into ratios.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// Divide by the best successful measurement on the problem.
    #[default]
    BestPerProblem,
    /// Divide by a fixed, problem-specific budget (one entry per problem).
    Budget(Vec<f64>),
}

impl Normalization {
    /// Budgets of `n_p + 1` for problems of dimension `n_p`, the usual
    /// "simplex gradient" unit of a data profile.
    ///
    /// ```
    /// use perf_profile::Normalization;
    ///
    /// assert_eq!(
    ///     Normalization::from_dimensions(&[2, 9]),
    ///     Normalization::Budget(vec![3.0, 10.0])
    /// );
    /// ```
    #[must_use]
    pub fn from_dimensions(dimensions: &[usize]) -> Self {
        Self::Budget(dimension_budgets(dimensions))
    }
}

/// `n_p + 1` for every problem dimension `n_p`.
#[must_use]
pub fn dimension_budgets(dimensions: &[usize]) -> Vec<f64> {
    dimensions.iter().map(|&n| n as f64 + 1.0).collect()
}

/// Options for the ratio engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioOptions {
    /// Apply `log2` to every finite ratio.
    pub log_scale: bool,
    /// Zero measurement policy.
    pub zero_policy: ZeroPolicy,
    /// Per-problem divisor.
    pub normalization: Normalization,
    /// Fail when every solver failed on a problem instead of carrying the
    /// failures through to the sentinel.
    pub strict: bool,
}

impl Default for RatioOptions {
    fn default() -> Self {
        Self::performance()
    }
}

impl RatioOptions {
    /// Performance-profile semantics: ratio to best, shift zeros.
    #[must_use]
    pub fn performance() -> Self {
        Self {
            log_scale: true,
            zero_policy: ZeroPolicy::ShiftAndWarn,
            normalization: Normalization::BestPerProblem,
            strict: false,
        }
    }

    /// Data-profile semantics: ratio to budget, reject zeros.
    #[must_use]
    pub fn data(budgets: Vec<f64>) -> Self {
        Self {
            log_scale: true,
            zero_policy: ZeroPolicy::Fail,
            normalization: Normalization::Budget(budgets),
            strict: false,
        }
    }

    /// Sets the log2 transform.
    #[must_use]
    pub fn with_log_scale(mut self, log_scale: bool) -> Self {
        self.log_scale = log_scale;
        self
    }

    /// Sets strict all-failures checking.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Row-aligned ratios before sentinel substitution and sorting.
///
/// `None` marks a failed run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemRatios {
    problems: usize,
    solvers: usize,
    cells: Vec<Option<f64>>,
    zero_shifted: bool,
}

impl ProblemRatios {
    /// Number of problems.
    #[must_use]
    pub fn problems(&self) -> usize {
        self.problems
    }

    /// Number of solvers.
    #[must_use]
    pub fn solvers(&self) -> usize {
        self.solvers
    }

    /// Ratio of `solver` on `problem`.
    #[must_use]
    pub fn get(&self, problem: usize, solver: usize) -> Option<f64> {
        self.cells[problem * self.solvers + solver]
    }

    /// All ratios of one problem.
    #[must_use]
    pub fn row(&self, problem: usize) -> &[Option<f64>] {
        let start = problem * self.solvers;
        &self.cells[start..start + self.solvers]
    }

    /// Whether zero measurements forced a +1 shift.
    #[must_use]
    pub fn zero_shifted(&self) -> bool {
        self.zero_shifted
    }

    /// Largest finite ratio, if any run succeeded.
    #[must_use]
    pub fn max_ratio(&self) -> Option<f64> {
        self.cells.iter().flatten().copied().reduce(f64::max)
    }

    /// Smallest finite ratio, if any run succeeded.
    #[must_use]
    pub fn min_ratio(&self) -> Option<f64> {
        self.cells.iter().flatten().copied().reduce(f64::min)
    }

    /// Number of failed runs.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }
}

/// Sorted, sentinel-substituted ratios, one column per solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioMatrix {
    /// One ascending column per solver.
    pub columns: Vec<Vec<f64>>,
    /// Largest finite ratio before sentinel substitution.
    pub max_ratio: f64,
    /// Value substituted for every failed run.
    pub sentinel: f64,
    /// Number of failed runs replaced by the sentinel.
    pub failures: usize,
    /// Whether zero measurements forced a +1 shift.
    pub zero_shifted: bool,
}

impl RatioMatrix {
    /// Number of problems (column length).
    #[must_use]
    pub fn problems(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Number of solvers.
    #[must_use]
    pub fn solvers(&self) -> usize {
        self.columns.len()
    }

    /// Sorted ratios of one solver.
    #[must_use]
    pub fn column(&self, solver: usize) -> &[f64] {
        &self.columns[solver]
    }
}

/// Largest ratio kept as a success.
///
/// Anything above is treated like an overflow so that the sentinel
/// `2 * max_ratio` and the axis bound `1.1 * max_ratio` stay finite.
pub const MAX_RATIO: f64 = f64::MAX / 2.0;

/// Sentinel used for failed runs.
///
/// `2 * max_ratio` sorts after every finite ratio as long as `max_ratio`
/// is positive. `max_ratio <= 0` (every log ratio tied at zero, or a
/// log-scale data profile under budget everywhere) falls back to
/// `max_ratio + 1`.
#[must_use]
pub fn sentinel_for(max_ratio: f64) -> f64 {
    if max_ratio > 0.0 {
        2.0 * max_ratio
    } else {
        max_ratio + 1.0
    }
}

/// Computes row-aligned ratios (steps 1-3 of the pipeline).
///
/// ```
/// use perf_profile::{PerformanceMatrix, RatioOptions, problem_ratios};
///
/// let m = PerformanceMatrix::from_rows(&[vec![2.0, 4.0], vec![3.0, -1.0]]).unwrap();
/// let r = problem_ratios(&m, &RatioOptions::performance().with_log_scale(false)).unwrap();
/// assert_eq!(r.row(0), &[Some(1.0), Some(2.0)]);
/// assert_eq!(r.row(1), &[Some(1.0), None]);
/// ```
pub fn problem_ratios(matrix: &PerformanceMatrix, options: &RatioOptions) -> Result<ProblemRatios> {
    let problems = matrix.problems();
    let solvers = matrix.solvers();

    if let Normalization::Budget(budgets) = &options.normalization {
        validate_budgets(budgets, problems)?;
    }

    let mut zero_shifted = false;
    let working: Cow<'_, PerformanceMatrix> = match (matrix.first_zero(), options.zero_policy) {
        (None, _) => Cow::Borrowed(matrix),
        (Some((row, col)), ZeroPolicy::Fail) => return Err(Error::ZeroMeasurement { row, col }),
        (Some((row, col)), ZeroPolicy::ShiftAndWarn) => {
            warn!(row, col, "zero measurement found, shifting all measurements by +1");
            zero_shifted = true;
            Cow::Owned(matrix.shifted(1.0))
        }
    };

    let mut cells = Vec::with_capacity(problems * solvers);
    for (row, values) in working.rows().enumerate() {
        let all_failed = values.iter().all(|m| m.is_failed());
        if all_failed && options.strict {
            return Err(Error::AllFailuresInRow { row });
        }

        let divisor = match &options.normalization {
            Normalization::BestPerProblem => values
                .iter()
                .filter_map(|m| m.value())
                .reduce(f64::min),
            Normalization::Budget(budgets) => Some(budgets[row]),
        };

        cells.extend(values.iter().map(|m| {
            let ratio = m.value()? / divisor?;
            let ratio = if options.log_scale { ratio.log2() } else { ratio };
            // Overflow or log2(0) would reintroduce an ambiguous value.
            (ratio.is_finite() && ratio <= MAX_RATIO).then_some(ratio)
        }));
    }

    Ok(ProblemRatios {
        problems,
        solvers,
        cells,
        zero_shifted,
    })
}

/// Runs the full ratio engine.
///
/// ```
/// use perf_profile::{PerformanceMatrix, RatioOptions, compute_ratios};
///
/// let m = PerformanceMatrix::from_rows(&[
///     vec![1.0, 2.0],
///     vec![2.0, 1.0],
///     vec![4.0, 4.0],
/// ]).unwrap();
/// let r = compute_ratios(&m, &RatioOptions::performance().with_log_scale(false)).unwrap();
/// assert_eq!(r.max_ratio, 2.0);
/// assert_eq!(r.column(0), &[1.0, 1.0, 2.0]);
/// assert_eq!(r.column(1), &[1.0, 1.0, 2.0]);
/// ```
pub fn compute_ratios(matrix: &PerformanceMatrix, options: &RatioOptions) -> Result<RatioMatrix> {
    let ratios = problem_ratios(matrix, options)?;
    RatioMatrix::from_problem_ratios(&ratios)
}

impl RatioMatrix {
    /// Applies sentinel substitution and per-column sorting (steps 4-6).
    pub fn from_problem_ratios(ratios: &ProblemRatios) -> Result<Self> {
        let max_ratio = ratios.max_ratio().ok_or(Error::NoSuccessfulRuns)?;
        let sentinel = sentinel_for(max_ratio);

        let columns: Vec<Vec<f64>> = (0..ratios.solvers())
            .map(|solver| {
                let mut column: Vec<f64> = (0..ratios.problems())
                    .map(|problem| ratios.get(problem, solver).unwrap_or(sentinel))
                    .collect();
                column.sort_by(f64::total_cmp);
                column
            })
            .collect();

        let failures = ratios.failures();
        debug!(
            problems = ratios.problems(),
            solvers = ratios.solvers(),
            failures,
            max_ratio,
            "computed ratio matrix"
        );

        Ok(Self {
            columns,
            max_ratio,
            sentinel,
            failures,
            zero_shifted: ratios.zero_shifted(),
        })
    }
}

fn validate_budgets(budgets: &[f64], problems: usize) -> Result<()> {
    if budgets.len() != problems {
        return Err(Error::BudgetLength {
            expected: problems,
            actual: budgets.len(),
        });
    }
    match budgets.iter().position(|b| !(b.is_finite() && *b > 0.0)) {
        Some(row) => Err(Error::InvalidBudget {
            row,
            value: budgets[row],
        }),
        None => Ok(()),
    }
}
