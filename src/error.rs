//! Error types for profile computation and rendering.

use thiserror::Error;

/// Result type alias for perf-profile operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while computing or rendering a profile.
///
/// Failed solver runs (NaN, negative or infinite measurements) are data,
/// not errors; they are absorbed by the sentinel substitution in
/// [`crate::ratio`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The matrix has no problems or no solvers.
    #[error("Empty input: {rows} problem(s) x {cols} solver(s)")]
    EmptyInput {
        /// Number of rows (problems).
        rows: usize,
        /// Number of columns (solvers).
        cols: usize,
    },

    /// A row does not have the same number of columns as the first row.
    #[error("Ragged matrix: row {row} has {actual} column(s), expected {expected}")]
    RaggedMatrix {
        /// Offending row index (0-based).
        row: usize,
        /// Column count of the first row.
        expected: usize,
        /// Column count of the offending row.
        actual: usize,
    },

    /// A measurement is exactly zero and the profile kind does not allow it.
    #[error("Zero measurement at problem {row}, solver {col}")]
    ZeroMeasurement {
        /// Problem index (0-based).
        row: usize,
        /// Solver index (0-based).
        col: usize,
    },

    /// The label list is neither empty nor one label per solver.
    #[error("Label count mismatch: got {actual} label(s) for {expected} solver(s)")]
    LabelCountMismatch {
        /// Number of solvers.
        expected: usize,
        /// Number of labels supplied.
        actual: usize,
    },

    /// Every solver failed on a problem (strict mode only).
    #[error("All solvers failed on problem {row}")]
    AllFailuresInRow {
        /// Problem index (0-based).
        row: usize,
    },

    /// No solver succeeded on any problem, so no finite ratio exists.
    #[error("No successful runs in the performance matrix")]
    NoSuccessfulRuns,

    /// The budget vector does not have one entry per problem.
    #[error("Budget length mismatch: got {actual} budget(s) for {expected} problem(s)")]
    BudgetLength {
        /// Number of problems.
        expected: usize,
        /// Number of budgets supplied.
        actual: usize,
    },

    /// A problem budget is zero, negative or not finite.
    #[error("Invalid budget for problem {row}: {value}")]
    InvalidBudget {
        /// Problem index (0-based).
        row: usize,
        /// Offending budget value.
        value: f64,
    },

    /// Sample tolerance must be finite and non-negative.
    #[error("Invalid sample tolerance: {0} (expected a finite value >= 0)")]
    InvalidTolerance(f64),

    /// Error raised by the rendering backend, passed through unchanged.
    #[error("Render error: {0}")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wraps a backend error.
    pub(crate) fn render<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Render(Box::new(err))
    }
}
