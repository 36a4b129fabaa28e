//! # perf-profile
//!
//! Dolan–Moré performance profiles and Moré–Wild data profiles for
//! comparing solvers over a benchmark set.
//!
//! A profile takes a problems x solvers matrix of costs (runtime,
//! iterations, function evaluations, ...), turns every entry into a ratio
//! against the best solver on that problem (or against a per-problem
//! budget), and plots, per solver, the fraction of problems solved within
//! each ratio as a step curve.
//!
//! Drawing is delegated to a [`PlotBackend`]; [`SvgBackend`] is bundled.
//!
//! ## Quick Start
//!
//! ```rust
//! use perf_profile::{PerformanceMatrix, ProfileOptions, SvgBackend, build_profile};
//!
//! // Rows are problems, columns are solvers. -1, NaN and inf mark failures.
//! let matrix = PerformanceMatrix::from_rows(&[
//!     vec![1.2, 0.9, 3.0],
//!     vec![4.0, -1.0, 2.0],
//!     vec![0.5, 0.5, f64::NAN],
//! ])?;
//!
//! let options = ProfileOptions::new().with_title("Wall clock");
//! let plot = build_profile(&mut SvgBackend::new(), &matrix, &["ipopt", "knitro", "snopt"], &options)?;
//! let svg = plot.to_svg();
//! # assert!(svg.contains("knitro"));
//! # Ok::<(), perf_profile::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`matrix`]: Input boundary, failure tagging
//! - [`ratio`]: Ratio engine
//! - [`curve`]: Step curve reduction
//! - [`profile`]: Profile assembly
//! - [`render`]: Backend trait and SVG backend

pub mod curve;
pub mod error;
pub mod matrix;
pub mod profile;
pub mod ratio;
pub mod render;

// Re-export commonly used types
pub use curve::{StepCurve, breakpoints};
pub use error::{Error, Result};
pub use matrix::{Measurement, PerformanceMatrix};
pub use profile::{
    Profile, ProfileKind, ProfileOptions, ProfileSeries, SolverStats, build_data_profile,
    build_profile,
};
pub use ratio::{
    MAX_RATIO, Normalization, ProblemRatios, RatioMatrix, RatioOptions, ZeroPolicy,
    compute_ratios, dimension_budgets, problem_ratios,
};
pub use render::{AxisOptions, PlotBackend, StyleOptions, SvgBackend, SvgPlot};
