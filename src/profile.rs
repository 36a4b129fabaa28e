//! Profile assembly: ratio engine + curve reducer + rendering backend.
//!
//! [`Profile::compute`] does all the numeric work and returns plain data
//! (one [`StepCurve`] per solver plus axis bounds and captions).
//! [`Profile::render`] replays that data into a [`PlotBackend`].
//! [`build_profile`] and [`build_data_profile`] do both in one call.
//!
//! ## Example
//!
//! ```rust
//! use perf_profile::{PerformanceMatrix, ProfileOptions, SvgBackend, build_profile};
//!
//! let matrix = PerformanceMatrix::from_rows(&[
//!     vec![1.0, 2.0],
//!     vec![2.0, 1.0],
//!     vec![4.0, 4.0],
//! ])?;
//! let options = ProfileOptions::new()
//!     .with_log_scale(false)
//!     .with_title("Runtime");
//!
//! let plot = build_profile(&mut SvgBackend::new(), &matrix, &["A", "B"], &options)?;
//! assert!(plot.to_svg().contains("Runtime"));
//! # Ok::<(), perf_profile::Error>(())
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::StepCurve;
use crate::error::{Error, Result};
use crate::matrix::PerformanceMatrix;
use crate::ratio::{
    ProblemRatios, RatioMatrix, RatioOptions, dimension_budgets, problem_ratios,
};
use crate::render::{AxisOptions, PlotBackend, StyleOptions};

/// Y-axis caption shared by both profile kinds.
pub const Y_LABEL: &str = "Proportion of problems";

/// Which profile to draw.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ProfileKind {
    /// Ratio to the best solver on each problem; zeros are shifted.
    #[default]
    Performance,
    /// Ratio to a per-problem budget; zeros are rejected.
    Data {
        /// One positive budget per problem.
        budgets: Vec<f64>,
    },
}

impl ProfileKind {
    /// Data profile with budgets `n_p + 1` for problem dimensions `n_p`.
    #[must_use]
    pub fn data_from_dimensions(dimensions: &[usize]) -> Self {
        Self::Data {
            budgets: dimension_budgets(dimensions),
        }
    }

    /// Ratio engine settings for this kind.
    #[must_use]
    pub fn ratio_options(&self, options: &ProfileOptions) -> RatioOptions {
        let base = match self {
            Self::Performance => RatioOptions::performance(),
            Self::Data { budgets } => RatioOptions::data(budgets.clone()),
        };
        base.with_log_scale(options.log_scale).with_strict(options.strict)
    }

    /// X-axis caption.
    #[must_use]
    pub fn x_label(&self, log_scale: bool) -> String {
        let base = match self {
            Self::Performance => "Within this factor of the best",
            Self::Data { .. } => "Within this many budget units",
        };
        if log_scale {
            format!("{base} (log scale)")
        } else {
            base.to_string()
        }
    }
}

/// Profile configuration.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use perf_profile::ProfileOptions;
///
/// let options = ProfileOptions::from_json(r#"{"title": "CUTEst", "style": {"width": "900"}}"#).unwrap();
/// assert!(options.log_scale);
/// assert_eq!(options.title, "CUTEst");
/// assert_eq!(options.style.get("width"), Some("900"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    /// Plot `log2` ratios.
    pub log_scale: bool,
    /// Plot title.
    pub title: String,
    /// Curve reduction tolerance (0 = exact staircase).
    pub sample_tolerance: f64,
    /// Reject problems on which every solver failed.
    pub strict: bool,
    /// Backend styling, forwarded untouched.
    pub style: StyleOptions,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            log_scale: true,
            title: String::new(),
            sample_tolerance: 0.0,
            strict: false,
            style: StyleOptions::default(),
        }
    }
}

impl ProfileOptions {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Sets log scale.
    #[must_use]
    pub fn with_log_scale(mut self, log_scale: bool) -> Self {
        self.log_scale = log_scale;
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the curve reduction tolerance.
    #[must_use]
    pub fn with_sample_tolerance(mut self, tolerance: f64) -> Self {
        self.sample_tolerance = tolerance;
        self
    }

    /// Sets strict all-failures checking.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets backend styling.
    #[must_use]
    pub fn with_style(mut self, style: StyleOptions) -> Self {
        self.style = style;
        self
    }

    /// Checks option values.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_tolerance.is_finite() && self.sample_tolerance >= 0.0) {
            return Err(Error::InvalidTolerance(self.sample_tolerance));
        }
        Ok(())
    }
}

/// One solver's curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSeries {
    /// Solver label.
    pub label: String,
    /// Breakpoints.
    pub curve: StepCurve,
}

/// Headline numbers read off each curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverStats {
    /// Solver label.
    pub label: String,
    /// Fraction of problems on which the solver attains the smallest ratio
    /// (ties count for every tied solver).
    pub wins: f64,
    /// Fraction of problems the solver did not fail on.
    pub solved: f64,
}

/// A fully computed profile, ready to render or serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile kind.
    pub kind: ProfileKind,
    /// Whether ratios are `log2`.
    pub log_scale: bool,
    /// Title.
    pub title: String,
    /// X-axis caption.
    pub x_label: String,
    /// Y-axis caption.
    pub y_label: String,
    /// X range.
    pub x_bounds: (f64, f64),
    /// Y range.
    pub y_bounds: (f64, f64),
    /// Number of problems.
    pub problems: usize,
    /// Largest finite ratio.
    pub max_ratio: f64,
    /// Ratio used for failed runs.
    pub sentinel: f64,
    /// Whether zero measurements forced a +1 shift.
    pub zero_shifted: bool,
    /// One curve per solver, in column order.
    pub series: Vec<ProfileSeries>,
    /// Per-solver summary, in column order.
    pub stats: Vec<SolverStats>,
    /// Backend styling.
    pub style: StyleOptions,
}

impl Profile {
    /// Computes a profile without rendering it.
    pub fn compute<S: AsRef<str>>(
        kind: &ProfileKind,
        matrix: &PerformanceMatrix,
        labels: &[S],
        options: &ProfileOptions,
    ) -> Result<Self> {
        options.validate()?;
        let labels = resolve_labels(labels, matrix.solvers())?;

        let ratios = problem_ratios(matrix, &kind.ratio_options(options))?;
        let sorted = RatioMatrix::from_problem_ratios(&ratios)?;
        let problems = sorted.problems();

        // Synthetic right-edge row so every curve is drawn out to the sentinel.
        let edge = sorted.sentinel;
        let tolerance = options.sample_tolerance;
        let series: Vec<ProfileSeries> = sorted
            .columns
            .par_iter()
            .zip(labels.par_iter())
            .map(|(column, label)| {
                let mut extended = Vec::with_capacity(column.len() + 1);
                extended.extend_from_slice(column);
                extended.push(edge);
                ProfileSeries {
                    label: label.clone(),
                    curve: StepCurve::from_column(&extended, problems, tolerance),
                }
            })
            .collect();

        let max_ratio = sorted.max_ratio;
        let x_lo = match kind {
            ProfileKind::Performance if options.log_scale => 0.0,
            ProfileKind::Performance => 1.0,
            ProfileKind::Data { .. } => ratios.min_ratio().map_or(0.0, |m| m.min(0.0)),
        };
        let x_hi = if max_ratio > 0.0 {
            1.1 * max_ratio
        } else if max_ratio < 0.0 {
            0.9 * max_ratio
        } else {
            1.0
        };

        debug!(
            solvers = series.len(),
            problems,
            breakpoints = series.iter().map(|s| s.curve.len()).sum::<usize>(),
            "assembled profile"
        );

        Ok(Self {
            kind: kind.clone(),
            log_scale: options.log_scale,
            title: options.title.clone(),
            x_label: kind.x_label(options.log_scale),
            y_label: Y_LABEL.to_string(),
            x_bounds: (x_lo, x_hi),
            y_bounds: (0.0, 1.1),
            problems,
            max_ratio,
            sentinel: sorted.sentinel,
            zero_shifted: sorted.zero_shifted,
            stats: solver_stats(&ratios, &labels),
            series,
            style: options.style.clone(),
        })
    }

    /// Draws the profile with `backend`.
    pub fn render<B: PlotBackend>(&self, backend: &mut B) -> Result<B::Plot> {
        let axes = AxisOptions {
            log_scale: self.log_scale,
            style: self.style.clone(),
        };
        let mut plot = backend.new_plot(&axes).map_err(Error::render)?;
        for s in &self.series {
            backend
                .add_step_series(&mut plot, &s.curve.x, &s.curve.y, &s.label, &self.style)
                .map_err(Error::render)?;
        }
        backend
            .set_axis_bounds(&mut plot, self.x_bounds, self.y_bounds)
            .map_err(Error::render)?;
        backend
            .set_axis_labels(&mut plot, &self.x_label, &self.y_label)
            .map_err(Error::render)?;
        backend
            .set_title(&mut plot, &self.title)
            .map_err(Error::render)?;
        Ok(plot)
    }

    /// Per-solver summary.
    #[must_use]
    pub fn solver_stats(&self) -> &[SolverStats] {
        &self.stats
    }

    /// Serializes the profile as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Computes and renders a performance profile.
pub fn build_profile<B, S>(
    backend: &mut B,
    matrix: &PerformanceMatrix,
    labels: &[S],
    options: &ProfileOptions,
) -> Result<B::Plot>
where
    B: PlotBackend,
    S: AsRef<str>,
{
    Profile::compute(&ProfileKind::Performance, matrix, labels, options)?.render(backend)
}

/// Computes and renders a data profile with one budget per problem.
pub fn build_data_profile<B, S>(
    backend: &mut B,
    matrix: &PerformanceMatrix,
    budgets: &[f64],
    labels: &[S],
    options: &ProfileOptions,
) -> Result<B::Plot>
where
    B: PlotBackend,
    S: AsRef<str>,
{
    let kind = ProfileKind::Data {
        budgets: budgets.to_vec(),
    };
    Profile::compute(&kind, matrix, labels, options)?.render(backend)
}

/// Empty labels become `column 1..=n`; otherwise exactly one per solver.
fn resolve_labels<S: AsRef<str>>(labels: &[S], solvers: usize) -> Result<Vec<String>> {
    if labels.is_empty() {
        return Ok((1..=solvers).map(|i| format!("column {i}")).collect());
    }
    if labels.len() != solvers {
        return Err(Error::LabelCountMismatch {
            expected: solvers,
            actual: labels.len(),
        });
    }
    Ok(labels.iter().map(|l| l.as_ref().to_string()).collect())
}

fn solver_stats(ratios: &ProblemRatios, labels: &[String]) -> Vec<SolverStats> {
    let problems = ratios.problems() as f64;
    let mut wins = vec![0_usize; ratios.solvers()];
    let mut solved = vec![0_usize; ratios.solvers()];

    for p in 0..ratios.problems() {
        let row = ratios.row(p);
        let best = row.iter().flatten().copied().reduce(f64::min);
        for (s, ratio) in row.iter().enumerate() {
            if let Some(r) = ratio {
                solved[s] += 1;
                if Some(*r) == best {
                    wins[s] += 1;
                }
            }
        }
    }

    labels
        .iter()
        .enumerate()
        .map(|(s, label)| SolverStats {
            label: label.clone(),
            wins: wins[s] as f64 / problems,
            solved: solved[s] as f64 / problems,
        })
        .collect()
}
