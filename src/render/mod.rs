//! Rendering collaborator interface.
//!
//! The profile code never draws anything itself. It hands step series,
//! axis bounds and captions to a [`PlotBackend`], together with a bag of
//! [`StyleOptions`] it forwards without looking inside. [`svg::SvgBackend`]
//! is the bundled implementation; other backends only need to implement
//! the trait.

pub mod svg;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use svg::{SvgBackend, SvgError, SvgPlot};

/// Opaque backend styling, keyed by backend-defined names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleOptions(BTreeMap<String, String>);

impl StyleOptions {
    /// Creates an empty style bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key/value pair.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a key/value pair, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Looks up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// True if no options are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StyleOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Options passed when a plot is created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisOptions {
    /// X values are `log2` ratios.
    pub log_scale: bool,
    /// Caller styling, forwarded untouched.
    pub style: StyleOptions,
}

/// A plotting backend able to draw step series.
///
/// Calls arrive in this order: `new_plot`, one `add_step_series` per
/// solver, then `set_axis_bounds`, `set_axis_labels` and `set_title`.
pub trait PlotBackend {
    /// Handle to a plot under construction.
    type Plot;
    /// Backend error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Starts a new plot.
    fn new_plot(&mut self, axes: &AxisOptions) -> Result<Self::Plot, Self::Error>;

    /// Adds one post-step series (`y[i]` holds from `x[i]` to `x[i + 1]`).
    fn add_step_series(
        &mut self,
        plot: &mut Self::Plot,
        x: &[f64],
        y: &[f64],
        label: &str,
        style: &StyleOptions,
    ) -> Result<(), Self::Error>;

    /// Sets the visible data ranges.
    fn set_axis_bounds(
        &mut self,
        plot: &mut Self::Plot,
        x: (f64, f64),
        y: (f64, f64),
    ) -> Result<(), Self::Error>;

    /// Sets axis captions.
    fn set_axis_labels(
        &mut self,
        plot: &mut Self::Plot,
        x_label: &str,
        y_label: &str,
    ) -> Result<(), Self::Error>;

    /// Sets the plot title.
    fn set_title(&mut self, plot: &mut Self::Plot, title: &str) -> Result<(), Self::Error>;
}
