//! SVG rendering of profile step curves.
//!
//! Produces a standalone SVG document with light and dark mode support via
//! CSS media queries.
//!
//! Recognised style keys:
//!
//! | key            | value                              | default          |
//! |----------------|------------------------------------|------------------|
//! | `width`        | pixels                             | 700              |
//! | `height`       | pixels                             | 450              |
//! | `palette`      | comma separated CSS colours        | [`colors::ALL`]  |
//! | `stroke_width` | line width in pixels               | 2.5              |
//! | `legend`       | `true` / `false`                   | `true`           |
//!
//! Other keys are ignored.

use std::fmt::Write as _;
use std::path::Path;

use thiserror::Error;

use super::{AxisOptions, PlotBackend, StyleOptions};

const MARGIN_TOP: u32 = 50;
const MARGIN_RIGHT: u32 = 140;
const MARGIN_BOTTOM: u32 = 70;
const MARGIN_LEFT: u32 = 90;

/// Errors raised by the SVG backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SvgError {
    /// A recognised style key has a value that does not parse.
    #[error("Invalid style value for '{key}': {value}")]
    InvalidStyle {
        /// Style key.
        key: String,
        /// Offending value.
        value: String,
    },

    /// A series has different numbers of x and y values.
    #[error("Series '{label}' has {x} x value(s) but {y} y value(s)")]
    LengthMismatch {
        /// Series label.
        label: String,
        /// Number of x values.
        x: usize,
        /// Number of y values.
        y: usize,
    },

    /// Axis bounds and their spans must be finite.
    #[error("Non-finite axis bounds: x {x:?}, y {y:?}")]
    NonFiniteBounds {
        /// X range.
        x: (f64, f64),
        /// Y range.
        y: (f64, f64),
    },
}

/// One drawn step series.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSeries {
    /// Legend label.
    pub label: String,
    /// CSS colour.
    pub color: String,
    /// Line width in pixels.
    pub stroke_width: f64,
    /// Breakpoint x values.
    pub x: Vec<f64>,
    /// Breakpoint y values.
    pub y: Vec<f64>,
}

/// An SVG plot under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPlot {
    /// Chart width in pixels.
    pub width: u32,
    /// Chart height in pixels.
    pub height: u32,
    /// Whether x values are log2 ratios.
    pub log_scale: bool,
    /// Draw the legend box.
    pub legend: bool,
    /// Visible x range.
    pub x_range: (f64, f64),
    /// Visible y range.
    pub y_range: (f64, f64),
    /// X-axis caption.
    pub x_label: String,
    /// Y-axis caption.
    pub y_label: String,
    /// Title.
    pub title: String,
    /// Series in insertion order.
    pub series: Vec<StepSeries>,
    palette: Vec<String>,
    stroke_width: f64,
}

/// Backend producing [`SvgPlot`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgBackend;

impl SvgBackend {
    /// Creates the backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PlotBackend for SvgBackend {
    type Plot = SvgPlot;
    type Error = SvgError;

    fn new_plot(&mut self, axes: &AxisOptions) -> Result<SvgPlot, SvgError> {
        let style = &axes.style;
        let palette = match style.get("palette") {
            Some(p) => {
                let colors: Vec<String> = p
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect();
                if colors.is_empty() {
                    return Err(invalid("palette", p));
                }
                colors
            }
            None => colors::ALL.iter().map(|c| (*c).to_string()).collect(),
        };

        Ok(SvgPlot {
            width: parse_style(style, "width", 700_u32)?,
            height: parse_style(style, "height", 450_u32)?,
            log_scale: axes.log_scale,
            legend: parse_style(style, "legend", true)?,
            x_range: (0.0, 1.0),
            y_range: (0.0, 1.1),
            x_label: String::new(),
            y_label: String::new(),
            title: String::new(),
            series: Vec::new(),
            palette,
            stroke_width: parse_style(style, "stroke_width", 2.5_f64)?,
        })
    }

    fn add_step_series(
        &mut self,
        plot: &mut SvgPlot,
        x: &[f64],
        y: &[f64],
        label: &str,
        style: &StyleOptions,
    ) -> Result<(), SvgError> {
        if x.len() != y.len() {
            return Err(SvgError::LengthMismatch {
                label: label.to_string(),
                x: x.len(),
                y: y.len(),
            });
        }
        let color = plot.palette[plot.series.len() % plot.palette.len()].clone();
        let stroke_width = parse_style(style, "stroke_width", plot.stroke_width)?;
        plot.series.push(StepSeries {
            label: label.to_string(),
            color,
            stroke_width,
            x: x.to_vec(),
            y: y.to_vec(),
        });
        Ok(())
    }

    fn set_axis_bounds(
        &mut self,
        plot: &mut SvgPlot,
        x: (f64, f64),
        y: (f64, f64),
    ) -> Result<(), SvgError> {
        if ![x.0, x.1, y.0, y.1, x.1 - x.0, y.1 - y.0]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(SvgError::NonFiniteBounds { x, y });
        }
        plot.x_range = x;
        plot.y_range = y;
        Ok(())
    }

    fn set_axis_labels(
        &mut self,
        plot: &mut SvgPlot,
        x_label: &str,
        y_label: &str,
    ) -> Result<(), SvgError> {
        plot.x_label = x_label.to_string();
        plot.y_label = y_label.to_string();
        Ok(())
    }

    fn set_title(&mut self, plot: &mut SvgPlot, title: &str) -> Result<(), SvgError> {
        plot.title = title.to_string();
        Ok(())
    }
}

impl SvgPlot {
    /// Writes the SVG document to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        std::fs::write(path, self.to_svg())?;
        Ok(())
    }

    /// Renders the SVG document.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let mut svg = String::with_capacity(8192);

        let width = self.width.max(MARGIN_LEFT + MARGIN_RIGHT + 10);
        let height = self.height.max(MARGIN_TOP + MARGIN_BOTTOM + 10);
        let plot_width = width - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_height = height - MARGIN_TOP - MARGIN_BOTTOM;

        let (min_x, max_x) = widen(self.x_range);
        let (min_y, max_y) = widen(self.y_range);

        let scale_x = |v: f64| -> f64 {
            let v = v.clamp(min_x, max_x);
            f64::from(MARGIN_LEFT) + (v - min_x) / (max_x - min_x) * f64::from(plot_width)
        };
        let scale_y = |v: f64| -> f64 {
            let v = v.clamp(min_y, max_y);
            f64::from(MARGIN_TOP) + (1.0 - (v - min_y) / (max_y - min_y)) * f64::from(plot_height)
        };

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}">"#,
            width, height
        );

        svg.push_str(
            r#"<style>
  :root {
    --bg-color: #ffffff;
    --text-color: #1a1a1a;
    --grid-color: #e0e0e0;
    --axis-color: #333333;
    --legend-bg: #ffffff;
    --legend-border: #cccccc;
  }
  @media (prefers-color-scheme: dark) {
    :root {
      --bg-color: #1a1a1a;
      --text-color: #e0e0e0;
      --grid-color: #404040;
      --axis-color: #b0b0b0;
      --legend-bg: #2a2a2a;
      --legend-border: #505050;
    }
  }
  .background { fill: var(--bg-color); }
  .title { font: bold 18px system-ui, sans-serif; fill: var(--text-color); }
  .axis-label { font: 13px system-ui, sans-serif; fill: var(--text-color); }
  .tick-label { font: 11px system-ui, sans-serif; fill: var(--text-color); }
  .legend { font: 13px system-ui, sans-serif; fill: var(--text-color); }
  .grid { stroke: var(--grid-color); stroke-width: 1; }
  .axis { stroke: var(--axis-color); stroke-width: 1.5; }
  .legend-bg { fill: var(--legend-bg); stroke: var(--legend-border); }
</style>
"#,
        );

        let _ = writeln!(
            svg,
            r#"<rect class="background" width="{}" height="{}"/>"#,
            width, height
        );

        if !self.title.is_empty() {
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="30" text-anchor="middle" class="title">{}</text>"#,
                f64::from(width) / 2.0,
                escape(&self.title)
            );
        }

        // Grid and ticks
        for (value, label) in x_ticks(min_x, max_x, self.log_scale) {
            let x = scale_x(value);
            let _ = writeln!(
                svg,
                r#"<line x1="{:.2}" y1="{}" x2="{:.2}" y2="{}" class="grid"/>"#,
                x,
                MARGIN_TOP,
                x,
                height - MARGIN_BOTTOM
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.2}" y="{}" text-anchor="middle" class="tick-label">{}</text>"#,
                x,
                height - MARGIN_BOTTOM + 20,
                label
            );
        }
        for i in 0..=5 {
            let y_val = min_y + f64::from(i) / 5.0 * (max_y - min_y);
            let y = scale_y(y_val);
            let _ = writeln!(
                svg,
                r#"<line x1="{}" y1="{:.2}" x2="{}" y2="{:.2}" class="grid"/>"#,
                MARGIN_LEFT,
                y,
                width - MARGIN_RIGHT,
                y
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{:.2}" text-anchor="end" class="tick-label">{:.2}</text>"#,
                MARGIN_LEFT - 10,
                y + 4.0,
                y_val
            );
        }

        // Axes
        let _ = writeln!(
            svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>"#,
            MARGIN_LEFT,
            height - MARGIN_BOTTOM,
            width - MARGIN_RIGHT,
            height - MARGIN_BOTTOM
        );
        let _ = writeln!(
            svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>"#,
            MARGIN_LEFT,
            MARGIN_TOP,
            MARGIN_LEFT,
            height - MARGIN_BOTTOM
        );

        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle" class="axis-label">{}</text>"#,
            f64::from(width) / 2.0,
            height - 20,
            escape(&self.x_label)
        );
        let _ = writeln!(
            svg,
            r#"<text x="25" y="{}" text-anchor="middle" class="axis-label" transform="rotate(-90 25 {})">{}</text>"#,
            f64::from(height) / 2.0,
            f64::from(height) / 2.0,
            escape(&self.y_label)
        );

        // Step series, post-step: y[i] holds until x[i + 1]
        for s in self.series.iter().filter(|s| !s.x.is_empty()) {
            let mut path = String::new();
            let _ = write!(path, "M {:.2},{:.2}", scale_x(s.x[0]), scale_y(0.0));
            for (i, (&x, &y)) in s.x.iter().zip(&s.y).enumerate() {
                if i > 0 {
                    let _ = write!(path, " H {:.2}", scale_x(x));
                }
                let _ = write!(path, " V {:.2}", scale_y(y));
            }
            let _ = write!(path, " H {:.2}", scale_x(max_x));
            let _ = writeln!(
                svg,
                r#"<path d="{}" stroke="{}" stroke-width="{}" fill="none"/>"#,
                path, s.color, s.stroke_width
            );
        }

        if self.legend && !self.series.is_empty() {
            let legend_x = width - MARGIN_RIGHT + 15;
            let legend_y = MARGIN_TOP + 20;
            let legend_height = 20 + self.series.len() as u32 * 25;

            let _ = writeln!(
                svg,
                r#"<rect x="{}" y="{}" width="115" height="{}" rx="4" class="legend-bg"/>"#,
                legend_x,
                legend_y - 15,
                legend_height
            );

            for (i, s) in self.series.iter().enumerate() {
                let y_offset = legend_y + i as u32 * 25;
                let _ = writeln!(
                    svg,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="3"/>"#,
                    legend_x + 8,
                    y_offset + 5,
                    legend_x + 22,
                    y_offset + 5,
                    s.color
                );
                let _ = writeln!(
                    svg,
                    r#"<text x="{}" y="{}" class="legend">{}</text>"#,
                    legend_x + 28,
                    y_offset + 9,
                    escape(&s.label)
                );
            }
        }

        svg.push_str("</svg>\n");
        svg
    }
}

/// Expands an empty or inverted range so scaling never divides by zero.
fn widen((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo { (lo, hi) } else { (lo - 0.5, lo + 0.5) }
}

/// X tick positions and labels.
///
/// Log-scale axes get integer exponents labelled as powers of two when the
/// range spans at least one; otherwise six evenly spaced ticks.
fn x_ticks(min_x: f64, max_x: f64, log_scale: bool) -> Vec<(f64, String)> {
    if log_scale && max_x - min_x >= 1.0 {
        // + 0.0 turns -0 into 0
        let first = min_x.ceil() + 0.0;
        let last = max_x.floor();
        let step = ((last - first) / 8.0).floor().max(1.0);
        return (0..=16)
            .map(|i| first + f64::from(i) * step)
            .take_while(|&k| k <= last)
            .map(|k| (k, format!("2^{k}")))
            .collect();
    }
    (0..=5)
        .map(|i| {
            let v = min_x + f64::from(i) / 5.0 * (max_x - min_x);
            let label = if log_scale {
                format!("{:.2}", v.exp2())
            } else {
                format!("{v:.2}")
            };
            (v, label)
        })
        .collect()
}

fn parse_style<T: std::str::FromStr>(
    style: &StyleOptions,
    key: &str,
    default: T,
) -> Result<T, SvgError> {
    match style.get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| invalid(key, raw)),
        None => Ok(default),
    }
}

fn invalid(key: &str, value: &str) -> SvgError {
    SvgError::InvalidStyle {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Default colour palette, cycled per series.
pub mod colors {
    /// Red.
    pub const RED: &str = "#e74c3c";
    /// Blue.
    pub const BLUE: &str = "#3498db";
    /// Green.
    pub const GREEN: &str = "#27ae60";
    /// Orange.
    pub const ORANGE: &str = "#e67e22";
    /// Purple.
    pub const PURPLE: &str = "#9b59b6";
    /// Teal.
    pub const TEAL: &str = "#16a085";
    /// Grey.
    pub const GREY: &str = "#7f8c8d";

    /// All colours in cycling order.
    pub const ALL: [&str; 7] = [RED, BLUE, GREEN, ORANGE, PURPLE, TEAL, GREY];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plot_with(style: StyleOptions) -> (SvgBackend, SvgPlot) {
        let mut backend = SvgBackend::new();
        let plot = backend
            .new_plot(&AxisOptions {
                log_scale: false,
                style,
            })
            .unwrap();
        (backend, plot)
    }

    #[test]
    fn test_render_basic() {
        let (mut backend, mut plot) = plot_with(StyleOptions::new());
        backend
            .add_step_series(&mut plot, &[1.0, 2.0], &[0.5, 1.0], "Solver A", &StyleOptions::new())
            .unwrap();
        backend.set_axis_bounds(&mut plot, (1.0, 2.2), (0.0, 1.1)).unwrap();
        backend
            .set_axis_labels(&mut plot, "Within this factor of the best", "Proportion of problems")
            .unwrap();
        backend.set_title(&mut plot, "Runtime").unwrap();

        let svg = plot.to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>\n"));
        assert!(svg.contains("Runtime"));
        assert!(svg.contains("Solver A"));
        assert!(svg.contains("Proportion of problems"));
        assert!(svg.contains(colors::RED));
        assert_eq!(svg.matches("<path").count(), 1);
    }

    #[test]
    fn test_palette_cycles() {
        let style = StyleOptions::new().with("palette", "#111, #222");
        let (mut backend, mut plot) = plot_with(style);
        for label in ["a", "b", "c"] {
            backend
                .add_step_series(&mut plot, &[1.0], &[1.0], label, &StyleOptions::new())
                .unwrap();
        }
        let colors: Vec<_> = plot.series.iter().map(|s| s.color.as_str()).collect();
        assert_eq!(colors, vec!["#111", "#222", "#111"]);
    }

    #[test]
    fn test_style_keys() {
        let style = StyleOptions::new()
            .with("width", "900")
            .with("legend", "false")
            .with("stroke_width", "1.5")
            .with("marker", "ignored");
        let (mut backend, mut plot) = plot_with(style.clone());
        assert_eq!(plot.width, 900);
        assert!(!plot.legend);
        backend
            .add_step_series(&mut plot, &[1.0], &[1.0], "a", &style)
            .unwrap();
        assert_eq!(plot.series[0].stroke_width, 1.5);
        assert!(!plot.to_svg().contains("legend-bg\""));
    }

    #[test]
    fn test_invalid_style() {
        let mut backend = SvgBackend::new();
        let err = backend
            .new_plot(&AxisOptions {
                log_scale: false,
                style: StyleOptions::new().with("width", "wide"),
            })
            .unwrap_err();
        assert!(matches!(err, SvgError::InvalidStyle { ref key, .. } if key == "width"));
    }

    #[test]
    fn test_length_mismatch() {
        let (mut backend, mut plot) = plot_with(StyleOptions::new());
        let err = backend
            .add_step_series(&mut plot, &[1.0, 2.0], &[1.0], "a", &StyleOptions::new())
            .unwrap_err();
        assert!(matches!(err, SvgError::LengthMismatch { x: 2, y: 1, .. }));
    }

    #[test]
    fn test_non_finite_bounds() {
        let (mut backend, mut plot) = plot_with(StyleOptions::new());
        assert!(backend
            .set_axis_bounds(&mut plot, (0.0, f64::NAN), (0.0, 1.1))
            .is_err());
    }

    #[test]
    fn test_degenerate_range_renders() {
        let (mut backend, mut plot) = plot_with(StyleOptions::new());
        backend
            .add_step_series(&mut plot, &[0.0], &[1.0], "a", &StyleOptions::new())
            .unwrap();
        backend.set_axis_bounds(&mut plot, (0.0, 0.0), (0.0, 1.1)).unwrap();
        let svg = plot.to_svg();
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }

    #[test]
    fn test_labels_escaped() {
        let (mut backend, mut plot) = plot_with(StyleOptions::new());
        backend
            .add_step_series(&mut plot, &[1.0], &[1.0], "a<b>&c", &StyleOptions::new())
            .unwrap();
        let svg = plot.to_svg();
        assert!(svg.contains("a&lt;b&gt;&amp;c"));
    }

    #[test]
    fn test_log_ticks() {
        let ticks = x_ticks(0.0, 3.3, true);
        let labels: Vec<_> = ticks.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(labels, vec!["2^0", "2^1", "2^2", "2^3"]);

        let linear = x_ticks(1.0, 2.0, false);
        assert_eq!(linear.len(), 6);
        assert_eq!(linear[0].1, "1.00");
    }

    #[test]
    fn test_log_ticks_wide_range() {
        let ticks = x_ticks(-1e300, 1e300, true);
        assert!(!ticks.is_empty() && ticks.len() <= 17);
        assert!(ticks.iter().all(|(v, _)| (-1e300..=1e300).contains(v)));

        let labels: Vec<_> = x_ticks(-0.5, 1.0, true).into_iter().map(|(_, l)| l).collect();
        assert_eq!(labels, vec!["2^0", "2^1"]);

        let ticks = x_ticks(0.0, 20.0, true);
        let values: Vec<f64> = ticks.iter().map(|(v, _)| *v).collect();
        assert_eq!(values, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0]);
    }

    #[test]
    fn test_wide_log_bounds_render() {
        let mut backend = SvgBackend::new();
        let mut plot = backend
            .new_plot(&AxisOptions {
                log_scale: true,
                style: StyleOptions::new(),
            })
            .unwrap();
        backend
            .add_step_series(&mut plot, &[0.0, 1.0], &[0.5, 1.0], "a", &StyleOptions::new())
            .unwrap();
        backend.set_axis_bounds(&mut plot, (-1e300, 1e300), (0.0, 1.1)).unwrap();
        let svg = plot.to_svg();
        assert!(svg.ends_with("</svg>\n"));
        assert!(!svg.contains("NaN"));

        assert!(matches!(
            backend.set_axis_bounds(&mut plot, (-f64::MAX, f64::MAX), (0.0, 1.1)),
            Err(SvgError::NonFiniteBounds { .. })
        ));
    }

    #[test]
    fn test_save() {
        let (mut backend, mut plot) = plot_with(StyleOptions::new());
        backend
            .add_step_series(&mut plot, &[1.0], &[1.0], "a", &StyleOptions::new())
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.svg");
        plot.save(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, plot.to_svg());
    }
}
