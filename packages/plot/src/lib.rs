#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Publication chart rendering for the evaluation reports.
//!
//! Renders the figures the field write-ups use: zone count timelines,
//! -log10 p-value timelines with the Benjamini-Hochberg threshold,
//! permutation null-distribution histograms, proximity boxplots, and
//! the imputed-versus-observed scatter with its regression band. Output
//! format follows the file extension: `.svg` gets a vector backend,
//! anything else a bitmap backend.
//!
//! All styling flows through [`ChartConfig`]; chart functions take data
//! and configuration and have no other knobs.

pub mod boxplot;
pub mod counts;
pub mod histogram;
pub mod pvalues;
pub mod scatter;

use std::path::Path;

use plotters::style::RGBColor;
use thiserror::Error;

/// Okabe-Ito vermilion, used for treatment series.
pub const VERMILION: RGBColor = RGBColor(0xD5, 0x5E, 0x00);
/// Okabe-Ito sky blue, used for control series.
pub const SKY_BLUE: RGBColor = RGBColor(0x56, 0xB4, 0xE9);
/// Okabe-Ito orange, used for totals.
pub const ORANGE: RGBColor = RGBColor(0xE6, 0x9F, 0x00);
/// Okabe-Ito blue, used for intervention date markers.
pub const BLUE: RGBColor = RGBColor(0x00, 0x72, 0xB2);
/// Okabe-Ito reddish purple, used for auxiliary series.
pub const REDDISH_PURPLE: RGBColor = RGBColor(0xCC, 0x79, 0xA7);

/// Styling configuration shared by every chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Title font size.
    pub title_font_size: u32,
    /// Axis description font size.
    pub axis_font_size: u32,
    /// Tick label font size.
    pub tick_font_size: u32,
    /// Legend font size.
    pub legend_font_size: u32,
    /// Series line width.
    pub line_width: u32,
    /// Draw every n-th x tick label.
    pub x_tick_interval: usize,
    /// Fixed y range for the p-value timeline.
    pub pvalue_y_range: (f64, f64),
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            title_font_size: 20,
            axis_font_size: 20,
            tick_font_size: 14,
            legend_font_size: 15,
            line_width: 3,
            x_tick_interval: 5,
            pvalue_y_range: (-0.1, 2.5),
        }
    }
}

/// Errors from chart rendering.
#[derive(Debug, Error)]
pub enum PlotError {
    /// The drawing backend failed.
    #[error("failed to render {path}: {message}")]
    Render {
        /// Output path of the chart.
        path: String,
        /// Backend error description.
        message: String,
    },

    /// There was nothing to draw.
    #[error("nothing to plot: {reason}")]
    Empty {
        /// Why the chart would have been empty.
        reason: &'static str,
    },
}

impl PlotError {
    pub(crate) fn render(path: &Path, message: impl std::fmt::Display) -> Self {
        Self::Render {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}

/// Whether `path` selects the vector backend.
pub(crate) fn is_svg(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// Splits an optional series into contiguous runs of present points for
/// line drawing; gaps stay gaps instead of being bridged.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) fn segments(series: &[Option<f64>]) -> Vec<Vec<(i32, f64)>> {
    let mut runs = Vec::new();
    let mut current: Vec<(i32, f64)> = Vec::new();
    for (i, value) in series.iter().enumerate() {
        match value {
            Some(v) if v.is_finite() => current.push((i as i32, *v)),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}
