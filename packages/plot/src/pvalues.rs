//! -log10 p-value timeline with the Benjamini-Hochberg threshold and
//! intervention date markers.
//!
//! Zero p-values are treated as missing before the log transform (a
//! windowed exact test reporting exactly zero means "below resolution",
//! not a plottable point), matching how the field figures were built.

use std::path::Path;

use plotters::prelude::*;

use crate::{BLUE, ChartConfig, PlotError, SKY_BLUE, VERMILION, is_svg, segments};

/// Data for the p-value timeline: two observed series over common row
/// labels.
pub struct PvalueTimeline<'a> {
    /// Per-row labels (dates), drawn on the x axis.
    pub labels: &'a [String],
    /// Treatment p-values, `None` where undefined.
    pub treatment: &'a [Option<f64>],
    /// Control (comparison year) p-values, `None` where undefined.
    pub control: &'a [Option<f64>],
    /// Benjamini-Hochberg corrected p-value threshold (untransformed).
    pub bh_threshold: f64,
    /// Labels to mark with dashed vertical lines.
    pub highlight_labels: &'a [String],
}

fn neg_log10(series: &[Option<f64>]) -> Vec<Option<f64>> {
    series
        .iter()
        .map(|v| {
            v.and_then(|p| if p > 0.0 { Some(-p.log10()) } else { None })
        })
        .collect()
}

/// Renders the timeline to `path` (SVG or bitmap by extension).
///
/// # Errors
///
/// Returns [`PlotError::Empty`] when there are no labels, or
/// [`PlotError::Render`] when the backend fails.
pub fn render_pvalue_timeline(
    path: &Path,
    data: &PvalueTimeline<'_>,
    config: &ChartConfig,
) -> Result<(), PlotError> {
    if data.labels.is_empty() {
        return Err(PlotError::Empty {
            reason: "no report rows",
        });
    }

    if is_svg(path) {
        let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
        draw(&root, data, config).map_err(|e| PlotError::render(path, e))?;
        root.present().map_err(|e| PlotError::render(path, e))
    } else {
        let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
        draw(&root, data, config).map_err(|e| PlotError::render(path, e))?;
        root.present().map_err(|e| PlotError::render(path, e))
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    data: &PvalueTimeline<'_>,
    config: &ChartConfig,
) -> Result<(), String> {
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let n = data.labels.len() as i32;
    let (y_min, y_max) = config.pvalue_y_range;

    let mut chart = ChartBuilder::on(root)
        .caption(
            "Fisher's exact test p-value distributions",
            ("sans-serif", config.title_font_size),
        )
        .margin(10)
        .x_label_area_size(80)
        .y_label_area_size(60)
        .build_cartesian_2d(0..n, y_min..y_max)
        .map_err(|e| e.to_string())?;

    let tick_every = config.x_tick_interval.max(1) as i32;
    chart
        .configure_mesh()
        .x_labels(data.labels.len())
        .x_label_formatter(&|x| {
            if x % tick_every == 0 {
                data.labels
                    .get(*x as usize)
                    .map(String::as_str)
                    .unwrap_or("")
                    .to_string()
            } else {
                String::new()
            }
        })
        .x_desc("Exposure window start date")
        .y_desc("Fisher's exact -log10(p-value)")
        .axis_desc_style(("sans-serif", config.axis_font_size))
        .label_style(("sans-serif", config.tick_font_size))
        .draw()
        .map_err(|e| e.to_string())?;

    let line_width = config.line_width;
    for (series, color, label) in [
        (data.control, SKY_BLUE, "Comparison-year cases"),
        (data.treatment, VERMILION, "Intervention-year cases"),
    ] {
        let mut first = true;
        for run in segments(&neg_log10(series)) {
            let drawn = chart
                .draw_series(LineSeries::new(run, color.stroke_width(line_width)))
                .map_err(|e| e.to_string())?;
            if first {
                drawn.label(label).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(line_width))
                });
                first = false;
            }
        }
    }

    // BH threshold as a dashed horizontal line; when nothing passed the
    // correction the threshold is drawn at the top of the axis.
    let bh_y = if data.bh_threshold > 0.0 {
        -data.bh_threshold.log10()
    } else {
        y_max
    };
    if bh_y.is_finite() {
        chart
            .draw_series(DashedLineSeries::new(
                [(0, bh_y), (n - 1, bh_y)],
                8,
                5,
                BLACK.stroke_width(2).into(),
            ))
            .map_err(|e| e.to_string())?
            .label("BH corrected threshold")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));
    }

    let mut highlight_in_legend = false;
    for (idx, label) in data.labels.iter().enumerate() {
        if data.highlight_labels.iter().any(|h| h == label) {
            let drawn = chart
                .draw_series(DashedLineSeries::new(
                    [(idx as i32, y_min), (idx as i32, y_max)],
                    6,
                    4,
                    BLUE.stroke_width(2).into(),
                ))
                .map_err(|e| e.to_string())?;
            if !highlight_in_legend {
                drawn.label("Start/end of intervention").legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2))
                });
                highlight_in_legend = true;
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.7))
        .border_style(BLACK)
        .label_font(("sans-serif", config.legend_font_size))
        .draw()
        .map_err(|e| e.to_string())?;

    Ok(())
}
