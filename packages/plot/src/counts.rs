//! Raw case count timeline: treatment and control zone counts on the
//! primary axis, total cases per window on a secondary axis, dashed
//! vertical markers at the intervention dates.

use std::path::Path;

use epi_zone_models::report::WindowRow;
use plotters::prelude::*;

use crate::{BLUE, ChartConfig, ORANGE, PlotError, SKY_BLUE, VERMILION, is_svg};

/// Renders the count timeline to `path` (SVG or bitmap by extension).
///
/// `highlight_labels` marks window rows (by exact label match) with
/// dashed vertical lines, e.g. the intervention start and end dates.
///
/// # Errors
///
/// Returns [`PlotError::Empty`] when `rows` is empty, or
/// [`PlotError::Render`] when the backend fails.
pub fn render_counts(
    path: &Path,
    rows: &[WindowRow],
    highlight_labels: &[String],
    config: &ChartConfig,
) -> Result<(), PlotError> {
    if rows.is_empty() {
        return Err(PlotError::Empty {
            reason: "no window rows",
        });
    }

    if is_svg(path) {
        let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
        draw(&root, rows, highlight_labels, config).map_err(|e| PlotError::render(path, e))?;
        root.present().map_err(|e| PlotError::render(path, e))
    } else {
        let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
        draw(&root, rows, highlight_labels, config).map_err(|e| PlotError::render(path, e))?;
        root.present().map_err(|e| PlotError::render(path, e))
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    rows: &[WindowRow],
    highlight_labels: &[String],
    config: &ChartConfig,
) -> Result<(), String> {
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let n = rows.len() as i32;
    let zone_max = rows
        .iter()
        .map(|r| r.in_treatment.max(r.in_control))
        .max()
        .unwrap_or(1) as f64
        * 1.15
        + 1.0;
    let total_max = rows.iter().map(|r| r.total).max().unwrap_or(1) as f64 * 1.15 + 1.0;

    let mut chart = ChartBuilder::on(root)
        .caption(
            "Raw Case Counts in Treatment and Control Zones",
            ("sans-serif", config.title_font_size),
        )
        .margin(10)
        .x_label_area_size(80)
        .y_label_area_size(60)
        .right_y_label_area_size(60)
        .build_cartesian_2d(0..n, 0.0..zone_max)
        .map_err(|e| e.to_string())?
        .set_secondary_coord(0..n, 0.0..total_max);

    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    let tick_every = config.x_tick_interval.max(1) as i32;
    chart
        .configure_mesh()
        .x_labels(rows.len())
        .x_label_formatter(&|x| {
            if x % tick_every == 0 {
                labels.get(*x as usize).copied().unwrap_or("").to_string()
            } else {
                String::new()
            }
        })
        .y_desc("Number of cases per window")
        .axis_desc_style(("sans-serif", config.axis_font_size))
        .label_style(("sans-serif", config.tick_font_size))
        .draw()
        .map_err(|e| e.to_string())?;

    chart
        .configure_secondary_axes()
        .y_desc("Total cases per window")
        .axis_desc_style(("sans-serif", config.axis_font_size))
        .label_style(("sans-serif", config.tick_font_size))
        .draw()
        .map_err(|e| e.to_string())?;

    let line_width = config.line_width;
    chart
        .draw_series(LineSeries::new(
            rows.iter()
                .enumerate()
                .map(|(i, r)| (i as i32, r.in_treatment as f64)),
            VERMILION.stroke_width(line_width),
        ))
        .map_err(|e| e.to_string())?
        .label("Cases in treatment zones (left y-axis)")
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], VERMILION.stroke_width(line_width))
        });

    chart
        .draw_series(LineSeries::new(
            rows.iter()
                .enumerate()
                .map(|(i, r)| (i as i32, r.in_control as f64)),
            SKY_BLUE.stroke_width(line_width),
        ))
        .map_err(|e| e.to_string())?
        .label("Cases in control zones (left y-axis)")
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], SKY_BLUE.stroke_width(line_width))
        });

    chart
        .draw_secondary_series(LineSeries::new(
            rows.iter()
                .enumerate()
                .map(|(i, r)| (i as i32, r.total as f64)),
            ORANGE.stroke_width(line_width),
        ))
        .map_err(|e| e.to_string())?
        .label("Total cases per window (right y-axis)")
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], ORANGE.stroke_width(line_width))
        });

    for (idx, row) in rows.iter().enumerate() {
        if highlight_labels.iter().any(|h| h == &row.label) {
            chart
                .draw_series(DashedLineSeries::new(
                    [(idx as i32, 0.0), (idx as i32, zone_max)],
                    6,
                    4,
                    BLUE.stroke_width(2).into(),
                ))
                .map_err(|e| e.to_string())?;
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
