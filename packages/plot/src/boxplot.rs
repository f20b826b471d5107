//! Proximity boxplot: distance to the nearest site for cases within
//! versus outside the analysis window.

use std::path::Path;

use plotters::prelude::*;

use crate::{ChartConfig, PlotError, SKY_BLUE, VERMILION, is_svg};

const WITHIN_LABEL: &str = "Within window";
const OUTSIDE_LABEL: &str = "Outside window";

/// Renders the two-group proximity boxplot to `path`.
///
/// The chart title carries the U statistic and p-value, matching the
/// published figures.
///
/// # Errors
///
/// Returns [`PlotError::Empty`] when either group is empty, or
/// [`PlotError::Render`] when the backend fails.
pub fn render_proximity_boxplot(
    path: &Path,
    within: &[f64],
    outside: &[f64],
    u_statistic: f64,
    p_value: f64,
    config: &ChartConfig,
) -> Result<(), PlotError> {
    if within.is_empty() || outside.is_empty() {
        return Err(PlotError::Empty {
            reason: "both comparison groups need observations",
        });
    }

    if is_svg(path) {
        let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
        draw(&root, within, outside, u_statistic, p_value, config)
            .map_err(|e| PlotError::render(path, e))?;
        root.present().map_err(|e| PlotError::render(path, e))
    } else {
        let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
        draw(&root, within, outside, u_statistic, p_value, config)
            .map_err(|e| PlotError::render(path, e))?;
        root.present().map_err(|e| PlotError::render(path, e))
    }
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    within: &[f64],
    outside: &[f64],
    u_statistic: f64,
    p_value: f64,
    config: &ChartConfig,
) -> Result<(), String> {
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let y_max = (within
        .iter()
        .chain(outside)
        .copied()
        .fold(0.0_f64, f64::max)
        * 1.15
        + 0.1) as f32;

    let categories = [WITHIN_LABEL, OUTSIDE_LABEL];
    let title = format!(
        "Distance to treatment sites [MWU={u_statistic:.1}, p-value={p_value:.3}]"
    );

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", config.title_font_size))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(categories[..].into_segmented(), 0.0_f32..y_max)
        .map_err(|e| e.to_string())?;

    chart
        .configure_mesh()
        .x_desc("Class")
        .y_desc("Distance to nearest treatment site (kilometers)")
        .axis_desc_style(("sans-serif", config.axis_font_size))
        .label_style(("sans-serif", config.tick_font_size))
        .draw()
        .map_err(|e| e.to_string())?;

    let within_quartiles = Quartiles::new(within);
    let outside_quartiles = Quartiles::new(outside);

    chart
        .draw_series(vec![
            Boxplot::new_vertical(SegmentValue::CenterOf(&WITHIN_LABEL), &within_quartiles)
                .width(40)
                .style(VERMILION),
            Boxplot::new_vertical(SegmentValue::CenterOf(&OUTSIDE_LABEL), &outside_quartiles)
                .width(40)
                .style(SKY_BLUE),
        ])
        .map_err(|e| e.to_string())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_svg() {
        let within: Vec<f64> = (1..30).map(|i| f64::from(i) * 0.1).collect();
        let outside: Vec<f64> = (1..40).map(|i| f64::from(i) * 0.15).collect();
        let path = std::env::temp_dir().join("epi_zone_boxplot.svg");
        render_proximity_boxplot(&path, &within, &outside, 402.0, 0.714, &ChartConfig::default())
            .unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("<svg"));
    }

    #[test]
    fn empty_group_is_an_error() {
        let path = std::env::temp_dir().join("epi_zone_boxplot_empty.svg");
        assert!(matches!(
            render_proximity_boxplot(&path, &[], &[1.0], 0.0, 1.0, &ChartConfig::default()),
            Err(PlotError::Empty { .. })
        ));
    }
}
