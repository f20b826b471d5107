//! Permutation null-distribution histogram with the observed statistic
//! marked.

use std::path::Path;

use plotters::prelude::*;

use crate::{ChartConfig, PlotError, SKY_BLUE, VERMILION, is_svg};

const N_BINS: usize = 20;

/// Renders the null-distribution histogram to `path`.
///
/// # Errors
///
/// Returns [`PlotError::Empty`] when `null` is empty (nothing to bin),
/// or [`PlotError::Render`] when the backend fails.
pub fn render_null_histogram(
    path: &Path,
    null: &[f64],
    observed: f64,
    config: &ChartConfig,
) -> Result<(), PlotError> {
    if null.is_empty() {
        return Err(PlotError::Empty {
            reason: "empty null distribution",
        });
    }

    if is_svg(path) {
        let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
        draw(&root, null, observed, config).map_err(|e| PlotError::render(path, e))?;
        root.present().map_err(|e| PlotError::render(path, e))
    } else {
        let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
        draw(&root, null, observed, config).map_err(|e| PlotError::render(path, e))?;
        root.present().map_err(|e| PlotError::render(path, e))
    }
}

/// Equal-width bins over the span of the null distribution and the
/// observed statistic.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bins(null: &[f64], observed: f64) -> (Vec<(f64, f64, u64)>, f64) {
    let mut lo = observed;
    let mut hi = observed;
    for &v in null {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if hi <= lo {
        hi = lo + 1.0;
    }
    let span = hi - lo;
    let width = span / N_BINS as f64;

    let mut counts = vec![0_u64; N_BINS];
    for &v in null {
        let idx = (((v - lo) / width) as usize).min(N_BINS - 1);
        counts[idx] += 1;
    }

    let bars = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let x0 = (i as f64).mul_add(width, lo);
            (x0, x0 + width, count)
        })
        .collect();
    let max_count = counts.iter().max().copied().unwrap_or(1) as f64;
    (bars, max_count)
}

#[allow(clippy::cast_precision_loss)]
fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    null: &[f64],
    observed: f64,
    config: &ChartConfig,
) -> Result<(), String> {
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let (bars, max_count) = bins(null, observed);
    let x_lo = bars.first().map_or(0.0, |b| b.0);
    let x_hi = bars.last().map_or(1.0, |b| b.1);
    let y_max = max_count * 1.1 + 1.0;

    let mut chart = ChartBuilder::on(root)
        .caption(
            "Distribution of test statistic (randomized vs actual)",
            ("sans-serif", config.title_font_size),
        )
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_max)
        .map_err(|e| e.to_string())?;

    chart
        .configure_mesh()
        .x_desc("Test statistic")
        .y_desc("Frequency")
        .axis_desc_style(("sans-serif", config.axis_font_size))
        .label_style(("sans-serif", config.tick_font_size))
        .draw()
        .map_err(|e| e.to_string())?;

    let n = null.len();
    chart
        .draw_series(bars.iter().map(|&(x0, x1, count)| {
            Rectangle::new([(x0, 0.0), (x1, count as f64)], SKY_BLUE.mix(0.6).filled())
        }))
        .map_err(|e| e.to_string())?
        .label(format!("Randomized runs (n={n})"))
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], SKY_BLUE.mix(0.6).filled()));

    chart
        .draw_series(DashedLineSeries::new(
            [(observed, 0.0), (observed, y_max)],
            8,
            5,
            VERMILION.stroke_width(config.line_width).into(),
        ))
        .map_err(|e| e.to_string())?
        .label("Statistic from actual data")
        .legend({
            let line_width = config.line_width;
            move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], VERMILION.stroke_width(line_width))
            }
        });

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.7))
        .border_style(BLACK)
        .label_font(("sans-serif", config.legend_font_size))
        .draw()
        .map_err(|e| e.to_string())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_cover_all_samples() {
        let null: Vec<f64> = (0..100).map(f64::from).collect();
        let (bars, max_count) = bins(&null, 50.0);
        assert_eq!(bars.len(), N_BINS);
        let total: u64 = bars.iter().map(|b| b.2).sum();
        assert_eq!(total, 100);
        assert!(max_count >= 5.0);
    }

    #[test]
    fn observed_outside_null_extends_range() {
        let null = [1.0, 2.0, 3.0];
        let (bars, _) = bins(&null, 10.0);
        assert!(bars.last().unwrap().1 >= 10.0);
    }

    #[test]
    fn renders_svg() {
        let null: Vec<f64> = (0..500).map(|i| f64::from(i % 47)).collect();
        let path = std::env::temp_dir().join("epi_zone_hist.svg");
        render_null_histogram(&path, &null, 40.0, &ChartConfig::default()).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("<svg"));
    }

    #[test]
    fn empty_null_is_an_error() {
        let path = std::env::temp_dir().join("epi_zone_hist_empty.svg");
        assert!(matches!(
            render_null_histogram(&path, &[], 1.0, &ChartConfig::default()),
            Err(PlotError::Empty { .. })
        ));
    }
}
