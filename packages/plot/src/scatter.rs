//! Scatter plot with fitted regression line and pointwise 95%
//! confidence band, used to compare imputed against observed series.

use std::path::Path;

use plotters::prelude::*;

use crate::{ChartConfig, PlotError, VERMILION, is_svg};

/// Data for the comparison scatter: paired observations sorted by `x`,
/// the fitted values, and the half-width of the confidence band at each
/// point.
pub struct RegressionScatter<'a> {
    /// Predictor values, ascending.
    pub x: &'a [f64],
    /// Response values, paired with `x`.
    pub y: &'a [f64],
    /// Fitted value at each `x`.
    pub fitted: &'a [f64],
    /// Confidence band half-width at each `x`.
    pub band: &'a [f64],
    /// Coefficient of determination, shown in the legend.
    pub r_squared: f64,
    /// Slope p-value, shown in the legend.
    pub p_value: f64,
    /// X axis description.
    pub x_desc: &'a str,
    /// Y axis description.
    pub y_desc: &'a str,
}

/// Renders the scatter with its regression line and band to `path`.
///
/// # Errors
///
/// Returns [`PlotError::Empty`] when there are no points or the slices
/// disagree in length, or [`PlotError::Render`] when the backend fails.
pub fn render_regression_scatter(
    path: &Path,
    data: &RegressionScatter<'_>,
    config: &ChartConfig,
) -> Result<(), PlotError> {
    if data.x.is_empty()
        || data.x.len() != data.y.len()
        || data.x.len() != data.fitted.len()
        || data.x.len() != data.band.len()
    {
        return Err(PlotError::Empty {
            reason: "scatter needs equally sized, non-empty series",
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

fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    let pad = (hi - lo).abs().max(1e-9) * 0.05;
    (lo - pad, hi + pad)
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    data: &RegressionScatter<'_>,
    config: &ChartConfig,
) -> Result<(), String> {
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let (x_lo, x_hi) = span(data.x.iter().copied());
    let (y_lo, y_hi) = span(
        data.y
            .iter()
            .copied()
            .chain(
                data.fitted
                    .iter()
                    .zip(data.band)
                    .flat_map(|(&f, &b)| [f - b, f + b]),
            ),
    );

    let mut chart = ChartBuilder::on(root)
        .caption(
            "Scatterplot with linear regression line and 95% CI",
            ("sans-serif", config.title_font_size),
        )
        .margin(10)
        .x_label_area_size(70)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(|e| e.to_string())?;

    chart
        .configure_mesh()
        .x_desc(data.x_desc)
        .y_desc(data.y_desc)
        .axis_desc_style(("sans-serif", config.axis_font_size))
        .label_style(("sans-serif", config.tick_font_size))
        .draw()
        .map_err(|e| e.to_string())?;

    // Confidence band as a closed polygon: upper edge left to right,
    // lower edge back.
    let mut band_points: Vec<(f64, f64)> = data
        .x
        .iter()
        .zip(data.fitted.iter().zip(data.band))
        .map(|(&x, (&f, &b))| (x, f + b))
        .collect();
    band_points.extend(
        data.x
            .iter()
            .zip(data.fitted.iter().zip(data.band))
            .rev()
            .map(|(&x, (&f, &b))| (x, f - b)),
    );
    chart
        .draw_series(std::iter::once(Polygon::new(
            band_points,
            VERMILION.mix(0.2),
        )))
        .map_err(|e| e.to_string())?
        .label("95% CI")
        .legend(|(x, y)| {
            Rectangle::new([(x, y - 5), (x + 12, y + 5)], VERMILION.mix(0.2).filled())
        });

    let line_width = config.line_width;
    chart
        .draw_series(LineSeries::new(
            data.x.iter().zip(data.fitted).map(|(&x, &f)| (x, f)),
            VERMILION.stroke_width(line_width),
        ))
        .map_err(|e| e.to_string())?
        .label(format!(
            "Fit line (R\u{b2}={:.2}, p={:.3})",
            data.r_squared, data.p_value
        ))
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], VERMILION.stroke_width(line_width))
        });

    chart
        .draw_series(
            data.x
                .iter()
                .zip(data.y)
                .map(|(&x, &y)| Circle::new((x, y), 3, BLACK.filled())),
        )
        .map_err(|e| e.to_string())?
        .label("Data points")
        .legend(|(x, y)| Circle::new((x + 10, y), 3, BLACK.filled()));

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_svg() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0_f64.mul_add(*v, 1.0)).collect();
        let band = vec![0.5; 20];
        let data = RegressionScatter {
            x: &x,
            y: &y,
            fitted: &y,
            band: &band,
            r_squared: 1.0,
            p_value: 0.001,
            x_desc: "Imputed differences",
            y_desc: "Observed differences",
        };
        let path = std::env::temp_dir().join("epi_zone_scatter.svg");
        render_regression_scatter(&path, &data, &ChartConfig::default()).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("<svg"));
    }

    #[test]
    fn mismatched_lengths_are_an_error() {
        let data = RegressionScatter {
            x: &[1.0, 2.0],
            y: &[1.0],
            fitted: &[1.0, 2.0],
            band: &[0.1, 0.1],
            r_squared: 0.0,
            p_value: 1.0,
            x_desc: "x",
            y_desc: "y",
        };
        let path = std::env::temp_dir().join("epi_zone_scatter_bad.svg");
        assert!(matches!(
            render_regression_scatter(&path, &data, &ChartConfig::default()),
            Err(PlotError::Empty { .. })
        ));
    }
}
