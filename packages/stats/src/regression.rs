//! Ordinary least squares for the scatter-comparison chart.
//!
//! A single-predictor fit with the t-based slope test and the pointwise
//! 95% confidence band used when comparing imputed against observed
//! surveillance series.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::StatsError;

/// A fitted simple linear regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Slope of the fitted line.
    pub slope: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Two-sided p-value for the slope differing from zero.
    pub p_value: f64,
    /// Standard error of the slope.
    pub std_err: f64,
}

impl LinearFit {
    /// Predicted value at `x`.
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope.mul_add(x, self.intercept)
    }
}

fn t_quantile(df: f64, p: f64) -> f64 {
    StudentsT::new(0.0, 1.0, df).map_or(f64::NAN, |t| t.inverse_cdf(p))
}

fn t_sf(df: f64, x: f64) -> f64 {
    StudentsT::new(0.0, 1.0, df).map_or(f64::NAN, |t| 1.0 - t.cdf(x))
}

/// Fits `y = slope * x + intercept` by ordinary least squares.
///
/// # Errors
///
/// Returns [`StatsError::TooFewObservations`] when fewer than three
/// paired observations are supplied (the residual t-test needs
/// `n - 2 > 0`), or [`StatsError::EmptyGroup`] when the two slices
/// differ in length.
#[allow(clippy::cast_precision_loss)]
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<LinearFit, StatsError> {
    if x.len() != y.len() {
        return Err(StatsError::EmptyGroup);
    }
    if x.len() < 3 {
        return Err(StatsError::TooFewObservations {
            needed: 3,
            got: x.len(),
        });
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let sxx: f64 = x.iter().map(|&v| (v - mean_x).powi(2)).sum();
    let syy: f64 = y.iter().map(|&v| (v - mean_y).powi(2)).sum();
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(&xv, &yv)| (xv - mean_x) * (yv - mean_y))
        .sum();

    // Degenerate predictor: every x identical, slope undefined.
    if sxx == 0.0 {
        return Err(StatsError::TooFewObservations { needed: 2, got: 1 });
    }

    let slope = sxy / sxx;
    let intercept = slope.mul_add(-mean_x, mean_y);

    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(&xv, &yv)| {
            let predicted = slope.mul_add(xv, intercept);
            (yv - predicted).powi(2)
        })
        .sum();

    let df = n - 2.0;
    let r_squared = if syy == 0.0 { 1.0 } else { 1.0 - sse / syy };
    let std_err = (sse / df / sxx).sqrt();
    let p_value = if std_err == 0.0 {
        0.0
    } else {
        (2.0 * t_sf(df, (slope / std_err).abs())).min(1.0)
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_squared,
        p_value,
        std_err,
    })
}

/// Pointwise 95% confidence half-widths of the fitted mean at each `x`.
///
/// # Errors
///
/// Propagates the input conditions of [`linear_fit`].
#[allow(clippy::cast_precision_loss)]
pub fn confidence_band(x: &[f64], y: &[f64], fit: &LinearFit) -> Result<Vec<f64>, StatsError> {
    if x.len() != y.len() {
        return Err(StatsError::EmptyGroup);
    }
    if x.len() < 3 {
        return Err(StatsError::TooFewObservations {
            needed: 3,
            got: x.len(),
        });
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let sxx: f64 = x.iter().map(|&v| (v - mean_x).powi(2)).sum();
    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(&xv, &yv)| (yv - fit.predict(xv)).powi(2))
        .sum();

    let df = n - 2.0;
    let se = (sse / df).sqrt();
    let t_crit = t_quantile(df, 0.975);

    Ok(x.iter()
        .map(|&xv| t_crit * se * (1.0 / n + (xv - mean_x).powi(2) / sxx).sqrt())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_recovers_parameters() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = x.iter().map(|&v| 2.0_f64.mul_add(v, 1.0)).collect();
        let fit = linear_fit(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 1.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
        assert!(fit.p_value < 1e-6);
    }

    #[test]
    fn noisy_line_has_high_r_squared() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| 3.0_f64.mul_add(v, if i % 2 == 0 { 0.5 } else { -0.5 }))
            .collect();
        let fit = linear_fit(&x, &y).unwrap();
        assert!((fit.slope - 3.0).abs() < 0.05);
        assert!(fit.r_squared > 0.99);
    }

    #[test]
    fn too_few_points_is_an_error() {
        assert!(matches!(
            linear_fit(&[1.0, 2.0], &[1.0, 2.0]),
            Err(StatsError::TooFewObservations { needed: 3, got: 2 })
        ));
    }

    #[test]
    fn band_is_narrowest_at_mean_x() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.1, 1.1, 1.9, 3.2, 3.9];
        let fit = linear_fit(&x, &y).unwrap();
        let band = confidence_band(&x, &y, &fit).unwrap();
        // mean x = 2.0, index 2.
        for (i, half_width) in band.iter().enumerate() {
            assert!(half_width >= &band[2], "index {i}");
        }
    }
}
