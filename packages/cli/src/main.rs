#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the intervention evaluation toolchain.
//!
//! One subcommand per analysis: the windowed exact test, the
//! Mann-Whitney proximity comparison, the seeded randomization test,
//! the sliding-window report sweep, the empirical p-value report, and
//! the chart renderers that consume the report CSVs.

mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use epi_zone_models::{DistanceModel, SiteGroup, TimeWindow, ZoneConfig};
use epi_zone_plot::boxplot::render_proximity_boxplot;
use epi_zone_plot::counts::render_counts;
use epi_zone_plot::histogram::render_null_histogram;
use epi_zone_plot::pvalues::{PvalueTimeline, render_pvalue_timeline};
use epi_zone_plot::scatter::{RegressionScatter, render_regression_scatter};
use epi_zone_plot::ChartConfig;
use epi_zone_report::pvalues::{RandomizedRow, pvalue_report};
use epi_zone_report::sliding::{SlidingWindowParams, sliding_window_report};
use epi_zone_report::summary;
use epi_zone_report::writers::{write_pvalue_report, write_window_report};
use epi_zone_stats::classify::{classify_cases, proximity_to_nearest};
use epi_zone_stats::contingency::build_contingency_table;
use epi_zone_stats::fisher::exact_association_test;
use epi_zone_stats::multiplicity::benjamini_hochberg_threshold;
use epi_zone_stats::permutation::{permutation_null_distribution, split_by_window};
use epi_zone_stats::prevented::estimate_cases_prevented;
use epi_zone_stats::ranks::{empirical_p_value, mann_whitney_u};
use epi_zone_stats::regression::{confidence_band, linear_fit};

use crate::progress::IndicatifProgress;

#[derive(Parser)]
#[command(name = "epi_zone_cli", about = "Intervention evaluation toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fisher's exact test of zone association over a time window
    Fisher {
        /// Case table CSV (lat, lon, unix_time or Timestamp)
        cases: PathBuf,
        /// Treatment site CSV (lat, lon)
        treatment_sites: PathBuf,
        /// Control site CSV (lat, lon)
        control_sites: PathBuf,
        /// Window start (unix seconds, inclusive)
        start_unix: i64,
        /// Window end (unix seconds, inclusive)
        end_unix: i64,
        /// Zone radius in kilometers
        #[arg(long, default_value_t = 0.8)]
        zone_radius: f64,
        /// Distance convention (geodesic or flat-earth)
        #[arg(long, default_value = "geodesic")]
        distance: DistanceModel,
    },
    /// Mann-Whitney comparison of proximity within vs outside a window
    Mwu {
        /// Case table CSV
        cases: PathBuf,
        /// Site CSV to measure proximity against
        sites: PathBuf,
        /// Window start (unix seconds, inclusive)
        start_unix: i64,
        /// Window end (unix seconds, inclusive)
        end_unix: i64,
        /// Distance convention (geodesic or flat-earth)
        #[arg(long, default_value = "flat-earth")]
        distance: DistanceModel,
        /// Write a proximity boxplot to this path (.svg or .png)
        #[arg(long)]
        boxplot: Option<PathBuf>,
    },
    /// Randomization test: permute event times, rebuild the U statistic
    Randomize {
        /// Case table CSV
        cases: PathBuf,
        /// Site CSV to measure proximity against
        sites: PathBuf,
        /// Window start (unix seconds, inclusive)
        start_unix: i64,
        /// Window end (unix seconds, inclusive)
        end_unix: i64,
        /// Number of permutations
        #[arg(long, default_value_t = 1000)]
        permutations: usize,
        /// RNG seed for reproducible shuffles
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Distance convention (geodesic or flat-earth)
        #[arg(long, default_value = "flat-earth")]
        distance: DistanceModel,
        /// Write the null-distribution histogram to this path
        #[arg(long)]
        histogram: Option<PathBuf>,
    },
    /// Exact test over every position of a sliding window, to CSV
    SlidingWindow {
        /// Case table CSV
        cases: PathBuf,
        /// Treatment site CSV
        treatment_sites: PathBuf,
        /// Control site CSV
        control_sites: PathBuf,
        /// Output report CSV
        out: PathBuf,
        /// Window width in days
        #[arg(long, default_value_t = 70)]
        window_days: i64,
        /// Step between window starts in days
        #[arg(long, default_value_t = 1)]
        step_days: i64,
        /// Zone radius in kilometers
        #[arg(long, default_value_t = 0.8)]
        zone_radius: f64,
        /// Distance convention (geodesic or flat-earth)
        #[arg(long, default_value = "geodesic")]
        distance: DistanceModel,
    },
    /// Empirical p-value report from a wide randomization table
    PvalReport {
        /// Wide randomization table CSV
        table: PathBuf,
        /// Output report CSV
        out: PathBuf,
        /// Number of observed columns before the replicates
        #[arg(long, default_value_t = 2)]
        actual_columns: usize,
    },
    /// -log10 p-value timeline chart from a wide randomization table
    PvalPlot {
        /// Wide randomization table CSV (label, treatment, control, replicates)
        table: PathBuf,
        /// Output chart (.svg or .png)
        out: PathBuf,
        /// False-discovery rate for the Benjamini-Hochberg threshold
        #[arg(long, default_value_t = 0.05)]
        alpha: f64,
        /// Row labels to mark with vertical intervention lines
        #[arg(long)]
        highlight: Vec<String>,
    },
    /// Zone count timeline chart from a sliding-window report
    CountsPlot {
        /// Sliding-window report CSV
        report: PathBuf,
        /// Output chart (.svg or .png)
        out: PathBuf,
        /// Row labels to mark with vertical intervention lines
        #[arg(long)]
        highlight: Vec<String>,
    },
    /// Scatter with regression line and 95% CI band for two columns
    Compare {
        /// Input CSV
        data: PathBuf,
        /// Output chart (.svg or .png)
        out: PathBuf,
        /// Predictor column name
        #[arg(long)]
        x_column: String,
        /// Response column name
        #[arg(long)]
        y_column: String,
    },
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = values.len() as f64;
        values.iter().sum::<f64>() / n
    }
}

#[allow(clippy::too_many_lines)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fisher {
            cases,
            treatment_sites,
            control_sites,
            start_unix,
            end_unix,
            zone_radius,
            distance,
        } => {
            let cases = epi_zone_ingest::load_cases(&cases)?;
            let treatment = epi_zone_ingest::load_sites(&treatment_sites)?;
            let control = epi_zone_ingest::load_sites(&control_sites)?;
            let config = ZoneConfig {
                zone_radius_km: zone_radius,
                distance_model: distance,
            };

            let classified = classify_cases(&cases, &treatment, &control, &config)?;
            let table =
                build_contingency_table(&classified, TimeWindow::new(start_unix, end_unix))?;
            let test = exact_association_test(&table)?;
            let prevented = estimate_cases_prevented(&table);

            print!("{}", summary::exact_test_summary(&table, &test, &prevented));
        }
        Commands::Mwu {
            cases,
            sites,
            start_unix,
            end_unix,
            distance,
            boxplot,
        } => {
            let cases = epi_zone_ingest::load_cases(&cases)?;
            let sites = epi_zone_ingest::load_sites(&sites)?;
            let config = ZoneConfig {
                distance_model: distance,
                ..ZoneConfig::default()
            };

            let proximity =
                proximity_to_nearest(&cases, &sites, SiteGroup::Treatment, &config)?;
            let times: Vec<i64> = cases.iter().map(|c| c.event_time).collect();
            let (within, outside) =
                split_by_window(&proximity, &times, TimeWindow::new(start_unix, end_unix));
            let test = mann_whitney_u(&within, &outside)?;

            print!(
                "{}",
                summary::mann_whitney_summary(&test, mean(&within), mean(&outside))
            );

            if let Some(path) = boxplot {
                render_proximity_boxplot(
                    &path,
                    &within,
                    &outside,
                    test.u,
                    test.p_value,
                    &ChartConfig::default(),
                )?;
                log::info!("wrote boxplot to {}", path.display());
            }
        }
        Commands::Randomize {
            cases,
            sites,
            start_unix,
            end_unix,
            permutations,
            seed,
            distance,
            histogram,
        } => {
            let cases = epi_zone_ingest::load_cases(&cases)?;
            let sites = epi_zone_ingest::load_sites(&sites)?;
            let config = ZoneConfig {
                distance_model: distance,
                ..ZoneConfig::default()
            };
            let window = TimeWindow::new(start_unix, end_unix);

            let proximity =
                proximity_to_nearest(&cases, &sites, SiteGroup::Treatment, &config)?;
            let times: Vec<i64> = cases.iter().map(|c| c.event_time).collect();
            let (within, outside) = split_by_window(&proximity, &times, window);
            let observed = mann_whitney_u(&within, &outside)?;

            let bar = IndicatifProgress::permutations_bar("permuting event times");
            let null = permutation_null_distribution(
                &proximity,
                &times,
                window,
                |w, o| mann_whitney_u(w, o).map(|t| t.u),
                permutations,
                seed,
                &bar,
            );

            let empirical = empirical_p_value(&null, observed.u).ok();
            print!(
                "{}",
                summary::randomization_summary(&observed, empirical, null.len(), permutations)
            );

            if let Some(path) = histogram {
                if null.is_empty() {
                    log::warn!("skipping histogram: empty null distribution");
                } else {
                    render_null_histogram(&path, &null, observed.u, &ChartConfig::default())?;
                    log::info!("wrote histogram to {}", path.display());
                }
            }
        }
        Commands::SlidingWindow {
            cases,
            treatment_sites,
            control_sites,
            out,
            window_days,
            step_days,
            zone_radius,
            distance,
        } => {
            let cases = epi_zone_ingest::load_cases(&cases)?;
            let treatment = epi_zone_ingest::load_sites(&treatment_sites)?;
            let control = epi_zone_ingest::load_sites(&control_sites)?;
            let config = ZoneConfig {
                zone_radius_km: zone_radius,
                distance_model: distance,
            };
            let params = SlidingWindowParams {
                window_days,
                step_days,
            };

            let rows = sliding_window_report(&cases, &treatment, &control, &config, &params)?;
            write_window_report(&out, &rows)?;
            println!("Sliding-window report written to {}.", out.display());
        }
        Commands::PvalReport {
            table,
            out,
            actual_columns,
        } => {
            let table = epi_zone_ingest::load_randomization_table(&table, actual_columns)?;
            let replicate_rows: Vec<Vec<f64>> = table
                .random
                .iter()
                .map(|row| row.iter().copied().flatten().collect())
                .collect();
            let rows: Vec<RandomizedRow<'_>> = table
                .labels
                .iter()
                .enumerate()
                .map(|(i, label)| RandomizedRow {
                    label: label.as_str(),
                    treatment: table.actual[i].first().copied().flatten(),
                    control: table.actual[i].get(1).copied().flatten(),
                    replicates: &replicate_rows[i],
                })
                .collect();

            let report = pvalue_report(&rows);
            write_pvalue_report(&out, &report)?;
            println!("P-values report has been written to {}.", out.display());
        }
        Commands::PvalPlot {
            table,
            out,
            alpha,
            highlight,
        } => {
            let table = epi_zone_ingest::load_randomization_table(&table, 2)?;
            let treatment: Vec<Option<f64>> = table
                .actual
                .iter()
                .map(|row| row.first().copied().flatten())
                .collect();
            let control: Vec<Option<f64>> = table
                .actual
                .iter()
                .map(|row| row.get(1).copied().flatten())
                .collect();

            let observed: Vec<f64> = treatment.iter().copied().flatten().collect();
            let bh_threshold = benjamini_hochberg_threshold(&observed, alpha);

            render_pvalue_timeline(
                &out,
                &PvalueTimeline {
                    labels: &table.labels,
                    treatment: &treatment,
                    control: &control,
                    bh_threshold,
                    highlight_labels: &highlight,
                },
                &ChartConfig::default(),
            )?;
            println!("P-value timeline written to {}.", out.display());
        }
        Commands::CountsPlot {
            report,
            out,
            highlight,
        } => {
            let rows = epi_zone_ingest::load_window_report(&report)?;
            render_counts(&out, &rows, &highlight, &ChartConfig::default())?;
            println!("Counts chart written to {}.", out.display());
        }
        Commands::Compare {
            data,
            out,
            x_column,
            y_column,
        } => {
            let (xs, ys) = epi_zone_ingest::load_xy(&data, &x_column, &y_column)?;

            // Sort pairs by the predictor so the band polygon is simple.
            let mut pairs: Vec<(f64, f64)> = xs.into_iter().zip(ys).collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            let x: Vec<f64> = pairs.iter().map(|p| p.0).collect();
            let y: Vec<f64> = pairs.iter().map(|p| p.1).collect();

            let fit = linear_fit(&x, &y)?;
            let fitted: Vec<f64> = x.iter().map(|&v| fit.predict(v)).collect();
            let band = confidence_band(&x, &y, &fit)?;

            render_regression_scatter(
                &out,
                &RegressionScatter {
                    x: &x,
                    y: &y,
                    fitted: &fitted,
                    band: &band,
                    r_squared: fit.r_squared,
                    p_value: fit.p_value,
                    x_desc: &x_column,
                    y_desc: &y_column,
                },
                &ChartConfig::default(),
            )?;
            println!("Comparison chart written to {}.", out.display());
        }
    }

    Ok(())
}
