#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tolerant CSV ingestion for the intervention evaluation toolchain.
//!
//! Loads case tables (`lat`, `lon`, and either a numeric `unix_time` or
//! a day-first `Timestamp` column), site tables (`lat`, `lon`), wide
//! randomization tables (label column, named actual columns, then one
//! column per randomized replicate), and previously generated
//! sliding-window reports.
//!
//! Ingestion is tolerant at the cell level and strict at the schema
//! level: a malformed cell becomes a missing value (dropped rows are
//! counted and logged), but a missing required column is a hard error —
//! silently analyzing the wrong column would be worse than failing.

pub mod parsing;

use std::path::Path;

use epi_zone_models::report::WindowRow;
use epi_zone_models::{Case, Site};
use thiserror::Error;

use crate::parsing::{parse_date_dmy_unix, parse_f64, parse_lat_lon, parse_unix_time};

/// Errors from CSV ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file could not be opened or a record could not be read.
    #[error("failed to read {path}: {source}")]
    Csv {
        /// Path of the offending file.
        path: String,
        /// Underlying CSV/IO error.
        source: csv::Error,
    },

    /// A required column is absent from the header row.
    #[error("{path}: missing required column {column:?}")]
    MissingColumn {
        /// Path of the offending file.
        path: String,
        /// The column that was expected.
        column: String,
    },

    /// The case table has no usable time column.
    #[error("{path}: need either a \"unix_time\" or a \"Timestamp\" column")]
    MissingTimeColumn {
        /// Path of the offending file.
        path: String,
    },
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, IngestError> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| IngestError::Csv {
            path: display(path),
            source,
        })
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn require_column(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize, IngestError> {
    find_column(headers, name).ok_or_else(|| IngestError::MissingColumn {
        path: display(path),
        column: name.to_string(),
    })
}

/// Loads a case table.
///
/// Event times come from a numeric `unix_time` column when present,
/// otherwise from a day-first `Timestamp` column. Rows with malformed
/// coordinates or times are dropped (and counted in a warning), not
/// errors.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] on read failures, or
/// [`IngestError::MissingColumn`]/[`IngestError::MissingTimeColumn`]
/// when the schema is wrong.
pub fn load_cases(path: &Path) -> Result<Vec<Case>, IngestError> {
    let mut reader = open(path)?;
    let headers = reader
        .headers()
        .map_err(|source| IngestError::Csv {
            path: display(path),
            source,
        })?
        .clone();

    let lat_idx = require_column(&headers, "lat", path)?;
    let lon_idx = require_column(&headers, "lon", path)?;
    let unix_idx = find_column(&headers, "unix_time");
    let date_idx = find_column(&headers, "Timestamp");
    if unix_idx.is_none() && date_idx.is_none() {
        return Err(IngestError::MissingTimeColumn {
            path: display(path),
        });
    }

    let mut cases = Vec::new();
    let mut dropped = 0_u64;

    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: display(path),
            source,
        })?;

        let coords = parse_lat_lon(
            record.get(lat_idx).unwrap_or(""),
            record.get(lon_idx).unwrap_or(""),
        );
        let event_time = unix_idx
            .and_then(|i| parse_unix_time(record.get(i).unwrap_or("")))
            .or_else(|| date_idx.and_then(|i| parse_date_dmy_unix(record.get(i).unwrap_or(""))));

        match (coords, event_time) {
            (Some((lat, lon)), Some(event_time)) => cases.push(Case {
                lat,
                lon,
                event_time,
            }),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::warn!(
            "{}: dropped {dropped} row(s) with malformed coordinates or times",
            display(path)
        );
    }
    log::info!("{}: loaded {} case(s)", display(path), cases.len());

    Ok(cases)
}

/// Loads a site table (`lat`, `lon` columns).
///
/// # Errors
///
/// Returns [`IngestError::Csv`] on read failures or
/// [`IngestError::MissingColumn`] when the schema is wrong.
pub fn load_sites(path: &Path) -> Result<Vec<Site>, IngestError> {
    let mut reader = open(path)?;
    let headers = reader
        .headers()
        .map_err(|source| IngestError::Csv {
            path: display(path),
            source,
        })?
        .clone();

    let lat_idx = require_column(&headers, "lat", path)?;
    let lon_idx = require_column(&headers, "lon", path)?;

    let mut sites = Vec::new();
    let mut dropped = 0_u64;

    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: display(path),
            source,
        })?;
        match parse_lat_lon(
            record.get(lat_idx).unwrap_or(""),
            record.get(lon_idx).unwrap_or(""),
        ) {
            Some((lat, lon)) => sites.push(Site { lat, lon }),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        log::warn!(
            "{}: dropped {dropped} site row(s) with malformed coordinates",
            display(path)
        );
    }
    log::info!("{}: loaded {} site(s)", display(path), sites.len());

    Ok(sites)
}

/// A wide randomization table: one label per row, `n_actual` observed
/// columns, and the remaining columns holding one randomized replicate
/// each.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomizationTable {
    /// Row labels (dates or window date-range strings).
    pub labels: Vec<String>,
    /// Observed columns, `actual[row][column]`.
    pub actual: Vec<Vec<Option<f64>>>,
    /// Randomized replicate columns, `random[row][replicate]`.
    pub random: Vec<Vec<Option<f64>>>,
}

/// Loads a wide randomization table.
///
/// The first column is the row label, the next `n_actual` columns are
/// the observed series, and every remaining column is a randomized
/// replicate. Files both with and without a header row occur in the
/// field data; a first row whose numeric region contains no parseable
/// number is treated as a header and skipped.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] on read failures.
pub fn load_randomization_table(
    path: &Path,
    n_actual: usize,
) -> Result<RandomizationTable, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| IngestError::Csv {
            path: display(path),
            source,
        })?;

    let mut table = RandomizationTable {
        labels: Vec::new(),
        actual: Vec::new(),
        random: Vec::new(),
    };

    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| IngestError::Csv {
            path: display(path),
            source,
        })?;
        if record.is_empty() {
            continue;
        }

        let cells: Vec<Option<f64>> = record.iter().skip(1).map(parse_f64).collect();
        if row_idx == 0 && cells.iter().all(Option::is_none) {
            // Header row.
            continue;
        }

        table.labels.push(record.get(0).unwrap_or("").to_string());
        let (actual, random) = cells.split_at(n_actual.min(cells.len()));
        table.actual.push(actual.to_vec());
        table.random.push(random.to_vec());
    }

    log::info!(
        "{}: loaded randomization table with {} row(s)",
        display(path),
        table.labels.len()
    );

    Ok(table)
}

/// Loads a previously written sliding-window report.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] on read failures or
/// [`IngestError::MissingColumn`] when the count columns are absent.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn load_window_report(path: &Path) -> Result<Vec<WindowRow>, IngestError> {
    let mut reader = open(path)?;
    let headers = reader
        .headers()
        .map_err(|source| IngestError::Csv {
            path: display(path),
            source,
        })?
        .clone();

    let label_idx = require_column(&headers, "Timestamp", path)?;
    let treat_idx = require_column(&headers, "In treatment zone", path)?;
    let control_idx = require_column(&headers, "In control zone", path)?;
    let total_idx = require_column(&headers, "TOTAL", path)?;
    let p_idx = find_column(&headers, "P-value");
    let or_idx = find_column(&headers, "Odds ratio");

    let count = |record: &csv::StringRecord, idx: usize| {
        parse_f64(record.get(idx).unwrap_or("")).map(|v| v.max(0.0).round() as u64)
    };

    let mut rows = Vec::new();
    let mut dropped = 0_u64;

    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: display(path),
            source,
        })?;

        let label = record.get(label_idx).unwrap_or("").to_string();
        let counts = (
            count(&record, treat_idx),
            count(&record, control_idx),
            count(&record, total_idx),
        );
        let (Some(in_treatment), Some(in_control), Some(total)) = counts else {
            dropped += 1;
            continue;
        };

        rows.push(WindowRow {
            label,
            in_treatment,
            in_control,
            total,
            p_value: p_idx.and_then(|i| parse_f64(record.get(i).unwrap_or(""))),
            odds_ratio: or_idx.and_then(|i| parse_f64(record.get(i).unwrap_or(""))),
        });
    }

    if dropped > 0 {
        log::warn!(
            "{}: dropped {dropped} report row(s) with malformed counts",
            display(path)
        );
    }

    Ok(rows)
}

/// Loads two named numeric columns as paired observations, dropping rows
/// where either cell is missing.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] on read failures or
/// [`IngestError::MissingColumn`] when either column is absent.
pub fn load_xy(
    path: &Path,
    x_column: &str,
    y_column: &str,
) -> Result<(Vec<f64>, Vec<f64>), IngestError> {
    let mut reader = open(path)?;
    let headers = reader
        .headers()
        .map_err(|source| IngestError::Csv {
            path: display(path),
            source,
        })?
        .clone();

    let x_idx = require_column(&headers, x_column, path)?;
    let y_idx = require_column(&headers, y_column, path)?;

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut dropped = 0_u64;

    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: display(path),
            source,
        })?;
        match (
            parse_f64(record.get(x_idx).unwrap_or("")),
            parse_f64(record.get(y_idx).unwrap_or("")),
        ) {
            (Some(x), Some(y)) => {
                xs.push(x);
                ys.push(y);
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        log::warn!(
            "{}: dropped {dropped} row(s) with missing values in {x_column:?}/{y_column:?}",
            display(path)
        );
    }

    Ok((xs, ys))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("epi_zone_ingest_{name}"));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_cases_with_unix_time() {
        let path = write_temp(
            "cases_unix.csv",
            "lat,lon,unix_time\n-37.7,144.9,1717027200\n-37.8,144.8,1717113600\n",
        );
        let cases = load_cases(&path).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].event_time, 1_717_027_200);
    }

    #[test]
    fn loads_cases_with_timestamp_column() {
        let path = write_temp("cases_ts.csv", "lat,lon,Timestamp\n-37.7,144.9,30.05.2024\n");
        let cases = load_cases(&path).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].event_time, 1_717_027_200);
    }

    #[test]
    fn malformed_rows_are_dropped_not_errors() {
        let path = write_temp(
            "cases_bad.csv",
            "lat,lon,unix_time\n-37.7,144.9,1717027200\nbad,144.8,1717113600\n-37.8,,1717113600\n-37.9,144.7,n/a\n",
        );
        let cases = load_cases(&path).unwrap();
        assert_eq!(cases.len(), 1);
    }

    #[test]
    fn missing_time_column_is_an_error() {
        let path = write_temp("cases_no_time.csv", "lat,lon\n-37.7,144.9\n");
        assert!(matches!(
            load_cases(&path),
            Err(IngestError::MissingTimeColumn { .. })
        ));
    }

    #[test]
    fn missing_lat_column_is_an_error() {
        let path = write_temp("cases_no_lat.csv", "lon,unix_time\n144.9,1\n");
        assert!(matches!(
            load_cases(&path),
            Err(IngestError::MissingColumn { .. })
        ));
    }

    #[test]
    fn loads_sites() {
        let path = write_temp("sites.csv", "lat,lon\n-37.7,144.9\n-37.8,144.8\n");
        let sites = load_sites(&path).unwrap();
        assert_eq!(sites.len(), 2);
    }

    #[test]
    fn randomization_table_with_header() {
        let path = write_temp(
            "rand_header.csv",
            "Timestamp,treatment,control,Random_1,Random_2\n13.4.2024,0.5,0.6,0.4,0.7\n",
        );
        let table = load_randomization_table(&path, 2).unwrap();
        assert_eq!(table.labels, vec!["13.4.2024"]);
        assert_eq!(table.actual[0], vec![Some(0.5), Some(0.6)]);
        assert_eq!(table.random[0], vec![Some(0.4), Some(0.7)]);
    }

    #[test]
    fn randomization_table_without_header() {
        let path = write_temp(
            "rand_bare.csv",
            "13/04/2024,0.5,0.6,0.4,0.7\n14/04/2024,0.1,0.2,0.3,0.9\n",
        );
        let table = load_randomization_table(&path, 2).unwrap();
        assert_eq!(table.labels.len(), 2);
        assert_eq!(table.random[1], vec![Some(0.3), Some(0.9)]);
    }

    #[test]
    fn randomization_table_keeps_missing_cells() {
        let path = write_temp("rand_missing.csv", "13/04/2024,0.5,,0.4,abc\n");
        let table = load_randomization_table(&path, 2).unwrap();
        assert_eq!(table.actual[0], vec![Some(0.5), None]);
        assert_eq!(table.random[0], vec![Some(0.4), None]);
    }

    #[test]
    fn window_report_round_trip_columns() {
        let path = write_temp(
            "report.csv",
            "Timestamp,In treatment zone,In control zone,TOTAL,P-value,Odds ratio\n01.01.2024,3,5,20,0.04,0.5\n02.01.2024,2,6,21,,\n",
        );
        let rows = load_window_report(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].in_treatment, 3);
        assert_eq!(rows[0].p_value, Some(0.04));
        assert_eq!(rows[1].p_value, None);
    }

    #[test]
    fn loads_paired_columns() {
        let path = write_temp("xy.csv", "a,b\n1.0,2.0\n2.0,\n3.0,6.0\n");
        let (xs, ys) = load_xy(&path, "a", "b").unwrap();
        assert_eq!(xs, vec![1.0, 3.0]);
        assert_eq!(ys, vec![2.0, 6.0]);
    }
}
