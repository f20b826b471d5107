//! CSV writers for the report shapes.
//!
//! Missing statistics are written as empty cells, matching the tolerant
//! ingestion contract on the way back in.

use std::path::Path;

use epi_zone_models::report::{PvalueRow, WindowRow};

use crate::ReportError;

fn open_writer(path: &Path) -> Result<csv::Writer<std::fs::File>, ReportError> {
    csv::Writer::from_path(path).map_err(|source| ReportError::Write {
        path: path.display().to_string(),
        source,
    })
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

/// Writes a sliding-window report.
///
/// # Errors
///
/// Returns [`ReportError::Write`] on IO/CSV failures.
pub fn write_window_report(path: &Path, rows: &[WindowRow]) -> Result<(), ReportError> {
    let mut writer = open_writer(path)?;
    let fail = |source| ReportError::Write {
        path: path.display().to_string(),
        source,
    };

    writer
        .write_record([
            "Timestamp",
            "In treatment zone",
            "In control zone",
            "TOTAL",
            "P-value",
            "Odds ratio",
        ])
        .map_err(fail)?;

    for row in rows {
        writer
            .write_record([
                row.label.clone(),
                row.in_treatment.to_string(),
                row.in_control.to_string(),
                row.total.to_string(),
                optional(row.p_value),
                optional(row.odds_ratio),
            ])
            .map_err(fail)?;
    }

    writer.flush().map_err(|e| ReportError::Write {
        path: path.display().to_string(),
        source: e.into(),
    })?;
    log::info!("wrote {} window row(s) to {}", rows.len(), path.display());
    Ok(())
}

/// Writes an empirical p-value report.
///
/// # Errors
///
/// Returns [`ReportError::Write`] on IO/CSV failures.
pub fn write_pvalue_report(path: &Path, rows: &[PvalueRow]) -> Result<(), ReportError> {
    let mut writer = open_writer(path)?;
    let fail = |source| ReportError::Write {
        path: path.display().to_string(),
        source,
    };

    writer
        .write_record(["Timestamp", "Treatment P-value", "Control P-value"])
        .map_err(fail)?;

    for row in rows {
        writer
            .write_record([
                row.label.clone(),
                optional(row.treatment_p),
                optional(row.control_p),
            ])
            .map_err(fail)?;
    }

    writer.flush().map_err(|e| ReportError::Write {
        path: path.display().to_string(),
        source: e.into(),
    })?;
    log::info!("wrote {} p-value row(s) to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_report_writes_empty_cells_for_missing_stats() {
        let path = std::env::temp_dir().join("epi_zone_report_window.csv");
        let rows = vec![
            WindowRow {
                label: "01.01.2024".to_string(),
                in_treatment: 3,
                in_control: 5,
                total: 20,
                p_value: Some(0.04),
                odds_ratio: Some(0.5),
            },
            WindowRow {
                label: "02.01.2024".to_string(),
                in_treatment: 0,
                in_control: 0,
                total: 0,
                p_value: None,
                odds_ratio: None,
            },
        ];
        write_window_report(&path, &rows).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(
            "Timestamp,In treatment zone,In control zone,TOTAL,P-value,Odds ratio\n"
        ));
        assert!(contents.contains("01.01.2024,3,5,20,0.04,0.5\n"));
        assert!(contents.contains("02.01.2024,0,0,0,,\n"));
    }

    #[test]
    fn pvalue_report_headers_match_consumers() {
        let path = std::env::temp_dir().join("epi_zone_report_pvals.csv");
        let rows = vec![PvalueRow {
            label: "13.4.2024-23.6.2024".to_string(),
            treatment_p: Some(0.02),
            control_p: None,
        }];
        write_pvalue_report(&path, &rows).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Timestamp,Treatment P-value,Control P-value\n"));
        assert!(contents.contains("13.4.2024-23.6.2024,0.02,\n"));
    }
}
