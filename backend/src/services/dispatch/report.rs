//! The dispatch report: the original table plus `Status` and `API Response`
//! columns, with failed rows marked for highlighting.

use crate::error::DispatchError;
use chrono::Local;
use common::model::dispatch::DispatchResult;
use common::model::record::Table;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const STATUS_COLUMN: &str = "Status";
pub const RESPONSE_COLUMN: &str = "API Response";
/// Fill colour applied to highlighted rows by spreadsheet consumers.
pub const HIGHLIGHT_FILL: &str = "FFC7CE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub cells: Vec<String>,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub headers: Vec<String>,
    pub rows: Vec<ReportRow>,
    pub highlight_fill: String,
}

impl Report {
    /// Joins `results` onto `table` row by row. Both must describe the same
    /// rows in the same order.
    pub fn build(table: &Table, results: &[DispatchResult]) -> Result<Self, DispatchError> {
        if table.len() != results.len() {
            return Err(DispatchError::Report(format!(
                "{} rows but {} results",
                table.len(),
                results.len()
            )));
        }

        let mut headers = table.headers.clone();
        headers.push(STATUS_COLUMN.to_string());
        headers.push(RESPONSE_COLUMN.to_string());

        let rows = table
            .rows
            .iter()
            .zip(results)
            .enumerate()
            .map(|(i, (cells, result))| {
                if result.row_index != i {
                    return Err(DispatchError::Report(format!(
                        "result for row {} found at position {}",
                        result.row_index, i
                    )));
                }
                let mut cells = cells.clone();
                cells.resize(table.headers.len(), String::new());
                cells.push(result.status.to_string());
                cells.push(result.message.clone());
                Ok(ReportRow {
                    cells,
                    highlighted: result.status.is_failure(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Report {
            headers,
            rows,
            highlight_fill: HIGHLIGHT_FILL.to_string(),
        })
    }

    /// 1-based data row numbers (header excluded) that are highlighted.
    pub fn highlighted_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.highlighted)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Writes `<dir>/<stem>.csv` and the highlight metadata next to it as
    /// `<dir>/<stem>.json`. Returns the CSV path.
    pub fn persist(&self, dir: &Path, stem: &str) -> Result<PathBuf, DispatchError> {
        fs::create_dir_all(dir).map_err(|e| report_error(dir, e))?;
        let csv_path = dir.join(format!("{stem}.csv"));
        let json_path = dir.join(format!("{stem}.json"));

        let mut writer = csv::Writer::from_path(&csv_path).map_err(|e| report_error(&csv_path, e))?;
        writer
            .write_record(&self.headers)
            .map_err(|e| report_error(&csv_path, e))?;
        for row in &self.rows {
            writer
                .write_record(&row.cells)
                .map_err(|e| report_error(&csv_path, e))?;
        }
        writer.flush().map_err(|e| report_error(&csv_path, e))?;

        let json = serde_json::to_vec_pretty(self).map_err(|e| report_error(&json_path, e))?;
        fs::write(&json_path, json).map_err(|e| report_error(&json_path, e))?;

        Ok(csv_path)
    }
}

fn report_error(path: &Path, err: impl std::fmt::Display) -> DispatchError {
    DispatchError::Report(format!("{}: {}", path.display(), err))
}

/// `Message_Report_<YYYY-MM-DD_HH-MM>`, plus a suffix to keep concurrent
/// runs in the same minute apart.
pub fn report_stem(suffix: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M");
    if suffix.is_empty() {
        format!("Message_Report_{timestamp}")
    } else {
        format!("Message_Report_{timestamp}_{suffix}")
    }
}
