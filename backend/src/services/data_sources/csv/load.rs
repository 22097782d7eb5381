//! Reading stored CSV data sources into a `Table`.

use crate::error::DispatchError;
use common::model::record::Table;
use std::fs;
use std::path::{Path, PathBuf};

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// The delimiter that occurs most often in the header line; `,` on a tie
/// or when none occurs.
pub fn detect_delimiter(header_line: &str) -> u8 {
    DELIMITERS
        .iter()
        .copied()
        .rev()
        .max_by_key(|&d| header_line.bytes().filter(|&b| b == d).count())
        .filter(|&d| header_line.as_bytes().contains(&d))
        .unwrap_or(b',')
}

/// Trims whitespace, surrounding quotes and non-breaking spaces.
pub fn normalize_cell(cell: &str) -> String {
    let s = cell.trim();
    let s = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s);
    s.replace('\u{00A0}', " ").trim().to_string()
}

/// Header cells must be non-empty after normalisation.
pub fn validate_headers(headers: &[String]) -> Result<(), DispatchError> {
    if headers.is_empty() {
        return Err(DispatchError::DataSource("CSV has no header row".to_string()));
    }
    if let Some(position) = headers.iter().position(|h| h.is_empty()) {
        return Err(DispatchError::DataSource(format!(
            "CSV header cell {} is empty",
            position + 1
        )));
    }
    Ok(())
}

/// Parses CSV bytes into a table. Rows shorter than the header are padded
/// with empty cells; longer rows are truncated.
pub fn parse_table(bytes: &[u8]) -> Result<Table, DispatchError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| DispatchError::DataSource("CSV is not valid UTF-8".to_string()))?;
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let header_line = text.lines().next().unwrap_or_default();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(header_line))
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_cell).collect();
    validate_headers(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut cells: Vec<String> = record.iter().map(normalize_cell).collect();
        if cells.iter().all(String::is_empty) {
            continue;
        }
        cells.resize(headers.len(), String::new());
        rows.push(cells);
    }

    Ok(Table::new(headers, rows))
}

/// Location of a stored data source. Ids are MD5 hex digests; anything else
/// is refused so an id can never escape `data_dir`.
pub fn data_source_path(data_dir: &Path, id: &str) -> Result<PathBuf, DispatchError> {
    if id.len() != 32 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DispatchError::DataSource(format!("invalid data source id '{id}'")));
    }
    Ok(data_dir.join(format!("{id}.csv")))
}

pub fn load_table(data_dir: &Path, id: &str) -> Result<Table, DispatchError> {
    let path = data_source_path(data_dir, id)?;
    let bytes = fs::read(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            DispatchError::DataSource(format!("data source '{id}' not found"))
        }
        _ => DispatchError::Io(e),
    })?;
    parse_table(&bytes)
}
