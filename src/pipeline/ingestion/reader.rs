use calamine::{open_workbook_auto, Data, Reader};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use crate::constants::MIN_CSV_DATA_ROWS;
use crate::error::{PipelineError, Result};
use crate::types::{RawBatch, RawTable, SourceType};

fn invalid(path: &Path, reason: impl Into<String>) -> PipelineError {
    PipelineError::InvalidRawFile {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Materializes a raw source file into the batch shape its type implies
pub fn read_raw_file(path: &Path, source_type: SourceType) -> Result<RawBatch> {
    debug!(path = %path.display(), source_type = %source_type, "Reading raw file");
    if !path.exists() {
        warn!(path = %path.display(), "Raw file not found");
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("raw file {} not found", path.display()),
        )
        .into());
    }
    match source_type {
        SourceType::Json => read_json(path),
        SourceType::Csv => read_csv(path).map(RawBatch::Table),
        SourceType::Xlsx => read_xlsx(path).map(RawBatch::Table),
    }
}

/// A bare top-level array is accepted and wrapped under the record key
fn read_json(path: &Path) -> Result<RawBatch> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    Ok(RawBatch::from_json(value))
}

/// All cells are read as text; empty cells become null. Rows whose width
/// does not match the header are skipped with a warning, and at least
/// `MIN_CSV_DATA_ROWS` must remain.
fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    check_header(path, &headers)?;

    let mut table = RawTable::new(headers);
    let width = table.headers.len();
    let mut skipped = 0usize;

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != width {
            skipped += 1;
            warn!(
                path = %path.display(),
                line = index + 2,
                found = record.len(),
                expected = width,
                "Skipping malformed CSV row"
            );
            continue;
        }
        table.push_row(
            record
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::String(cell.to_string())
                    }
                })
                .collect(),
        );
    }

    if table.is_empty() {
        return Err(invalid(path, "no data rows"));
    }
    if table.len() < MIN_CSV_DATA_ROWS {
        return Err(invalid(path, "fewer than two data rows"));
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, kept = table.len(), "Dropped malformed CSV rows");
    }
    Ok(table)
}

fn check_header(path: &Path, headers: &[String]) -> Result<()> {
    if headers.is_empty() {
        return Err(invalid(path, "file is empty"));
    }
    if headers.len() < 2 {
        return Err(invalid(path, "fewer than two columns"));
    }
    Ok(())
}

/// First worksheet; first row is the header
fn read_xlsx(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| invalid(path, "workbook has no sheets"))??;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .unwrap_or_default();
    check_header(path, &headers)?;

    let mut table = RawTable::new(headers);
    for row in rows {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        table.push_row(row.iter().map(cell_value).collect());
    }

    if table.is_empty() {
        return Err(invalid(path, "no data rows"));
    }
    Ok(table)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}
