use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::constants::RECORD_LIST_KEY;
use crate::pipeline::processing::normalize::StructuralInputError;

/// Declared format of an upstream source. Selects which batch shape the
/// normalizer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Json,
    Csv,
    #[serde(alias = "xls")]
    Xlsx,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Json => "json",
            SourceType::Csv => "csv",
            SourceType::Xlsx => "xlsx",
        }
    }

    /// File extension used for raw downloads of this type
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Whether batches of this type arrive as rows x named columns
    pub fn is_tabular(&self) -> bool {
        matches!(self, SourceType::Csv | SourceType::Xlsx)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = StructuralInputError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(SourceType::Json),
            "csv" => Ok(SourceType::Csv),
            "xlsx" | "xls" => Ok(SourceType::Xlsx),
            other => Err(StructuralInputError::UnsupportedSourceType(other.to_string())),
        }
    }
}

/// Rows x named columns as read from a tabular file. Cells stay loosely
/// typed until the normalizer coerces them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One materialized batch handed to the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBatch {
    /// A JSON document holding the record list under `employees`
    Document(Value),
    /// An already tabular structure (CSV, spreadsheet)
    Table(RawTable),
}

impl RawBatch {
    /// Wraps a bare record list the way upstream producers sometimes send it.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(records) => {
                let mut doc = serde_json::Map::new();
                doc.insert(RECORD_LIST_KEY.to_string(), Value::Array(records));
                RawBatch::Document(Value::Object(doc))
            }
            other => RawBatch::Document(other),
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            RawBatch::Document(_) => "document",
            RawBatch::Table(_) => "table",
        }
    }
}
