// Pipeline storage: processed tables written as CSV and Parquet

pub mod csv_out;
pub mod parquet_out;

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::processed_stem;
use crate::error::Result;
use crate::pipeline::processing::normalize::CanonicalTable;

/// Where one processed table was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedOutputs {
    pub csv: PathBuf,
    pub parquet: PathBuf,
}

/// Writes `<key>_processed.csv` and `<key>_processed.parquet` under `dir`,
/// creating the directory when needed. Existing files are replaced.
pub fn save_processed(table: &CanonicalTable, dir: &Path, source_key: &str) -> Result<SavedOutputs> {
    std::fs::create_dir_all(dir)?;
    let stem = processed_stem(source_key);
    let csv = dir.join(format!("{}.csv", stem));
    let parquet = dir.join(format!("{}.parquet", stem));

    csv_out::write_csv(table, &csv)?;
    parquet_out::write_parquet(table, &parquet)?;

    info!(
        source = %source_key,
        rows = table.len(),
        csv = %csv.display(),
        parquet = %parquet.display(),
        "Saved processed table"
    );
    Ok(SavedOutputs { csv, parquet })
}
