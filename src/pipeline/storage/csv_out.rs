use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::pipeline::processing::normalize::{
    CanonicalField, CanonicalRecord, CanonicalTable, ExtraColumn,
};

/// Header row, then one line per record. Extra cells with no value are
/// written empty.
pub fn write_csv(table: &CanonicalTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;

    for (index, row) in table.rows.iter().enumerate() {
        let mut record: Vec<String> = CanonicalField::ALL.iter().map(|f| row.cell(*f)).collect();
        record.extend(
            table
                .extras
                .iter()
                .map(|extra| extra.values.get(index).cloned().flatten().unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Reads back a file produced by `write_csv`. Empty extra cells come back
/// as `None`, since CSV cannot tell an empty string from a missing value.
pub fn read_csv(path: &Path) -> Result<CanonicalTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let canonical = CanonicalField::ALL.len();

    let header_ok = headers.len() >= canonical
        && CanonicalField::ALL
            .iter()
            .zip(headers.iter())
            .all(|(field, header)| field.column_name() == header);
    if !header_ok {
        return Err(PipelineError::InvalidRawFile {
            path: path.display().to_string(),
            reason: "header does not start with the canonical columns".to_string(),
        });
    }

    let mut extras: Vec<ExtraColumn> = headers
        .iter()
        .skip(canonical)
        .map(|name| ExtraColumn {
            name: name.to_string(),
            values: Vec::new(),
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: CanonicalRecord = record.deserialize(Some(&headers))?;
        rows.push(row);
        for (offset, extra) in extras.iter_mut().enumerate() {
            let cell = record.get(canonical + offset).unwrap_or_default();
            extra.values.push((!cell.is_empty()).then(|| cell.to_string()));
        }
    }

    Ok(CanonicalTable { rows, extras })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::normalize::Designation;
    use tempfile::tempdir;

    fn sample_table() -> CanonicalTable {
        CanonicalTable {
            rows: vec![CanonicalRecord {
                id: 3,
                full_name: "Doe, John".to_string(),
                email: "john@x.com".to_string(),
                phone: "5551234".to_string(),
                gender: "M".to_string(),
                age: 30,
                job_title: "Dev".to_string(),
                years_of_experience: 4,
                salary: 90_000,
                department: "IT".to_string(),
                designation: Designation::DataEngineer,
            }],
            extras: vec![ExtraColumn {
                name: "badge".to_string(),
                values: vec![None],
            }],
        }
    }

    #[test]
    fn test_write_then_read_preserves_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = sample_table();

        write_csv(&table, &path).unwrap();
        let back = read_csv(&path).unwrap();

        assert_eq!(back, table);
    }

    #[test]
    fn test_header_line_is_canonical_then_extras() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&sample_table(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "id,full_name,email,phone,gender,age,job_title,years_of_experience,salary,department,designation,badge"
        );
        assert!(text.contains("\"Doe, John\""));
    }

    #[test]
    fn test_read_rejects_foreign_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foreign.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        assert!(matches!(
            read_csv(&path),
            Err(PipelineError::InvalidRawFile { .. })
        ));
    }
}
