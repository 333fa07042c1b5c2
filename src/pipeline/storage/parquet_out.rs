use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow_array::{
    Array, ArrayRef, Int64Array, RecordBatch, StringArray, UInt32Array, UInt64Array,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use crate::error::{PipelineError, Result};
use crate::pipeline::processing::normalize::{
    CanonicalField, CanonicalRecord, CanonicalTable, Designation, ExtraColumn,
};

fn data_type(field: CanonicalField) -> DataType {
    match field {
        CanonicalField::Id => DataType::Int64,
        CanonicalField::Age | CanonicalField::YearsOfExperience => DataType::UInt32,
        CanonicalField::Salary => DataType::UInt64,
        _ => DataType::Utf8,
    }
}

/// Canonical columns are non-nullable; extras are nullable text
pub fn table_schema(table: &CanonicalTable) -> SchemaRef {
    let fields: Vec<Field> = CanonicalField::ALL
        .iter()
        .map(|f| Field::new(f.column_name(), data_type(*f), false))
        .chain(
            table
                .extras
                .iter()
                .map(|e| Field::new(e.name.as_str(), DataType::Utf8, true)),
        )
        .collect();
    Arc::new(Schema::new(fields))
}

fn text_column<'a>(rows: &'a [CanonicalRecord], get: impl Fn(&'a CanonicalRecord) -> &'a str) -> ArrayRef {
    Arc::new(StringArray::from(rows.iter().map(get).collect::<Vec<_>>()))
}

pub fn to_record_batch(table: &CanonicalTable) -> Result<RecordBatch> {
    let rows = &table.rows;
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(rows.iter().map(|r| r.id).collect::<Vec<_>>())),
        text_column(rows, |r| r.full_name.as_str()),
        text_column(rows, |r| r.email.as_str()),
        text_column(rows, |r| r.phone.as_str()),
        text_column(rows, |r| r.gender.as_str()),
        Arc::new(UInt32Array::from(rows.iter().map(|r| r.age).collect::<Vec<_>>())),
        text_column(rows, |r| r.job_title.as_str()),
        Arc::new(UInt32Array::from(
            rows.iter().map(|r| r.years_of_experience).collect::<Vec<_>>(),
        )),
        Arc::new(UInt64Array::from(rows.iter().map(|r| r.salary).collect::<Vec<_>>())),
        text_column(rows, |r| r.department.as_str()),
        text_column(rows, |r| r.designation.as_str()),
    ];
    for extra in &table.extras {
        columns.push(Arc::new(StringArray::from(
            extra.values.iter().map(|v| v.as_deref()).collect::<Vec<_>>(),
        )));
    }

    Ok(RecordBatch::try_new(table_schema(table), columns)?)
}

pub fn write_parquet(table: &CanonicalTable, path: &Path) -> Result<()> {
    let batch = to_record_batch(table)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn invalid(path: &Path, reason: impl Into<String>) -> PipelineError {
    PipelineError::InvalidRawFile {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str, path: &Path) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| invalid(path, format!("column {} missing or mistyped", name)))
}

/// Reads back a file produced by `write_parquet`
pub fn read_parquet(path: &Path) -> Result<CanonicalTable> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let extra_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .skip(CanonicalField::ALL.len())
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut table = CanonicalTable {
        rows: Vec::new(),
        extras: extra_names
            .iter()
            .map(|name| ExtraColumn {
                name: name.clone(),
                values: Vec::new(),
            })
            .collect(),
    };

    for batch in reader {
        let batch = batch?;
        let ids = column::<Int64Array>(&batch, "id", path)?;
        let full_names = column::<StringArray>(&batch, "full_name", path)?;
        let emails = column::<StringArray>(&batch, "email", path)?;
        let phones = column::<StringArray>(&batch, "phone", path)?;
        let genders = column::<StringArray>(&batch, "gender", path)?;
        let ages = column::<UInt32Array>(&batch, "age", path)?;
        let job_titles = column::<StringArray>(&batch, "job_title", path)?;
        let years = column::<UInt32Array>(&batch, "years_of_experience", path)?;
        let salaries = column::<UInt64Array>(&batch, "salary", path)?;
        let departments = column::<StringArray>(&batch, "department", path)?;
        let designations = column::<StringArray>(&batch, "designation", path)?;

        for i in 0..batch.num_rows() {
            let designation: Designation = designations
                .value(i)
                .parse()
                .map_err(|e: String| invalid(path, e))?;
            table.rows.push(CanonicalRecord {
                id: ids.value(i),
                full_name: full_names.value(i).to_string(),
                email: emails.value(i).to_string(),
                phone: phones.value(i).to_string(),
                gender: genders.value(i).to_string(),
                age: ages.value(i),
                job_title: job_titles.value(i).to_string(),
                years_of_experience: years.value(i),
                salary: salaries.value(i),
                department: departments.value(i).to_string(),
                designation,
            });
        }

        for extra in table.extras.iter_mut() {
            let values = column::<StringArray>(&batch, &extra.name, path)?;
            extra.values.extend(
                (0..batch.num_rows())
                    .map(|i| (!values.is_null(i)).then(|| values.value(i).to_string())),
            );
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: i64, name: &str) -> CanonicalRecord {
        CanonicalRecord {
            id,
            full_name: name.to_string(),
            email: String::new(),
            phone: "Not Available".to_string(),
            gender: String::new(),
            age: 41,
            job_title: String::new(),
            years_of_experience: 12,
            salary: 120_000,
            department: String::new(),
            designation: Designation::Lead,
        }
    }

    #[test]
    fn test_schema_types() {
        let table = CanonicalTable {
            rows: Vec::new(),
            extras: vec![ExtraColumn {
                name: "badge".to_string(),
                values: Vec::new(),
            }],
        };
        let schema = table_schema(&table);

        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(5).data_type(), &DataType::UInt32);
        assert_eq!(schema.field(8).data_type(), &DataType::UInt64);
        assert_eq!(schema.field(10).data_type(), &DataType::Utf8);
        assert!(!schema.field(10).is_nullable());
        assert_eq!(schema.field(11).name(), "badge");
        assert!(schema.field(11).is_nullable());
    }

    #[test]
    fn test_write_then_read_keeps_nulls_in_extras() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.parquet");
        let table = CanonicalTable {
            rows: vec![record(1, "Ada"), record(2, "")],
            extras: vec![ExtraColumn {
                name: "badge".to_string(),
                values: vec![Some(String::new()), None],
            }],
        };

        write_parquet(&table, &path).unwrap();
        let back = read_parquet(&path).unwrap();

        assert_eq!(back, table);
    }

    #[test]
    fn test_empty_table_writes_schema_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.parquet");

        write_parquet(&CanonicalTable::default(), &path).unwrap();
        let back = read_parquet(&path).unwrap();

        assert!(back.is_empty());
        assert!(back.extras.is_empty());
    }
}
