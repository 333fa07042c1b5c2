//! Column-oriented working copy of one batch.
//!
//! The normalizer claims columns out of a `Frame` as it resolves them; what
//! is left at the end becomes the extra (unrecognized) output columns.

use serde_json::Value;

use super::StructuralInputError;
use crate::types::RawTable;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Column>,
    rows: usize,
}

impl Frame {
    /// Builds a frame from a JSON record list. Columns appear in the order
    /// their key is first seen; records lacking a key get null there.
    pub fn from_records(records: &[Value]) -> Result<Self, StructuralInputError> {
        let mut frame = Frame {
            columns: Vec::new(),
            rows: records.len(),
        };

        for (index, record) in records.iter().enumerate() {
            let object = record
                .as_object()
                .ok_or(StructuralInputError::RecordNotAnObject { index })?;

            for (key, value) in object {
                let position = match frame.position(key) {
                    Some(position) => position,
                    None => {
                        frame.columns.push(Column {
                            name: key.clone(),
                            values: vec![Value::Null; frame.rows],
                        });
                        frame.columns.len() - 1
                    }
                };
                frame.columns[position].values[index] = value.clone();
            }
        }

        Ok(frame)
    }

    pub fn from_table(table: &RawTable) -> Result<Self, StructuralInputError> {
        let width = table.headers.len();
        let mut columns: Vec<Column> = table
            .headers
            .iter()
            .map(|name| Column {
                name: name.clone(),
                values: Vec::with_capacity(table.rows.len()),
            })
            .collect();

        for (row_index, row) in table.rows.iter().enumerate() {
            if row.len() != width {
                return Err(StructuralInputError::RaggedTable {
                    row: row_index,
                    expected: width,
                    found: row.len(),
                });
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.values.push(cell.clone());
            }
        }

        Ok(Frame {
            columns,
            rows: table.rows.len(),
        })
    }

    /// Lower-cases every column name. When two names collide the later
    /// column is folded into the first: its values only fill the first
    /// column's null cells. Returns the names that were folded away.
    pub fn lowercase_names(&mut self) -> Vec<String> {
        let mut merged: Vec<Column> = Vec::with_capacity(self.columns.len());
        let mut folded = Vec::new();

        for column in std::mem::take(&mut self.columns) {
            let lowered = column.name.to_lowercase();
            match merged.iter_mut().find(|c| c.name == lowered) {
                Some(existing) => {
                    for (slot, value) in existing.values.iter_mut().zip(column.values) {
                        if slot.is_null() {
                            *slot = value;
                        }
                    }
                    folded.push(column.name);
                }
                None => merged.push(Column {
                    name: lowered,
                    values: column.values,
                }),
            }
        }

        self.columns = merged;
        folded
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Removes a column and hands back its values
    pub fn take(&mut self, name: &str) -> Option<Vec<Value>> {
        let position = self.position(name)?;
        Some(self.columns.remove(position).values)
    }

    /// Remaining columns, in input order
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
