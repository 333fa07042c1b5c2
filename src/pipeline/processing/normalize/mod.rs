//! Schema normalization engine.
//!
//! Turns one materialized batch of employee records, whatever its column
//! naming, into a `CanonicalTable` with the fixed eleven-field layout:
//!
//! 1. resolve input columns to canonical fields through alias lists
//! 2. coerce each resolved value, absorbing defects into typed defaults
//! 3. derive `full_name`, `designation` and `id`
//! 4. assemble defaults, canonical order and trailing extra columns
//!
//! Only batch-level shape problems are reported, as `StructuralInputError`.

pub mod coerce;
pub mod config;
pub mod derive;
pub mod field;
pub mod frame;
pub mod record;
pub mod resolver;
pub mod schema;

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

pub use config::{AliasTable, DesignationBands, NameRule, NormalizerConfig};
pub use derive::IdStrategy;
pub use field::CanonicalField;
pub use record::{CanonicalRecord, CanonicalTable, Designation, ExtraColumn};

use crate::constants::{PHONE_INVALID, RECORD_LIST_KEY};
use crate::types::{RawBatch, SourceType};
use frame::Frame;
use resolver::Resolved;
use schema::ResolvedColumns;

/// Batch-level defects. The batch should be skipped, not retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralInputError {
    #[error("document has no top-level 'employees' key")]
    MissingRecordKey,

    #[error("'employees' is not a list of records")]
    NotARecordList,

    #[error("record at index {index} is not an object")]
    RecordNotAnObject { index: usize },

    #[error("source type {source_type} expects a JSON document, got a table")]
    ExpectedDocument { source_type: SourceType },

    #[error("source type {source_type} expects a table, got a JSON document")]
    ExpectedTable { source_type: SourceType },

    #[error("unsupported source type: {0}")]
    UnsupportedSourceType(String),

    #[error("row {row} has {found} cells, header has {expected}")]
    RaggedTable {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl StructuralInputError {
    /// Short stable label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            StructuralInputError::MissingRecordKey => "missing_record_key",
            StructuralInputError::NotARecordList => "not_a_record_list",
            StructuralInputError::RecordNotAnObject { .. } => "record_not_an_object",
            StructuralInputError::ExpectedDocument { .. } => "expected_document",
            StructuralInputError::ExpectedTable { .. } => "expected_table",
            StructuralInputError::UnsupportedSourceType(_) => "unsupported_source_type",
            StructuralInputError::RaggedTable { .. } => "ragged_table",
        }
    }
}

/// What happened while normalizing one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub source_type: SourceType,
    pub rows: usize,
    /// Canonical field -> input column(s) it was read from
    pub resolved: BTreeMap<CanonicalField, Vec<String>>,
    /// Fields with no input column, filled entirely with defaults
    pub defaulted: Vec<CanonicalField>,
    /// Cells that were present but had to be replaced by a default
    pub defects: BTreeMap<CanonicalField, usize>,
    pub id_strategy: IdStrategy,
    /// Input columns folded into an earlier column with the same lower-cased name
    pub folded_columns: Vec<String>,
}

impl NormalizationReport {
    pub fn total_defects(&self) -> usize {
        self.defects.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub table: CanonicalTable,
    pub report: NormalizationReport,
}

/// The engine. Holds only immutable configuration, so one instance can
/// serve any number of independent batches.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            config: config.lowercased(),
        }
    }

    /// Normalizes a batch declared with a free-form type tag
    pub fn normalize_tagged(
        &self,
        batch: &RawBatch,
        source_type: &str,
    ) -> Result<Normalized, StructuralInputError> {
        let source_type: SourceType = source_type.parse()?;
        self.normalize(batch, source_type)
    }

    pub fn normalize(
        &self,
        batch: &RawBatch,
        source_type: SourceType,
    ) -> Result<Normalized, StructuralInputError> {
        let mut frame = frame_for(batch, source_type)?;
        let rows = frame.row_count();

        debug!(
            source_type = %source_type,
            shape = batch.shape(),
            rows,
            columns = ?frame.names(),
            "Original columns"
        );

        let folded_columns = frame.lowercase_names();
        if !folded_columns.is_empty() {
            warn!(
                folded = ?folded_columns,
                "Columns differing only by case were merged into their first occurrence"
            );
        }

        let mut pass = Pass::default();

        let name = resolver::resolve_name(&mut frame, &self.config.name_rules);
        if let Some(name) = &name {
            pass.record_sources(CanonicalField::FullName, name.sources());
        }

        let mut columns = ResolvedColumns {
            full_name: name
                .as_ref()
                .map(|n| derive::full_names(Some(n), rows)),
            ..Default::default()
        };

        let mut id_source = None;
        for field in CanonicalField::RESOLUTION_ORDER {
            let (frame, pass) = (&mut frame, &mut pass);
            match field {
                CanonicalField::Phone => {
                    columns.phone = self.claim(frame, pass, field, |v| {
                        let phone = coerce::phone(v);
                        let defect = phone == PHONE_INVALID;
                        (phone, defect)
                    })
                }
                CanonicalField::YearsOfExperience => {
                    columns.years_of_experience = self.claim(frame, pass, field, count_u32)
                }
                CanonicalField::Salary => {
                    columns.salary = self.claim(frame, pass, field, |v| match coerce::count(v) {
                        Some(n) => (n, false),
                        None => (0, true),
                    })
                }
                CanonicalField::Email => columns.email = self.claim(frame, pass, field, text_or_empty),
                CanonicalField::Gender => {
                    columns.gender = self.claim(frame, pass, field, text_or_empty)
                }
                CanonicalField::JobTitle => {
                    columns.job_title = self.claim(frame, pass, field, text_or_empty)
                }
                CanonicalField::Department => {
                    columns.department = self.claim(frame, pass, field, text_or_empty)
                }
                CanonicalField::Age => columns.age = self.claim(frame, pass, field, count_u32),
                CanonicalField::Id => id_source = self.claim_raw(frame, pass, field),
                // Derived, never claimed through aliases
                CanonicalField::FullName | CanonicalField::Designation => {}
            }
        }

        let (ids, id_strategy) =
            derive::assign_ids(id_source.as_ref().map(|r| r.values.as_slice()), rows);
        columns.id = ids;

        columns.designation = columns
            .years_of_experience
            .as_ref()
            .map(|years| derive::designations(years, &self.config.bands));

        let assembled = schema::assemble(columns, frame.into_columns(), rows);

        debug!(
            columns = ?assembled.table.column_names(),
            "Final columns"
        );

        Ok(Normalized {
            table: assembled.table,
            report: NormalizationReport {
                source_type,
                rows,
                resolved: pass.resolved,
                defaulted: assembled.defaulted,
                defects: pass.defects,
                id_strategy,
                folded_columns,
            },
        })
    }

    /// Resolves an alias-driven field and runs every cell through `convert`,
    /// which returns the value and whether it was a defect.
    fn claim<T, F>(
        &self,
        frame: &mut Frame,
        pass: &mut Pass,
        field: CanonicalField,
        convert: F,
    ) -> Option<Vec<T>>
    where
        F: Fn(&Value) -> (T, bool),
    {
        let resolved = self.claim_raw(frame, pass, field)?;
        let mut defects = 0;
        let values = resolved
            .values
            .iter()
            .map(|v| {
                let (value, defect) = convert(v);
                if defect {
                    defects += 1;
                }
                value
            })
            .collect();
        pass.record_defects(field, defects);
        Some(values)
    }

    fn claim_raw(&self, frame: &mut Frame, pass: &mut Pass, field: CanonicalField) -> Option<Resolved> {
        let aliases = self.config.aliases.list(field)?;
        let resolved = resolver::resolve_field(frame, aliases)?;
        if resolved.source != field.column_name() {
            debug!(field = %field, source = %resolved.source, "Resolved field from alias");
        }
        pass.record_sources(field, vec![resolved.source.as_str()]);
        Some(resolved)
    }
}

/// Bookkeeping for one normalization call
#[derive(Default)]
struct Pass {
    resolved: BTreeMap<CanonicalField, Vec<String>>,
    defects: BTreeMap<CanonicalField, usize>,
}

impl Pass {
    fn record_sources(&mut self, field: CanonicalField, sources: Vec<&str>) {
        self.resolved
            .insert(field, sources.into_iter().map(str::to_string).collect());
    }

    fn record_defects(&mut self, field: CanonicalField, count: usize) {
        if count > 0 {
            *self.defects.entry(field).or_insert(0) += count;
        }
    }
}

fn count_u32(value: &Value) -> (u32, bool) {
    match coerce::small_count(value) {
        Some(n) => (n, false),
        None => (0, true),
    }
}

fn text_or_empty(value: &Value) -> (String, bool) {
    match coerce::text(value) {
        Some(text) => (text, false),
        None => (String::new(), true),
    }
}

fn frame_for(batch: &RawBatch, source_type: SourceType) -> Result<Frame, StructuralInputError> {
    match batch {
        RawBatch::Document(doc) if !source_type.is_tabular() => {
            let records = doc
                .as_object()
                .and_then(|obj| obj.get(RECORD_LIST_KEY))
                .ok_or(StructuralInputError::MissingRecordKey)?;
            let records = records
                .as_array()
                .ok_or(StructuralInputError::NotARecordList)?;
            Frame::from_records(records)
        }
        RawBatch::Table(table) if source_type.is_tabular() => Frame::from_table(table),
        RawBatch::Table(_) => Err(StructuralInputError::ExpectedDocument { source_type }),
        RawBatch::Document(_) => Err(StructuralInputError::ExpectedTable { source_type }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawTable;
    use serde_json::json;

    fn json_batch(records: Value) -> RawBatch {
        RawBatch::Document(json!({ "employees": records }))
    }

    fn normalize_json(records: Value) -> Normalized {
        Normalizer::default()
            .normalize(&json_batch(records), SourceType::Json)
            .unwrap()
    }

    #[test]
    fn test_full_record_passes_through() {
        let out = normalize_json(json!([{
            "id": 1,
            "first_name": "John",
            "last_name": "Doe",
            "email": "john@example.com",
            "phone": "555-1234",
            "gender": "Male",
            "age": 30,
            "job_title": "Software Engineer",
            "years_of_experience": 5,
            "salary": 85000,
            "department": "Engineering"
        }]));

        assert_eq!(
            out.table.rows[0],
            CanonicalRecord {
                id: 1,
                full_name: "John Doe".to_string(),
                email: "john@example.com".to_string(),
                phone: "5551234".to_string(),
                gender: "Male".to_string(),
                age: 30,
                job_title: "Software Engineer".to_string(),
                years_of_experience: 5,
                salary: 85000,
                department: "Engineering".to_string(),
                designation: Designation::DataEngineer,
            }
        );
        assert!(out.table.extras.is_empty());
        assert_eq!(out.report.id_strategy, IdStrategy::Kept);
        assert_eq!(out.report.total_defects(), 0);
    }

    #[test]
    fn test_missing_record_key_is_structural() {
        let err = Normalizer::default()
            .normalize(&RawBatch::Document(json!({})), SourceType::Json)
            .unwrap_err();
        assert_eq!(err, StructuralInputError::MissingRecordKey);
        assert_eq!(err.kind(), "missing_record_key");
    }

    #[test]
    fn test_record_list_must_be_array() {
        let err = Normalizer::default()
            .normalize(&RawBatch::Document(json!({"employees": {"id": 1}})), SourceType::Json)
            .unwrap_err();
        assert_eq!(err, StructuralInputError::NotARecordList);
    }

    #[test]
    fn test_shape_must_match_source_type() {
        let normalizer = Normalizer::default();
        let table = RawBatch::Table(RawTable::new(vec!["id".into()]));
        let doc = json_batch(json!([]));

        assert_eq!(
            normalizer.normalize(&table, SourceType::Json).unwrap_err(),
            StructuralInputError::ExpectedDocument {
                source_type: SourceType::Json
            }
        );
        assert_eq!(
            normalizer.normalize(&doc, SourceType::Csv).unwrap_err(),
            StructuralInputError::ExpectedTable {
                source_type: SourceType::Csv
            }
        );
    }

    #[test]
    fn test_unknown_tag_is_structural() {
        let err = Normalizer::default()
            .normalize_tagged(&json_batch(json!([])), "xml")
            .unwrap_err();
        assert_eq!(err, StructuralInputError::UnsupportedSourceType("xml".into()));
    }

    #[test]
    fn test_empty_record_list_gives_empty_table() {
        let out = normalize_json(json!([]));
        assert!(out.table.is_empty());
        assert_eq!(out.table.column_names().len(), 11);
    }

    #[test]
    fn test_defects_are_counted_not_raised() {
        let out = normalize_json(json!([
            {"id": 1, "years_of_experience": "unknown", "phone": "555-0100x2", "salary": "lots"},
            {"id": 2, "years_of_experience": 4, "phone": null, "salary": 50000}
        ]));

        let rows = &out.table.rows;
        assert_eq!(rows[0].years_of_experience, 0);
        assert_eq!(rows[0].designation, Designation::Unknown);
        assert_eq!(rows[0].phone, PHONE_INVALID);
        assert_eq!(rows[1].phone, PHONE_INVALID);
        assert_eq!(rows[0].salary, 0);
        assert_eq!(rows[1].designation, Designation::DataEngineer);

        assert_eq!(out.report.defects[&CanonicalField::YearsOfExperience], 1);
        assert_eq!(out.report.defects[&CanonicalField::Phone], 2);
        assert_eq!(out.report.defects[&CanonicalField::Salary], 1);
    }

    #[test]
    fn test_report_lists_sources_and_defaults() {
        let out = normalize_json(json!([{"Employee_Salary": 1, "Sex": "F", "badge": 3}]));

        assert_eq!(
            out.report.resolved[&CanonicalField::Salary],
            vec!["employee_salary".to_string()]
        );
        assert_eq!(out.report.resolved[&CanonicalField::Gender], vec!["sex".to_string()]);
        assert!(out.report.defaulted.contains(&CanonicalField::Email));
        assert!(!out.report.defaulted.contains(&CanonicalField::Salary));
        assert_eq!(out.table.extras[0].name, "badge");
    }

    #[test]
    fn test_custom_aliases_coexist_with_defaults() {
        let mut config = NormalizerConfig::default();
        config.aliases.phone = vec!["Mobile".to_string()];
        let custom = Normalizer::new(config);
        let default = Normalizer::default();
        let batch = json_batch(json!([{"mobile": "555-0199", "phone": "555-0100"}]));

        let custom_out = custom.normalize(&batch, SourceType::Json).unwrap();
        let default_out = default.normalize(&batch, SourceType::Json).unwrap();

        assert_eq!(custom_out.table.rows[0].phone, "5550199");
        assert_eq!(custom_out.table.extras[0].name, "phone_original");
        assert_eq!(default_out.table.rows[0].phone, "5550100");
        assert_eq!(default_out.table.extras[0].name, "mobile");
    }

    #[test]
    fn test_claims_follow_resolution_order() {
        for (i, expected) in CanonicalField::RESOLUTION_ORDER.iter().enumerate() {
            let mut config = NormalizerConfig::default();
            for (j, field) in CanonicalField::RESOLUTION_ORDER.iter().enumerate() {
                if let Some(list) = config.aliases.list_mut(*field) {
                    *list = if j >= i { vec!["shared".to_string()] } else { Vec::new() };
                }
            }
            let out = Normalizer::new(config)
                .normalize(&json_batch(json!([{"shared": "7"}])), SourceType::Json)
                .unwrap();

            let claimed: Vec<&CanonicalField> = out.report.resolved.keys().collect();
            assert_eq!(claimed, vec![expected]);
        }
    }
}
