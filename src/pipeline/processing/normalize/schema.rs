//! Schema assembly: typed defaults for anything resolution did not fill,
//! canonical column order, extras appended after.

use std::collections::HashSet;

use super::coerce;
use super::field::CanonicalField;
use super::frame::Column;
use super::record::{CanonicalRecord, CanonicalTable, Designation, ExtraColumn};
use crate::constants::{EXTRA_COLLISION_SUFFIX, PHONE_NOT_AVAILABLE};

/// Per-field columns after resolution, coercion and derivation.
/// `None` means no input column fed the field.
#[derive(Debug, Clone, Default)]
pub struct ResolvedColumns {
    pub id: Vec<i64>,
    pub full_name: Option<Vec<String>>,
    pub email: Option<Vec<String>>,
    pub phone: Option<Vec<String>>,
    pub gender: Option<Vec<String>>,
    pub age: Option<Vec<u32>>,
    pub job_title: Option<Vec<String>>,
    pub years_of_experience: Option<Vec<u32>>,
    pub salary: Option<Vec<u64>>,
    pub department: Option<Vec<String>>,
    pub designation: Option<Vec<Designation>>,
}

/// Result of assembly plus the fields that fell back to their default
pub struct Assembled {
    pub table: CanonicalTable,
    pub defaulted: Vec<CanonicalField>,
}

struct Filler<'a> {
    rows: usize,
    defaulted: &'a mut Vec<CanonicalField>,
}

impl Filler<'_> {
    fn fill<T: Clone>(
        &mut self,
        field: CanonicalField,
        column: Option<Vec<T>>,
        default: T,
    ) -> std::vec::IntoIter<T> {
        match column {
            Some(values) => values.into_iter(),
            None => {
                self.defaulted.push(field);
                vec![default; self.rows].into_iter()
            }
        }
    }
}

pub fn assemble(columns: ResolvedColumns, leftovers: Vec<Column>, rows: usize) -> Assembled {
    let mut defaulted = Vec::new();
    let mut filler = Filler {
        rows,
        defaulted: &mut defaulted,
    };

    let mut full_name = filler.fill(CanonicalField::FullName, columns.full_name, String::new());
    let mut email = filler.fill(CanonicalField::Email, columns.email, String::new());
    let mut phone = filler.fill(
        CanonicalField::Phone,
        columns.phone,
        PHONE_NOT_AVAILABLE.to_string(),
    );
    let mut gender = filler.fill(CanonicalField::Gender, columns.gender, String::new());
    let mut age = filler.fill(CanonicalField::Age, columns.age, 0);
    let mut job_title = filler.fill(CanonicalField::JobTitle, columns.job_title, String::new());
    let mut years = filler.fill(
        CanonicalField::YearsOfExperience,
        columns.years_of_experience,
        0,
    );
    let mut salary = filler.fill(CanonicalField::Salary, columns.salary, 0);
    let mut department = filler.fill(CanonicalField::Department, columns.department, String::new());
    let mut designation = filler.fill(
        CanonicalField::Designation,
        columns.designation,
        Designation::Unknown,
    );

    let records = columns
        .id
        .into_iter()
        .take(rows)
        .map(|id| CanonicalRecord {
            id,
            full_name: full_name.next().unwrap_or_default(),
            email: email.next().unwrap_or_default(),
            phone: phone
                .next()
                .unwrap_or_else(|| PHONE_NOT_AVAILABLE.to_string()),
            gender: gender.next().unwrap_or_default(),
            age: age.next().unwrap_or_default(),
            job_title: job_title.next().unwrap_or_default(),
            years_of_experience: years.next().unwrap_or_default(),
            salary: salary.next().unwrap_or_default(),
            department: department.next().unwrap_or_default(),
            designation: designation.next().unwrap_or_default(),
        })
        .collect();

    let mut taken: HashSet<String> = CanonicalField::ALL
        .iter()
        .map(|f| f.column_name().to_string())
        .chain(leftovers.iter().map(|c| c.name.clone()))
        .collect();
    let extras = leftovers
        .into_iter()
        .map(|column| ExtraColumn {
            name: extra_name(column.name, &mut taken),
            values: column.values.iter().map(coerce::text).collect(),
        })
        .collect();

    Assembled {
        table: CanonicalTable {
            rows: records,
            extras,
        },
        defaulted,
    }
}

/// Extras may not shadow a canonical column in the output header. A renamed
/// extra also skips every name already in `taken` by appending a counter.
fn extra_name(name: String, taken: &mut HashSet<String>) -> String {
    if !CanonicalField::ALL.iter().any(|f| f.column_name() == name) {
        return name;
    }
    let base = format!("{}{}", name, EXTRA_COLLISION_SUFFIX);
    let mut candidate = base.clone();
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{}_{}", base, n);
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}
