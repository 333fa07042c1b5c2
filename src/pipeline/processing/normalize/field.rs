use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::*;

/// Identity of one canonical output column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Id,
    FullName,
    Email,
    Phone,
    Gender,
    Age,
    JobTitle,
    YearsOfExperience,
    Salary,
    Department,
    Designation,
}

impl CanonicalField {
    /// All fields in output column order
    pub const ALL: [CanonicalField; 11] = [
        CanonicalField::Id,
        CanonicalField::FullName,
        CanonicalField::Email,
        CanonicalField::Phone,
        CanonicalField::Gender,
        CanonicalField::Age,
        CanonicalField::JobTitle,
        CanonicalField::YearsOfExperience,
        CanonicalField::Salary,
        CanonicalField::Department,
        CanonicalField::Designation,
    ];

    /// Alias-resolved fields in the order they claim input columns.
    /// `FullName` is resolved before all of these through name rules.
    pub const RESOLUTION_ORDER: [CanonicalField; 9] = [
        CanonicalField::Phone,
        CanonicalField::YearsOfExperience,
        CanonicalField::Salary,
        CanonicalField::Email,
        CanonicalField::Gender,
        CanonicalField::JobTitle,
        CanonicalField::Department,
        CanonicalField::Age,
        CanonicalField::Id,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            CanonicalField::Id => COL_ID,
            CanonicalField::FullName => COL_FULL_NAME,
            CanonicalField::Email => COL_EMAIL,
            CanonicalField::Phone => COL_PHONE,
            CanonicalField::Gender => COL_GENDER,
            CanonicalField::Age => COL_AGE,
            CanonicalField::JobTitle => COL_JOB_TITLE,
            CanonicalField::YearsOfExperience => COL_YEARS_OF_EXPERIENCE,
            CanonicalField::Salary => COL_SALARY,
            CanonicalField::Department => COL_DEPARTMENT,
            CanonicalField::Designation => COL_DESIGNATION,
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_matches_canonical_columns() {
        let names: Vec<&str> = CanonicalField::ALL.iter().map(|f| f.column_name()).collect();
        assert_eq!(names, CANONICAL_COLUMNS.to_vec());
    }

    #[test]
    fn test_resolution_order_skips_derived_fields() {
        assert!(!CanonicalField::RESOLUTION_ORDER.contains(&CanonicalField::FullName));
        assert!(!CanonicalField::RESOLUTION_ORDER.contains(&CanonicalField::Designation));
    }
}
