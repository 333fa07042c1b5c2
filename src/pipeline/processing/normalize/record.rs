use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::config::DesignationBands;
use super::field::CanonicalField;

/// Job-level label derived from years of experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Designation {
    #[default]
    Unknown,
    #[serde(rename = "System Engineer")]
    SystemEngineer,
    #[serde(rename = "Data Engineer")]
    DataEngineer,
    #[serde(rename = "Senior Data Engineer")]
    SeniorDataEngineer,
    Lead,
}

impl Designation {
    /// Band for a coerced experience value. Zero means the experience was
    /// missing or unparsable, so it maps to `Unknown`.
    pub fn from_years(years: u32, bands: &DesignationBands) -> Self {
        match years {
            0 => Designation::Unknown,
            y if y < bands.system_engineer_below => Designation::SystemEngineer,
            y if y <= bands.data_engineer_max => Designation::DataEngineer,
            y if y <= bands.senior_data_engineer_max => Designation::SeniorDataEngineer,
            _ => Designation::Lead,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Designation::Unknown => "Unknown",
            Designation::SystemEngineer => "System Engineer",
            Designation::DataEngineer => "Data Engineer",
            Designation::SeniorDataEngineer => "Senior Data Engineer",
            Designation::Lead => "Lead",
        }
    }
}

impl fmt::Display for Designation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Designation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unknown" => Ok(Designation::Unknown),
            "System Engineer" => Ok(Designation::SystemEngineer),
            "Data Engineer" => Ok(Designation::DataEngineer),
            "Senior Data Engineer" => Ok(Designation::SeniorDataEngineer),
            "Lead" => Ok(Designation::Lead),
            other => Err(format!("unknown designation: {}", other)),
        }
    }
}

/// One output row. Field order matches the canonical column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub age: u32,
    pub job_title: String,
    pub years_of_experience: u32,
    pub salary: u64,
    pub department: String,
    pub designation: Designation,
}

impl CanonicalRecord {
    /// Text form of one canonical cell
    pub fn cell(&self, field: CanonicalField) -> String {
        match field {
            CanonicalField::Id => self.id.to_string(),
            CanonicalField::FullName => self.full_name.clone(),
            CanonicalField::Email => self.email.clone(),
            CanonicalField::Phone => self.phone.clone(),
            CanonicalField::Gender => self.gender.clone(),
            CanonicalField::Age => self.age.to_string(),
            CanonicalField::JobTitle => self.job_title.clone(),
            CanonicalField::YearsOfExperience => self.years_of_experience.to_string(),
            CanonicalField::Salary => self.salary.to_string(),
            CanonicalField::Department => self.department.clone(),
            CanonicalField::Designation => self.designation.to_string(),
        }
    }
}

/// An input column the normalizer did not recognize, carried through as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraColumn {
    pub name: String,
    pub values: Vec<Option<String>>,
}

/// Normalized batch: canonical rows plus row-aligned extra columns
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanonicalTable {
    pub rows: Vec<CanonicalRecord>,
    pub extras: Vec<ExtraColumn>,
}

impl CanonicalTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Output header: canonical block, then extras in input order
    pub fn column_names(&self) -> Vec<String> {
        CanonicalField::ALL
            .iter()
            .map(|f| f.column_name().to_string())
            .chain(self.extras.iter().map(|e| e.name.clone()))
            .collect()
    }

    pub fn extra(&self, name: &str) -> Option<&ExtraColumn> {
        self.extras.iter().find(|e| e.name == name)
    }
}
