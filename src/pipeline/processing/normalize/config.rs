use serde::{Deserialize, Serialize};

use super::field::CanonicalField;

/// Everything the normalizer needs to know about input naming and banding.
/// Owned by a `Normalizer` instance; nothing here is process-wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Full-name extraction rules, tried in order; the first that matches wins
    pub name_rules: Vec<NameRule>,
    pub aliases: AliasTable,
    pub bands: DesignationBands,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            name_rules: default_name_rules(),
            aliases: AliasTable::default(),
            bands: DesignationBands::default(),
        }
    }
}

impl NormalizerConfig {
    /// Lower-cases every alias and rule column so lookups are case-insensitive
    pub fn lowercased(mut self) -> Self {
        for rule in &mut self.name_rules {
            match rule {
                NameRule::Pair { first, last } => {
                    *first = first.to_lowercase();
                    *last = last.to_lowercase();
                }
                NameRule::Single { column } => *column = column.to_lowercase(),
            }
        }
        for field in CanonicalField::RESOLUTION_ORDER {
            if let Some(list) = self.aliases.list_mut(field) {
                for alias in list.iter_mut() {
                    *alias = alias.to_lowercase();
                }
            }
        }
        self
    }
}

/// One way of producing `full_name` from input columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NameRule {
    /// Concatenate a first and last name column with a single space
    Pair { first: String, last: String },
    /// Pass one combined-name column through
    Single { column: String },
}

impl NameRule {
    pub fn pair(first: &str, last: &str) -> Self {
        NameRule::Pair {
            first: first.to_string(),
            last: last.to_string(),
        }
    }

    pub fn single(column: &str) -> Self {
        NameRule::Single {
            column: column.to_string(),
        }
    }
}

fn default_name_rules() -> Vec<NameRule> {
    vec![
        NameRule::pair("first_name", "last_name"),
        NameRule::pair("firstname", "lastname"),
        NameRule::pair("employee_first_name", "employee_last_name"),
        NameRule::pair("first name", "last name"),
        NameRule::single("name"),
        NameRule::single("full name"),
        NameRule::single("full_name"),
    ]
}

/// Priority-ordered alias lists, one per alias-resolved canonical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasTable {
    pub id: Vec<String>,
    pub phone: Vec<String>,
    pub years_of_experience: Vec<String>,
    pub salary: Vec<String>,
    pub email: Vec<String>,
    pub gender: Vec<String>,
    pub job_title: Vec<String>,
    pub department: Vec<String>,
    pub age: Vec<String>,
}

fn owned(aliases: &[&str]) -> Vec<String> {
    aliases.iter().map(|s| s.to_string()).collect()
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            id: owned(&["id"]),
            phone: owned(&[
                "phone",
                "phone_number",
                "phonenumber",
                "contact",
                "telephone",
                "employee_phone",
                "employee_contact",
            ]),
            years_of_experience: owned(&[
                "years_of_experience",
                "years of experience",
                "experience",
                "experience_years",
                "years_experience",
                "yoe",
                "years",
                "employee_experience",
                "experience_yrs",
            ]),
            salary: owned(&[
                "salary",
                "annual_salary",
                "pay",
                "compensation",
                "employee_salary",
            ]),
            email: owned(&[
                "email",
                "email_address",
                "emailaddress",
                "mail",
                "employee_email",
            ]),
            gender: owned(&["gender", "sex", "employee_gender"]),
            job_title: owned(&[
                "job_title",
                "jobtitle",
                "job title",
                "position",
                "role",
                "employee_jobtitle",
                "employee_title",
                "employee_position",
                "job",
            ]),
            department: owned(&[
                "department",
                "dept",
                "team",
                "employee_department",
                "employee_dept",
            ]),
            age: owned(&["age", "years_old", "employee_age"]),
        }
    }
}

impl AliasTable {
    /// Alias list for a field; `None` for derived fields
    pub fn list(&self, field: CanonicalField) -> Option<&[String]> {
        let list = match field {
            CanonicalField::Id => &self.id,
            CanonicalField::Phone => &self.phone,
            CanonicalField::YearsOfExperience => &self.years_of_experience,
            CanonicalField::Salary => &self.salary,
            CanonicalField::Email => &self.email,
            CanonicalField::Gender => &self.gender,
            CanonicalField::JobTitle => &self.job_title,
            CanonicalField::Department => &self.department,
            CanonicalField::Age => &self.age,
            CanonicalField::FullName | CanonicalField::Designation => return None,
        };
        Some(list.as_slice())
    }

    pub(super) fn list_mut(&mut self, field: CanonicalField) -> Option<&mut Vec<String>> {
        match field {
            CanonicalField::Id => Some(&mut self.id),
            CanonicalField::Phone => Some(&mut self.phone),
            CanonicalField::YearsOfExperience => Some(&mut self.years_of_experience),
            CanonicalField::Salary => Some(&mut self.salary),
            CanonicalField::Email => Some(&mut self.email),
            CanonicalField::Gender => Some(&mut self.gender),
            CanonicalField::JobTitle => Some(&mut self.job_title),
            CanonicalField::Department => Some(&mut self.department),
            CanonicalField::Age => Some(&mut self.age),
            CanonicalField::FullName | CanonicalField::Designation => None,
        }
    }
}

/// Years-of-experience thresholds for the designation label.
/// Zero years is always `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignationBands {
    /// Below this: System Engineer
    pub system_engineer_below: u32,
    /// Up to and including this: Data Engineer
    pub data_engineer_max: u32,
    /// Up to and including this: Senior Data Engineer; above: Lead
    pub senior_data_engineer_max: u32,
}

impl Default for DesignationBands {
    fn default() -> Self {
        Self {
            system_engineer_below: 3,
            data_engineer_max: 5,
            senior_data_engineer_max: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_override_keeps_other_defaults() {
        let cfg: NormalizerConfig = toml::from_str(
            r#"
            [aliases]
            phone = ["Mobile", "phone"]

            [bands]
            data_engineer_max = 6
            "#,
        )
        .unwrap();

        assert_eq!(cfg.aliases.phone, vec!["Mobile", "phone"]);
        assert_eq!(cfg.aliases.salary, AliasTable::default().salary);
        assert_eq!(cfg.bands.data_engineer_max, 6);
        assert_eq!(cfg.bands.system_engineer_below, 3);
        assert_eq!(cfg.name_rules, default_name_rules());
    }

    #[test]
    fn test_name_rules_from_toml() {
        let cfg: NormalizerConfig = toml::from_str(
            r#"
            [[name_rules]]
            kind = "pair"
            first = "Given"
            last = "Surname"

            [[name_rules]]
            kind = "single"
            column = "display_name"
            "#,
        )
        .unwrap();

        assert_eq!(
            cfg.name_rules,
            vec![NameRule::pair("Given", "Surname"), NameRule::single("display_name")]
        );
    }

    #[test]
    fn test_lowercased_normalizes_aliases_and_rules() {
        let mut cfg = NormalizerConfig::default();
        cfg.aliases.phone = vec!["Mobile".to_string()];
        cfg.name_rules = vec![NameRule::pair("Given", "SURNAME")];

        let cfg = cfg.lowercased();
        assert_eq!(cfg.aliases.phone, vec!["mobile"]);
        assert_eq!(cfg.name_rules, vec![NameRule::pair("given", "surname")]);
    }

    #[test]
    fn test_derived_fields_have_no_alias_list() {
        let table = AliasTable::default();
        assert!(table.list(CanonicalField::FullName).is_none());
        assert!(table.list(CanonicalField::Designation).is_none());
        assert_eq!(table.list(CanonicalField::Id).unwrap().to_vec(), vec!["id"]);
    }
}
