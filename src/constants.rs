/// Names shared across the pipeline so producers, normalizer and storage agree

/// Top-level key that holds the record list in JSON payloads
pub const RECORD_LIST_KEY: &str = "employees";

// Canonical output columns, in emission order
pub const COL_ID: &str = "id";
pub const COL_FULL_NAME: &str = "full_name";
pub const COL_EMAIL: &str = "email";
pub const COL_PHONE: &str = "phone";
pub const COL_GENDER: &str = "gender";
pub const COL_AGE: &str = "age";
pub const COL_JOB_TITLE: &str = "job_title";
pub const COL_YEARS_OF_EXPERIENCE: &str = "years_of_experience";
pub const COL_SALARY: &str = "salary";
pub const COL_DEPARTMENT: &str = "department";
pub const COL_DESIGNATION: &str = "designation";

pub const CANONICAL_COLUMNS: [&str; 11] = [
    COL_ID,
    COL_FULL_NAME,
    COL_EMAIL,
    COL_PHONE,
    COL_GENDER,
    COL_AGE,
    COL_JOB_TITLE,
    COL_YEARS_OF_EXPERIENCE,
    COL_SALARY,
    COL_DEPARTMENT,
    COL_DESIGNATION,
];

// Phone sentinels
pub const PHONE_INVALID: &str = "Invalid Number";
pub const PHONE_NOT_AVAILABLE: &str = "Not Available";

/// Data rows a CSV file needs after malformed rows are dropped
pub const MIN_CSV_DATA_ROWS: usize = 2;

/// Appended to an unrecognized column whose name matches a canonical column
pub const EXTRA_COLLISION_SUFFIX: &str = "_original";

// Environment variables
pub const ENV_CONFIG_PATH: &str = "ROSTER_CONFIG";
pub const ENV_METRICS_PORT: &str = "ROSTER_METRICS_PORT";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_RAW_DATA_DIR: &str = "raw_data";
pub const DEFAULT_PROCESSED_DATA_DIR: &str = "processed_data";

/// Output file name stem for a processed source
pub fn processed_stem(source_key: &str) -> String {
    format!("{}_processed", source_key)
}
