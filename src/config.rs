use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONFIG_PATH, DEFAULT_PROCESSED_DATA_DIR, DEFAULT_RAW_DATA_DIR, ENV_CONFIG_PATH,
};
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::normalize::NormalizerConfig;
use crate::types::SourceType;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retry_count: u32,
    pub timeout_secs: u64,
    pub retry_backoff_ms: u64,
    pub raw_data_dir: PathBuf,
    pub processed_data_dir: PathBuf,
    pub sources: BTreeMap<String, SourceConfig>,
    pub normalizer: NormalizerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry_count: 3,
            timeout_secs: 5,
            retry_backoff_ms: 500,
            raw_data_dir: PathBuf::from(DEFAULT_RAW_DATA_DIR),
            processed_data_dir: PathBuf::from(DEFAULT_PROCESSED_DATA_DIR),
            sources: BTreeMap::new(),
            normalizer: NormalizerConfig::default(),
        }
    }
}

/// One upstream source under `[sources.<key>]`
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Raw file location; defaults to `<raw_data_dir>/<key>.<type>`
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Config {
    /// Loads from `$ROSTER_CONFIG`, falling back to `config.toml`
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let path = std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_path(Path::new(&path))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.retry_count == 0 {
            return Err(PipelineError::Config("retry_count must be at least 1".to_string()));
        }
        let mut seen = BTreeMap::new();
        for (key, source) in &self.sources {
            if let Some(other) = seen.insert(source.id, key) {
                return Err(PipelineError::Config(format!(
                    "sources '{}' and '{}' share id {}",
                    other, key, source.id
                )));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn source(&self, key: &str) -> Result<&SourceConfig> {
        self.sources
            .get(key)
            .ok_or_else(|| PipelineError::UnknownSource(key.to_string()))
    }

    /// Source key for a numeric source id
    pub fn key_for_id(&self, id: u32) -> Option<&str> {
        self.sources
            .iter()
            .find(|(_, s)| s.id == id)
            .map(|(key, _)| key.as_str())
    }

    /// Enabled source keys in sorted order
    pub fn enabled_keys(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|(_, s)| s.enabled)
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Where the raw file for a source lives
    pub fn raw_path(&self, key: &str, source: &SourceConfig) -> PathBuf {
        source.path.clone().unwrap_or_else(|| {
            self.raw_data_dir
                .join(format!("{}.{}", key, source.source_type.extension()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
retry_count = 2
timeout_secs = 10
raw_data_dir = "raw"

[sources.hr_json]
id = 1
url = "https://example.com/employees.json"
type = "json"

[sources.payroll]
id = 2
type = "xls"
path = "drop/payroll.xlsx"
enabled = false

[normalizer.aliases]
salary = ["pay"]
"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.retry_count, 2);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.retry_backoff(), Duration::from_millis(500));
        assert_eq!(config.processed_data_dir, PathBuf::from("processed_data"));

        let payroll = config.source("payroll").unwrap();
        assert_eq!(payroll.source_type, SourceType::Xlsx);
        assert!(!payroll.enabled);
        assert_eq!(config.normalizer.aliases.salary, vec!["pay".to_string()]);
    }

    #[test]
    fn test_source_lookup_helpers() {
        let config = Config::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.key_for_id(2), Some("payroll"));
        assert_eq!(config.key_for_id(9), None);
        assert_eq!(config.enabled_keys(), vec!["hr_json"]);
        assert!(matches!(
            config.source("nope"),
            Err(PipelineError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_raw_path_defaults_from_key_and_type() {
        let config = Config::from_toml_str(SAMPLE).unwrap();

        let hr = config.source("hr_json").unwrap();
        assert_eq!(config.raw_path("hr_json", hr), PathBuf::from("raw/hr_json.json"));
        let payroll = config.source("payroll").unwrap();
        assert_eq!(
            config.raw_path("payroll", payroll),
            PathBuf::from("drop/payroll.xlsx")
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.retry_count, 3);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let toml = r#"
[sources.a]
id = 1
type = "csv"

[sources.b]
id = 1
type = "json"
"#;
        assert!(matches!(
            Config::from_toml_str(toml),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let toml = r#"
[sources.a]
id = 1
type = "xml"
"#;
        assert!(matches!(Config::from_toml_str(toml), Err(PipelineError::Toml(_))));
    }
}
