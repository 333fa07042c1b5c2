use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::app::ports::HttpClientPort;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::infra::ReqwestHttp;
use crate::observability::{normalize as normalize_metrics, storage as storage_metrics};
use crate::pipeline::ingestion::{fetch_source, read_raw_file, RetryPolicy};
use crate::pipeline::processing::normalize::{NormalizationReport, Normalized, Normalizer};
use crate::pipeline::storage::{save_processed, SavedOutputs};

/// How far to take a source in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Download the raw file only
    Fetch,
    /// Read an existing raw file, normalize and store it
    Process,
    /// Fetch, then process
    Full,
}

impl Stage {
    pub fn fetches(&self) -> bool {
        matches!(self, Stage::Fetch | Stage::Full)
    }

    pub fn processes(&self) -> bool {
        matches!(self, Stage::Process | Stage::Full)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceRunResult {
    pub source_key: String,
    pub stage: Stage,
    pub raw_path: PathBuf,
    pub outputs: Option<SavedOutputs>,
    pub report: Option<NormalizationReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source_key: String,
    pub result: Option<SourceRunResult>,
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-source outcomes of one `process_all` call
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<SourceOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Drives sources through fetch, read, normalize and store
pub struct Pipeline {
    config: Config,
    normalizer: Normalizer,
    http: Arc<dyn HttpClientPort>,
}

impl Pipeline {
    pub fn new(config: Config, http: Arc<dyn HttpClientPort>) -> Self {
        let normalizer = Normalizer::new(config.normalizer.clone());
        Self {
            config,
            normalizer,
            http,
        }
    }

    /// Pipeline backed by a real HTTP client using the configured timeout
    pub fn from_config(config: Config) -> Result<Self> {
        let http = Arc::new(ReqwestHttp::new(config.timeout())?);
        Ok(Self::new(config, http))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn process_source(&self, source_key: &str, stage: Stage) -> Result<SourceRunResult> {
        let source = self.config.source(source_key)?;
        let raw_path = self.config.raw_path(source_key, source);

        if stage.fetches() {
            let policy = RetryPolicy::from_config(&self.config);
            fetch_source(self.http.as_ref(), &policy, source_key, source, &raw_path).await?;
        }

        let mut result = SourceRunResult {
            source_key: source_key.to_string(),
            stage,
            raw_path: raw_path.clone(),
            outputs: None,
            report: None,
        };
        if !stage.processes() {
            return Ok(result);
        }

        let batch = read_raw_file(&raw_path, source.source_type)?;
        let Normalized { table, report } = match self.normalizer.normalize(&batch, source.source_type) {
            Ok(normalized) => normalized,
            Err(e) => {
                normalize_metrics::structural_failure(e.kind());
                warn!(source = %source_key, error = %e, "Skipping structurally invalid batch");
                return Err(PipelineError::Structural(e));
            }
        };
        record_report(&report);

        let outputs = save_processed(&table, &self.config.processed_data_dir, source_key)
            .inspect_err(|_| storage_metrics::write_error())?;
        storage_metrics::files_written(2);

        info!(
            source = %source_key,
            rows = report.rows,
            defects = report.total_defects(),
            "Source processed"
        );
        result.outputs = Some(outputs);
        result.report = Some(report);
        Ok(result)
    }

    /// Runs every enabled source in key order. A failing source is logged
    /// and recorded; the rest still run.
    pub async fn process_all(&self, stage: Stage) -> RunSummary {
        let keys: Vec<String> = self
            .config
            .enabled_keys()
            .into_iter()
            .map(str::to_string)
            .collect();
        self.process_keys(&keys, stage).await
    }

    pub async fn process_keys(&self, keys: &[String], stage: Stage) -> RunSummary {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", run_id = %run_id, stage = ?stage);

        async move {
            let started_at = Utc::now();
            info!(sources = keys.len(), "Starting run");

            let mut outcomes = Vec::with_capacity(keys.len());
            for key in keys {
                let outcome = match self.process_source(key, stage).await {
                    Ok(result) => SourceOutcome {
                        source_key: key.clone(),
                        result: Some(result),
                        error: None,
                    },
                    Err(e) => {
                        error!(source = %key, error = %e, "Source failed");
                        SourceOutcome {
                            source_key: key.clone(),
                            result: None,
                            error: Some(e.to_string()),
                        }
                    }
                };
                outcomes.push(outcome);
            }

            let summary = RunSummary {
                run_id,
                stage,
                started_at,
                finished_at: Utc::now(),
                outcomes,
            };
            info!(
                succeeded = summary.succeeded(),
                failed = summary.failed(),
                "Run finished"
            );
            summary
        }
        .instrument(span)
        .await
    }
}

fn record_report(report: &NormalizationReport) {
    normalize_metrics::batch_processed(report.source_type.as_str(), report.rows);
    for (field, count) in &report.defects {
        if *count > 0 {
            normalize_metrics::field_defects(field.column_name(), *count);
        }
    }
    for field in &report.defaulted {
        normalize_metrics::field_defaulted(field.column_name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_flags() {
        assert!(Stage::Fetch.fetches() && !Stage::Fetch.processes());
        assert!(!Stage::Process.fetches() && Stage::Process.processes());
        assert!(Stage::Full.fetches() && Stage::Full.processes());
    }

    #[test]
    fn test_stage_names() {
        let stage: Stage = serde_json::from_str("\"process\"").unwrap();
        assert_eq!(stage, Stage::Process);
        assert_eq!(serde_json::to_string(&Stage::Full).unwrap(), "\"full\"");
    }
}
