//! Metric names and recording helpers, grouped by pipeline phase.
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus
//! recorder, so library code and tests can call these freely.

use std::fmt;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::constants::ENV_METRICS_PORT;

const DEFAULT_METRICS_PORT: u16 = 9898;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    SourcesFetchSuccess,
    SourcesFetchError,
    SourcesFetchRetries,
    SourcesPayloadBytes,

    NormalizeBatchesProcessed,
    NormalizeRowsProcessed,
    NormalizeFieldDefects,
    NormalizeFieldsDefaulted,
    NormalizeStructuralFailures,

    StorageFilesWritten,
    StorageWriteErrors,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SourcesFetchSuccess => "roster_sources_fetch_success_total",
            MetricName::SourcesFetchError => "roster_sources_fetch_error_total",
            MetricName::SourcesFetchRetries => "roster_sources_fetch_retries_total",
            MetricName::SourcesPayloadBytes => "roster_sources_payload_bytes",
            MetricName::NormalizeBatchesProcessed => "roster_normalize_batches_processed_total",
            MetricName::NormalizeRowsProcessed => "roster_normalize_rows_processed_total",
            MetricName::NormalizeFieldDefects => "roster_normalize_field_defects_total",
            MetricName::NormalizeFieldsDefaulted => "roster_normalize_fields_defaulted_total",
            MetricName::NormalizeStructuralFailures => "roster_normalize_structural_failures_total",
            MetricName::StorageFilesWritten => "roster_storage_files_written_total",
            MetricName::StorageWriteErrors => "roster_storage_write_errors_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installs the Prometheus exporter on `$ROSTER_METRICS_PORT` (default 9898).
/// Must run inside a tokio runtime. A second install is logged and ignored.
pub fn init_metrics() {
    let port: u16 = std::env::var(ENV_METRICS_PORT)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_METRICS_PORT);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!(%addr, "Prometheus exporter listening"),
        Err(e) => warn!(%addr, error = %e, "Prometheus exporter install failed"),
    }
}

pub mod sources {
    use super::MetricName;

    pub fn fetch_success(source: &str) {
        ::metrics::counter!(MetricName::SourcesFetchSuccess.as_str(), "source" => source.to_string())
            .increment(1);
    }

    pub fn fetch_error(source: &str) {
        ::metrics::counter!(MetricName::SourcesFetchError.as_str(), "source" => source.to_string())
            .increment(1);
    }

    pub fn fetch_retry(source: &str) {
        ::metrics::counter!(MetricName::SourcesFetchRetries.as_str(), "source" => source.to_string())
            .increment(1);
    }

    pub fn payload_bytes(bytes: usize) {
        ::metrics::histogram!(MetricName::SourcesPayloadBytes.as_str()).record(bytes as f64);
    }
}

pub mod normalize {
    use super::MetricName;

    pub fn batch_processed(source_type: &str, rows: usize) {
        ::metrics::counter!(
            MetricName::NormalizeBatchesProcessed.as_str(),
            "source_type" => source_type.to_string()
        )
        .increment(1);
        ::metrics::counter!(MetricName::NormalizeRowsProcessed.as_str()).increment(rows as u64);
    }

    pub fn field_defects(field: &str, count: usize) {
        ::metrics::counter!(MetricName::NormalizeFieldDefects.as_str(), "field" => field.to_string())
            .increment(count as u64);
    }

    pub fn field_defaulted(field: &str) {
        ::metrics::counter!(MetricName::NormalizeFieldsDefaulted.as_str(), "field" => field.to_string())
            .increment(1);
    }

    pub fn structural_failure(kind: &'static str) {
        ::metrics::counter!(MetricName::NormalizeStructuralFailures.as_str(), "kind" => kind)
            .increment(1);
    }
}

pub mod storage {
    use super::MetricName;

    pub fn files_written(count: u64) {
        ::metrics::counter!(MetricName::StorageFilesWritten.as_str()).increment(count);
    }

    pub fn write_error() {
        ::metrics::counter!(MetricName::StorageWriteErrors.as_str()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed_and_unique() {
        let names = [
            MetricName::SourcesFetchSuccess,
            MetricName::SourcesFetchError,
            MetricName::SourcesFetchRetries,
            MetricName::SourcesPayloadBytes,
            MetricName::NormalizeBatchesProcessed,
            MetricName::NormalizeRowsProcessed,
            MetricName::NormalizeFieldDefects,
            MetricName::NormalizeFieldsDefaulted,
            MetricName::NormalizeStructuralFailures,
            MetricName::StorageFilesWritten,
            MetricName::StorageWriteErrors,
        ];
        let mut seen = std::collections::BTreeSet::new();
        for name in names {
            assert!(name.as_str().starts_with("roster_"));
            assert!(seen.insert(name.as_str()));
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        sources::fetch_success("hr");
        normalize::field_defects("salary", 3);
        storage::files_written(2);
    }
}
