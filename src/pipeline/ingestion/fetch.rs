use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::app::ports::HttpClientPort;
use crate::config::{Config, SourceConfig};
use crate::error::{PipelineError, Result};
use crate::observability::sources;

/// Attempts and pause between them for one source fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            attempts: config.retry_count.max(1),
            backoff: config.retry_backoff(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Downloads a source's URL to `dest`, retrying transport failures and
/// non-2xx responses. The file is only written once a download succeeds.
pub async fn fetch_source(
    http: &dyn HttpClientPort,
    policy: &RetryPolicy,
    source_key: &str,
    source: &SourceConfig,
    dest: &Path,
) -> Result<PathBuf> {
    let url = source.url.as_deref().ok_or_else(|| PipelineError::MissingUrl {
        source_key: source_key.to_string(),
    })?;

    let attempts = policy.attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        info!(source = %source_key, url = %url, attempt, "Fetching source");
        match http.get(url).await {
            Ok(resp) if resp.is_success() => {
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(dest, &resp.bytes)?;
                sources::fetch_success(source_key);
                sources::payload_bytes(resp.bytes.len());
                info!(
                    source = %source_key,
                    bytes = resp.bytes.len(),
                    content_type = %resp.content_type,
                    path = %dest.display(),
                    "Saved raw source file"
                );
                return Ok(dest.to_path_buf());
            }
            Ok(resp) => last_error = format!("HTTP status {}", resp.status),
            Err(e) => last_error = e,
        }

        warn!(source = %source_key, attempt, error = %last_error, "Fetch attempt failed");
        if attempt < attempts {
            sources::fetch_retry(source_key);
            tokio::time::sleep(policy.backoff).await;
        }
    }

    sources::fetch_error(source_key);
    Err(PipelineError::RetriesExhausted {
        source_key: source_key.to_string(),
        attempts,
        last_error,
    })
}
