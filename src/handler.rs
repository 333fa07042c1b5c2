//! Event-driven entry point: one JSON event in, one status response out.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::pipeline::{Pipeline, Stage};

const DEFAULT_PROCESSOR_NAME: &str = "unknown_processor";
const DEFAULT_RUN_ID: &str = "000";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandlerEvent {
    #[serde(default, alias = "scraper_input")]
    pub processor_input: ProcessorInput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorInput {
    #[serde(default = "default_processor_name", alias = "scraper_name")]
    pub processor_name: String,
    #[serde(default = "default_run_id", alias = "run_scraper_id")]
    pub run_processor_id: RunId,
}

impl Default for ProcessorInput {
    fn default() -> Self {
        Self {
            processor_name: default_processor_name(),
            run_processor_id: default_run_id(),
        }
    }
}

fn default_processor_name() -> String {
    DEFAULT_PROCESSOR_NAME.to_string()
}

fn default_run_id() -> RunId {
    RunId::Text(DEFAULT_RUN_ID.to_string())
}

/// Run ids arrive as either JSON numbers or strings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RunId {
    Number(i64),
    Text(String),
}

impl RunId {
    /// Numeric source id, when the run id is one
    pub fn source_id(&self) -> Option<u32> {
        match self {
            RunId::Number(n) => u32::try_from(*n).ok(),
            RunId::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunId::Number(n) => write!(f, "{}", n),
            RunId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// Runs the source named by the event's run id, or every enabled source
/// when the id is not numeric or matches no configured source.
pub async fn handle(pipeline: &Pipeline, event: &HandlerEvent, stage: Stage) -> HandlerResponse {
    let input = &event.processor_input;
    info!(
        processor = %input.processor_name,
        run_id = %input.run_processor_id,
        "Handling event"
    );

    let single = input
        .run_processor_id
        .source_id()
        .and_then(|id| pipeline.config().key_for_id(id).map(|key| (id, key.to_string())));

    match single {
        Some((id, key)) => {
            info!(source_id = id, source = %key, "Processing single source");
            match pipeline.process_source(&key, stage).await {
                Ok(_) => HandlerResponse {
                    status_code: 200,
                    body: format!("Data processing completed successfully for source ID {}.", id),
                },
                Err(e) => HandlerResponse {
                    status_code: 500,
                    body: format!("Data processing failed for source ID {}: {}", id, e),
                },
            }
        }
        None => {
            info!(run_id = %input.run_processor_id, "No matching source id, processing all sources");
            let summary = pipeline.process_all(stage).await;
            if summary.failed() == 0 {
                HandlerResponse {
                    status_code: 200,
                    body: format!(
                        "Data processing completed successfully for {} sources.",
                        summary.succeeded()
                    ),
                }
            } else {
                HandlerResponse {
                    status_code: 207,
                    body: format!(
                        "Data processing completed with {} successes and {} failures.",
                        summary.succeeded(),
                        summary.failed()
                    ),
                }
            }
        }
    }
}
