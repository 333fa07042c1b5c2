pub mod config;
pub mod constants;
pub mod error;
pub mod handler;
pub mod observability;
pub mod pipeline;
pub mod types;

// Layered boundaries for application ports and infrastructure adapters
pub mod app;
pub mod infra;

pub use config::{Config, SourceConfig};
pub use error::{PipelineError, Result};
pub use pipeline::processing::normalize::{
    CanonicalRecord, CanonicalTable, Designation, NormalizationReport, Normalized, Normalizer,
    NormalizerConfig, StructuralInputError,
};
pub use pipeline::{Pipeline, RunSummary, Stage};
pub use types::{RawBatch, RawTable, SourceType};
