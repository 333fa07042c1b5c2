// Data pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod processing;
pub mod runner;
pub mod storage;

pub use runner::{Pipeline, RunSummary, SourceOutcome, SourceRunResult, Stage};
