// Pipeline ingestion: fetching raw source files and reading them into batches

pub mod fetch;
pub mod reader;

pub use fetch::{fetch_source, RetryPolicy};
pub use reader::read_raw_file;
