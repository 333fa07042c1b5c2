// Observability: structured logging and Prometheus metrics

pub mod logging;
pub mod metrics;

pub use self::logging::init_logging;
pub use self::metrics::init_metrics;

// Metric recording functions organized by phase
pub use self::metrics::{normalize, sources, storage};
