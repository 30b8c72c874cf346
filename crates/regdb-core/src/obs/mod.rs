//! Observability: write-path counters and the sink abstraction.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::MetricsReport;
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset, with_metrics_sink};
