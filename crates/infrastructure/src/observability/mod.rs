//! 扇出报告的观测接收端：结构化日志和 Prometheus 指标

pub mod metrics_collector;
pub mod report_sink;

pub use metrics_collector::MetricsCollector;
pub use report_sink::ObservabilityReportSink;
