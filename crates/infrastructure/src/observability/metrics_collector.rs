//! 警报扇出服务的指标采集
//!
//! 指标名称：
//! - `alert_fanout_runs_total{outcome}`
//! - `alert_dispatch_results_total{channel,outcome}`
//! - `alert_fanout_duration_ms`
//! - `alert_resolver_failures_total{kind}`

use metrics::{counter, histogram};

use alert_core::errors::ResolverError;
use alert_core::models::{DispatchResult, FanOutReport};

/// 按报告记录指标；未安装记录器时所有调用都不产生效果
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    /// 记录一次运行及其中每个投递结果
    pub fn record_report(&self, report: &FanOutReport) {
        counter!("alert_fanout_runs_total", "outcome" => report.outcome.as_str()).increment(1);
        histogram!("alert_fanout_duration_ms").record(report.duration_ms().max(0) as f64);

        if let Some(error) = &report.resolver_failure {
            self.record_resolver_failure(error);
        }

        for result in &report.results {
            self.record_dispatch_result(result);
        }
    }

    pub fn record_dispatch_result(&self, result: &DispatchResult) {
        let channel = result.channel.map(|c| c.as_str()).unwrap_or("none");
        counter!(
            "alert_dispatch_results_total",
            "channel" => channel,
            "outcome" => result.outcome.label()
        )
        .increment(1);
    }

    pub fn record_resolver_failure(&self, error: &ResolverError) {
        let kind = match error {
            ResolverError::NotFound { .. } => "not_found",
            ResolverError::TransportUnavailable { .. } => "transport_unavailable",
        };
        counter!("alert_resolver_failures_total", "kind" => kind).increment(1);
    }
}
