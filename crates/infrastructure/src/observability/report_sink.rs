use async_trait::async_trait;
use tracing::{error, info, warn};

use alert_core::errors::SinkError;
use alert_core::models::{FanOutReport, RunOutcome};
use alert_core::traits::ReportSink;

use super::MetricsCollector;

/// 把报告写入结构化日志并记录指标
///
/// 逐个收件人的技术细节只出现在这里的日志中。
#[derive(Debug, Clone, Default)]
pub struct ObservabilityReportSink {
    metrics: Option<MetricsCollector>,
}

impl ObservabilityReportSink {
    pub fn new(metrics_enabled: bool) -> Self {
        Self {
            metrics: metrics_enabled.then(MetricsCollector::new),
        }
    }
}

#[async_trait]
impl ReportSink for ObservabilityReportSink {
    async fn publish(&self, report: &FanOutReport) -> Result<(), SinkError> {
        if let Some(metrics) = &self.metrics {
            metrics.record_report(report);
        }

        if let Some(failure) = &report.resolver_failure {
            error!(
                alert_id = %report.alert_id,
                user_id = %report.user_id,
                retry_eligible = report.retry.eligible,
                error = %failure,
                "收件人解析失败，警报扇出中止"
            );
            return Ok(());
        }

        for result in report.results.iter().filter(|r| r.is_failed()) {
            if let Some(transport_error) = result.transport_error() {
                warn!(
                    alert_id = %report.alert_id,
                    task_id = %result.task_id,
                    error_kind = transport_error.kind(),
                    error = %transport_error,
                    "投递失败"
                );
            }
        }

        let not_before = report.retry.not_before.map(|t| t.to_rfc3339());
        match report.outcome {
            RunOutcome::FullySucceeded => info!(
                alert_id = %report.alert_id,
                total = report.total,
                delivered = report.delivered,
                skipped = report.skipped,
                duration_ms = report.duration_ms(),
                "警报扇出完成"
            ),
            RunOutcome::PartiallyFailed | RunOutcome::TotallyFailed => warn!(
                alert_id = %report.alert_id,
                outcome = report.outcome.as_str(),
                total = report.total,
                delivered = report.delivered,
                failed = report.failed,
                skipped = report.skipped,
                retryable_tasks = report.retry.retryable_tasks.len(),
                not_before = ?not_before,
                duration_ms = report.duration_ms(),
                "警报扇出完成，存在未送达的收件人"
            ),
        }

        Ok(())
    }
}
