use async_trait::async_trait;

use crate::errors::SinkError;
use crate::models::FanOutReport;

/// 观测/告警接收端。发布失败只记录日志，不影响运行结果
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn publish(&self, report: &FanOutReport) -> Result<(), SinkError>;
}
