use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DispatchResult;
use crate::errors::ResolverError;

/// 整次运行的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    FullySucceeded,
    PartiallyFailed,
    TotallyFailed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::FullySucceeded => "fully_succeeded",
            RunOutcome::PartiallyFailed => "partially_failed",
            RunOutcome::TotallyFailed => "totally_failed",
        }
    }

    pub fn needs_retry(&self) -> bool {
        !matches!(self, RunOutcome::FullySucceeded)
    }
}

/// 给上游重投机制的建议
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryAdvice {
    pub eligible: bool,
    pub retryable_tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
}

/// 管道的最终产物，每个警报事件一份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanOutReport {
    pub alert_id: String,
    pub user_id: String,
    pub total: usize,
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcome: RunOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver_failure: Option<ResolverError>,
    pub retry: RetryAdvice,
    pub results: Vec<DispatchResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl FanOutReport {
    pub fn is_resolver_failure(&self) -> bool {
        self.resolver_failure.is_some()
    }

    /// delivered + failed + skipped == total == results.len()
    pub fn is_consistent(&self) -> bool {
        self.delivered + self.failed + self.skipped == self.total
            && self.results.len() == self.total
    }

    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }

    /// 触发方只能看到汇总，不包含逐个收件人的技术细节
    pub fn redacted(&self) -> Self {
        Self {
            resolver_failure: self.resolver_failure.as_ref().map(ResolverError::redacted),
            results: self.results.iter().map(DispatchResult::redacted).collect(),
            ..self.clone()
        }
    }
}

/// 返回给触发方的确认：success 只表示处理已完成
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertAck {
    pub success: bool,
    pub report: FanOutReport,
}

impl AlertAck {
    pub fn from_report(report: FanOutReport) -> Self {
        Self {
            success: !report.is_resolver_failure(),
            report,
        }
    }

    pub fn redacted(&self) -> Self {
        Self {
            success: self.success,
            report: self.report.redacted(),
        }
    }
}
