use chrono::{DateTime, Utc};
use tracing::{info, warn};

use alert_core::errors::ResolverError;
use alert_core::models::{AlertEvent, DispatchResult, FanOutReport, RunOutcome};

use crate::retry_service::RetryAdvisor;

/// 运行分类
///
/// 解析失败一律为 `TotallyFailed`；有条目但一个都没送达（包括全部跳过）为 `TotallyFailed`；
/// 没有失败时为 `FullySucceeded`（允许存在跳过，没有收件人也算）；其余为 `PartiallyFailed`。
pub fn classify(total: usize, delivered: usize, failed: usize, resolver_failed: bool) -> RunOutcome {
    if resolver_failed || (total > 0 && delivered == 0) {
        RunOutcome::TotallyFailed
    } else if failed == 0 {
        RunOutcome::FullySucceeded
    } else {
        RunOutcome::PartiallyFailed
    }
}

/// 结果汇总器：把全部终态结果归约为一份 [`FanOutReport`]
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    retry_advisor: RetryAdvisor,
}

impl ResultAggregator {
    pub fn new(retry_advisor: RetryAdvisor) -> Self {
        Self { retry_advisor }
    }

    pub fn aggregate(
        &self,
        event: &AlertEvent,
        results: Vec<DispatchResult>,
        started_at: DateTime<Utc>,
    ) -> FanOutReport {
        let total = results.len();
        let delivered = results.iter().filter(|r| r.is_delivered()).count();
        let failed = results.iter().filter(|r| r.is_failed()).count();
        let skipped = results.iter().filter(|r| r.is_skipped()).count();

        let outcome = classify(total, delivered, failed, false);
        let retry = self.retry_advisor.advise(outcome, event.attempt, &results);

        if total > 0 && delivered == 0 {
            warn!(
                "警报没有送达任何收件人: alert_id={}, total={}, failed={}, skipped={}",
                event.alert_id, total, failed, skipped
            );
        }

        info!(
            "扇出运行完成: alert_id={}, outcome={}, total={}, delivered={}, failed={}, skipped={}",
            event.alert_id,
            outcome.as_str(),
            total,
            delivered,
            failed,
            skipped
        );

        FanOutReport {
            alert_id: event.alert_id.clone(),
            user_id: event.user_id.clone(),
            total,
            delivered,
            failed,
            skipped,
            outcome,
            resolver_failure: None,
            retry,
            results,
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// 解析失败的报告：没有构造任何任务，total 为 0
    pub fn resolver_failure(
        &self,
        event: &AlertEvent,
        error: ResolverError,
        started_at: DateTime<Utc>,
    ) -> FanOutReport {
        warn!(
            "收件人解析失败，未进行任何投递: alert_id={}, error={}",
            event.alert_id, error
        );

        FanOutReport {
            alert_id: event.alert_id.clone(),
            user_id: event.user_id.clone(),
            total: 0,
            delivered: 0,
            failed: 0,
            skipped: 0,
            outcome: classify(0, 0, 0, true),
            retry: self
                .retry_advisor
                .advise_resolver_failure(&error, event.attempt),
            resolver_failure: Some(error),
            results: Vec::new(),
            started_at,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::errors::TransportError;
    use alert_core::models::{
        AlertContent, Channel, DispatchTarget, DispatchTask, RecipientRef, SkipReason,
    };
    use alert_testing_utils::AlertEventBuilder;

    fn task(channel: Channel, id: &str) -> DispatchTask {
        let target = match channel {
            Channel::Sms => DispatchTarget::Phone("+15551112222".to_string()),
            Channel::Email => DispatchTarget::Email("a@b.com".to_string()),
            Channel::Push => DispatchTarget::PushToken("tok".to_string()),
        };
        DispatchTask::new(
            RecipientRef::contact(id),
            channel,
            target,
            AlertContent {
                sender_name: None,
                message: "help".to_string(),
            },
        )
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(3, 3, 0, false), RunOutcome::FullySucceeded);
        assert_eq!(classify(4, 3, 0, false), RunOutcome::FullySucceeded);
        assert_eq!(classify(0, 0, 0, false), RunOutcome::FullySucceeded);
        assert_eq!(classify(3, 1, 2, false), RunOutcome::PartiallyFailed);
        assert_eq!(classify(2, 0, 2, false), RunOutcome::TotallyFailed);
        assert_eq!(classify(0, 0, 0, true), RunOutcome::TotallyFailed);
        // 全部跳过：没有任何人收到通知
        assert_eq!(classify(2, 0, 0, false), RunOutcome::TotallyFailed);
    }

    #[test]
    fn test_aggregate_counts() {
        let event = AlertEventBuilder::new().build();
        let results = vec![
            DispatchResult::delivered(&task(Channel::Sms, "c1"), "SM1"),
            DispatchResult::skipped(&task(Channel::Email, "c2"), SkipReason::NotImplemented),
            DispatchResult::failed(&task(Channel::Sms, "c3"), TransportError::Timeout),
            DispatchResult::no_channel(RecipientRef::contact("c4")),
        ];

        let report = ResultAggregator::default().aggregate(&event, results, Utc::now());
        assert_eq!(report.total, 4);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.outcome, RunOutcome::PartiallyFailed);
        assert!(report.is_consistent());
        assert!(report.retry.eligible);
        assert_eq!(report.retry.retryable_tasks, vec!["sms:contact/c3".to_string()]);
    }

    #[test]
    fn test_all_skipped_is_totally_failed() {
        let event = AlertEventBuilder::new().build();
        let results = vec![
            DispatchResult::skipped(&task(Channel::Email, "c1"), SkipReason::NotImplemented),
            DispatchResult::no_channel(RecipientRef::contact("c2")),
        ];

        let report = ResultAggregator::default().aggregate(&event, results, Utc::now());
        assert_eq!(report.total, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.outcome, RunOutcome::TotallyFailed);
        assert!(report.retry.eligible);
        assert!(report.retry.retryable_tasks.is_empty());
    }

    #[test]
    fn test_resolver_failure_report() {
        let event = AlertEventBuilder::new().build();
        let report = ResultAggregator::default().resolver_failure(
            &event,
            ResolverError::NotFound {
                user_id: "U1".to_string(),
            },
            Utc::now(),
        );
        assert_eq!(report.total, 0);
        assert!(report.is_resolver_failure());
        assert!(report.is_consistent());
        assert_eq!(report.outcome, RunOutcome::TotallyFailed);
        assert!(report.retry.eligible);
        assert!(report.retry.not_before.is_none());
    }
}
