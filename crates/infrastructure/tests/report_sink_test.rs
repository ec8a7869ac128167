use chrono::Utc;

use alert_core::errors::{ResolverError, TransportError};
use alert_core::models::{
    AlertContent, Channel, DispatchResult, DispatchTarget, DispatchTask, FanOutReport,
    RecipientRef, RetryAdvice, RunOutcome,
};
use alert_core::traits::ReportSink;
use alert_infrastructure::ObservabilityReportSink;

fn report(outcome: RunOutcome, results: Vec<DispatchResult>) -> FanOutReport {
    let delivered = results.iter().filter(|r| r.is_delivered()).count();
    let failed = results.iter().filter(|r| r.is_failed()).count();
    FanOutReport {
        alert_id: "a1".to_string(),
        user_id: "U1".to_string(),
        total: results.len(),
        delivered,
        failed,
        skipped: results.len() - delivered - failed,
        outcome,
        resolver_failure: None,
        retry: RetryAdvice::default(),
        results,
        started_at: Utc::now(),
        completed_at: Utc::now(),
    }
}

fn sms_task() -> DispatchTask {
    DispatchTask::new(
        RecipientRef::contact("c1"),
        Channel::Sms,
        DispatchTarget::Phone("+15551112222".to_string()),
        AlertContent {
            sender_name: None,
            message: "help".to_string(),
        },
    )
}

#[tokio::test]
async fn test_publish_never_fails() {
    for metrics_enabled in [true, false] {
        let sink = ObservabilityReportSink::new(metrics_enabled);

        let ok = report(
            RunOutcome::FullySucceeded,
            vec![DispatchResult::delivered(&sms_task(), "SM1")],
        );
        assert!(sink.publish(&ok).await.is_ok());

        let failed = report(
            RunOutcome::TotallyFailed,
            vec![DispatchResult::failed(&sms_task(), TransportError::Timeout)],
        );
        assert!(sink.publish(&failed).await.is_ok());

        let mut resolver = report(RunOutcome::TotallyFailed, vec![]);
        resolver.resolver_failure = Some(ResolverError::NotFound {
            user_id: "U1".to_string(),
        });
        assert!(sink.publish(&resolver).await.is_ok());
    }
}
