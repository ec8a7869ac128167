use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use alert_core::config::AppConfig;
use alert_core::errors::{AlertError, AlertResult};
use alert_core::models::{AlertAck, AlertEvent, FanOutReport};
use alert_core::traits::{ChannelDispatcher, PushTransport, ReportSink, SmsTransport, UserDataStore};

use crate::aggregator::ResultAggregator;
use crate::channels::{EmailDispatcher, PushDispatcher, SmsDispatcher};
use crate::coordinator::FanOutCoordinator;
use crate::dedup::{DuplicateGuard, DuplicateKind};
use crate::resolver::RecipientResolver;
use crate::retry_service::RetryAdvisor;

/// 警报处理管道：去重 → 解析收件人 → 扇出投递 → 汇总 → 发布报告
pub struct AlertPipeline {
    stages: Arc<PipelineStages>,
    guard: DuplicateGuard,
}

/// 去重之后的各个阶段，整体放进独立的 tokio 任务执行
struct PipelineStages {
    resolver: RecipientResolver,
    coordinator: FanOutCoordinator,
    aggregator: ResultAggregator,
    sink: Arc<dyn ReportSink>,
}

impl AlertPipeline {
    pub fn new(
        resolver: RecipientResolver,
        coordinator: FanOutCoordinator,
        aggregator: ResultAggregator,
        sink: Arc<dyn ReportSink>,
        guard: DuplicateGuard,
    ) -> Self {
        Self {
            stages: Arc::new(PipelineStages {
                resolver,
                coordinator,
                aggregator,
                sink,
            }),
            guard,
        }
    }

    /// 用配置和外部协作者组装完整管道
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn UserDataStore>,
        sms: Arc<dyn SmsTransport>,
        push: Arc<dyn PushTransport>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        let dispatchers: Vec<Arc<dyn ChannelDispatcher>> = vec![
            Arc::new(SmsDispatcher::new(sms, config.sms.sender_number.clone())),
            Arc::new(PushDispatcher::new(push)),
            Arc::new(EmailDispatcher::new()),
        ];

        Self::new(
            RecipientResolver::new(store),
            FanOutCoordinator::new(dispatchers, &config.dispatch),
            ResultAggregator::new(RetryAdvisor::new(config.retry.clone())),
            sink,
            DuplicateGuard::new(config.dedup.window()),
        )
    }

    /// 处理一个警报事件直到所有投递任务结束
    ///
    /// 解析失败不会作为 `Err` 返回，而是返回 `success = false` 的确认，报告中带有解析失败标记。
    /// `Err` 只用于无效事件和重复投递，两者都发生在任何投递开始之前。
    ///
    /// 通过去重后，解析、扇出、汇总和发布在一个独立任务中完成：调用方的 future 被丢弃时，
    /// 排队中的投递任务照常执行，报告照常发布。
    pub async fn handle(&self, event: AlertEvent) -> AlertResult<AlertAck> {
        event.validate()?;

        let permit = match self.guard.try_acquire(&event.alert_id) {
            Ok(permit) => permit,
            Err(kind) => {
                match kind {
                    DuplicateKind::InFlight => {
                        warn!("警报正在处理中，忽略重复投递: alert_id={}", event.alert_id)
                    }
                    DuplicateKind::RecentlySucceeded { completed_at } => warn!(
                        "警报已在 {} 成功处理，忽略重复投递: alert_id={}",
                        completed_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        event.alert_id
                    ),
                }
                return Err(AlertError::Duplicate {
                    alert_id: event.alert_id,
                });
            }
        };

        info!(
            "开始处理警报: alert_id={}, user_id={}, attempt={}",
            event.alert_id, event.user_id, event.attempt
        );

        let alert_id = event.alert_id.clone();
        let stages = Arc::clone(&self.stages);
        let run = tokio::spawn(async move {
            let report = stages.process(&event).await;
            permit.complete(report.outcome);
            stages.publish(&report).await;
            report
        });

        let report = run.await.map_err(|e| {
            error!("警报处理任务异常终止: alert_id={}, error={}", alert_id, e);
            AlertError::Internal(format!("警报处理任务异常终止: {e}"))
        })?;

        Ok(AlertAck::from_report(report))
    }

    /// 不经过去重直接执行一次完整运行，重复调用是安全的
    pub async fn process(&self, event: &AlertEvent) -> FanOutReport {
        self.stages.process(event).await
    }
}

impl PipelineStages {
    async fn process(&self, event: &AlertEvent) -> FanOutReport {
        let started_at = Utc::now();

        match self.resolver.resolve(&event.user_id).await {
            Ok(recipients) => {
                let results = self.coordinator.run(event, &recipients).await;
                self.aggregator.aggregate(event, results, started_at)
            }
            Err(e) => self.aggregator.resolver_failure(event, e, started_at),
        }
    }

    async fn publish(&self, report: &FanOutReport) {
        if let Err(e) = self.sink.publish(report).await {
            error!("发布扇出报告失败: alert_id={}, error={}", report.alert_id, e);
        }
    }
}
