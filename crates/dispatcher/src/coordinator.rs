//! 扇出协调器
//!
//! 把解析出的收件人集合展开为完整的任务清单，并以有界并发执行。
//! 每个计划条目恰好产生一个结果，返回顺序与计划顺序一致，与完成顺序无关。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use alert_core::config::DispatchConfig;
use alert_core::errors::TransportError;
use alert_core::models::{
    AlertContent, AlertEvent, Channel, DispatchResult, DispatchTarget, DispatchTask,
    RecipientRef, RecipientSet, SkipReason,
};
use alert_core::traits::ChannelDispatcher;

/// 扇出计划中的一个条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEntry {
    Dispatch(DispatchTask),
    /// 没有任何可用渠道的收件人：计入报告，但不会尝试投递
    NoChannel(RecipientRef),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutPlan {
    pub entries: Vec<PlanEntry>,
}

impl FanOutPlan {
    /// 为一个警报事件生成计划
    ///
    /// 联系人：有电话生成短信任务，有邮箱生成邮件任务，两者都没有时生成一个 NoChannel 条目。
    /// 设备：有令牌生成推送任务，否则生成 NoChannel 条目。先联系人后设备，均保持解析顺序。
    pub fn build(event: &AlertEvent, recipients: &RecipientSet) -> Self {
        let content = AlertContent {
            sender_name: recipients.profile.display_name().map(str::to_string),
            message: event.message().to_string(),
        };
        let mut entries = Vec::new();

        for contact in &recipients.contacts {
            let recipient = RecipientRef::contact(&contact.contact_id);
            if !contact.is_actionable() {
                entries.push(PlanEntry::NoChannel(recipient));
                continue;
            }
            if let Some(phone) = contact.phone() {
                entries.push(PlanEntry::Dispatch(DispatchTask::new(
                    recipient.clone(),
                    Channel::Sms,
                    DispatchTarget::Phone(phone.to_string()),
                    content.clone(),
                )));
            }
            if let Some(email) = contact.email() {
                entries.push(PlanEntry::Dispatch(DispatchTask::new(
                    recipient,
                    Channel::Email,
                    DispatchTarget::Email(email.to_string()),
                    content.clone(),
                )));
            }
        }

        for device in &recipients.devices {
            let recipient = RecipientRef::device(&device.device_id);
            match device.push_token() {
                Some(token) => entries.push(PlanEntry::Dispatch(DispatchTask::new(
                    recipient,
                    Channel::Push,
                    DispatchTarget::PushToken(token.to_string()),
                    content.clone(),
                ))),
                None => entries.push(PlanEntry::NoChannel(recipient)),
            }
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn task_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, PlanEntry::Dispatch(_)))
            .count()
    }
}

pub struct FanOutCoordinator {
    dispatchers: HashMap<Channel, Arc<dyn ChannelDispatcher>>,
    concurrency_limit: usize,
    attempt_timeout: Duration,
}

impl FanOutCoordinator {
    pub fn new(dispatchers: Vec<Arc<dyn ChannelDispatcher>>, config: &DispatchConfig) -> Self {
        let dispatchers = dispatchers
            .into_iter()
            .map(|dispatcher| (dispatcher.channel(), dispatcher))
            .collect();
        Self {
            dispatchers,
            concurrency_limit: config.concurrency_limit.max(1),
            attempt_timeout: config.timeout(),
        }
    }

    /// 生成计划并执行
    pub async fn run(&self, event: &AlertEvent, recipients: &RecipientSet) -> Vec<DispatchResult> {
        let plan = FanOutPlan::build(event, recipients);
        if plan.is_empty() {
            info!("用户没有登记任何联系人或设备，不进行投递: alert_id={}", event.alert_id);
            return Vec::new();
        }
        info!(
            "开始扇出投递: alert_id={}, entries={}, tasks={}, concurrency_limit={}",
            event.alert_id,
            plan.len(),
            plan.task_count(),
            self.concurrency_limit
        );
        self.execute(plan).await
    }

    /// 等待每个条目都产生终态结果，不会因为首个成功或首个失败提前返回
    pub async fn execute(&self, plan: FanOutPlan) -> Vec<DispatchResult> {
        let mut results: Vec<(usize, DispatchResult)> =
            stream::iter(plan.entries.into_iter().enumerate())
                .map(|(index, entry)| async move {
                    let result = match entry {
                        PlanEntry::NoChannel(recipient) => {
                            debug!("收件人没有可用渠道，跳过: recipient={}", recipient);
                            DispatchResult::no_channel(recipient)
                        }
                        PlanEntry::Dispatch(task) => self.run_task(task).await,
                    };
                    (index, result)
                })
                .buffer_unordered(self.concurrency_limit)
                .collect()
                .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }

    /// 每次投递尝试在独立的 tokio 任务中执行，panic 和超时都归约为失败结果
    async fn run_task(&self, task: DispatchTask) -> DispatchResult {
        let Some(dispatcher) = self.dispatchers.get(&task.channel).cloned() else {
            warn!(
                "未注册渠道分发器，跳过: task_id={}, channel={}",
                task.task_id, task.channel
            );
            return DispatchResult::skipped(&task, SkipReason::NotImplemented);
        };

        let attempt_timeout = self.attempt_timeout;
        let spawned_task = task.clone();
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(attempt_timeout, dispatcher.dispatch(&spawned_task)).await
            {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        "投递尝试超时: task_id={}, timeout_ms={}",
                        spawned_task.task_id,
                        attempt_timeout.as_millis()
                    );
                    DispatchResult::failed(&spawned_task, TransportError::Timeout)
                }
            }
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                error!("投递任务异常终止: task_id={}, error={}", task.task_id, e);
                DispatchResult::failed(
                    &task,
                    TransportError::unknown(format!("投递任务异常终止: {e}")),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_core::models::{Contact, Device, UserProfile};
    use alert_testing_utils::{profile, AlertEventBuilder, ContactBuilder, DeviceBuilder};

    fn recipients(contacts: Vec<Contact>, devices: Vec<Device>) -> RecipientSet {
        let profile: UserProfile = profile("U1", Some("Ann"));
        RecipientSet {
            profile,
            contacts,
            devices,
        }
    }

    fn task_ids(plan: &FanOutPlan) -> Vec<String> {
        plan.entries
            .iter()
            .map(|entry| match entry {
                PlanEntry::Dispatch(task) => task.task_id.clone(),
                PlanEntry::NoChannel(recipient) => format!("none:{recipient}"),
            })
            .collect()
    }

    #[test]
    fn test_plan_orders_contacts_then_devices() {
        let event = AlertEventBuilder::new().with_message("call me").build();
        let set = recipients(
            vec![
                ContactBuilder::new("c1")
                    .with_phone("+15551112222")
                    .with_email("x@y.com")
                    .build(),
                ContactBuilder::new("c2").build(),
                ContactBuilder::new("c3").with_email("a@b.com").build(),
            ],
            vec![
                DeviceBuilder::new("d1").with_token("tok1").build(),
                DeviceBuilder::new("d2").build(),
            ],
        );

        let plan = FanOutPlan::build(&event, &set);
        assert_eq!(
            task_ids(&plan),
            vec![
                "sms:contact/c1",
                "email:contact/c1",
                "none:contact/c2",
                "email:contact/c3",
                "push:device/d1",
                "none:device/d2",
            ]
        );
        assert_eq!(plan.task_count(), 4);
    }

    #[test]
    fn test_plan_content() {
        let event = AlertEventBuilder::new().build();
        let set = recipients(
            vec![ContactBuilder::new("c1").with_phone("+15551112222").build()],
            vec![],
        );
        let plan = FanOutPlan::build(&event, &set);
        let PlanEntry::Dispatch(task) = &plan.entries[0] else {
            panic!("第一个条目应当是投递任务");
        };
        assert_eq!(task.content.message, "I need help");
        assert_eq!(task.content.sender_name.as_deref(), Some("Ann"));
    }

    #[tokio::test]
    async fn test_empty_plan_yields_no_results() {
        let event = AlertEventBuilder::new().build();
        let set = recipients(vec![], vec![]);
        assert!(FanOutPlan::build(&event, &set).is_empty());

        let coordinator = FanOutCoordinator::new(Vec::new(), &DispatchConfig::default());
        assert!(coordinator.run(&event, &set).await.is_empty());
    }

    #[test]
    fn test_plan_is_deterministic() {
        let event = AlertEventBuilder::new().build();
        let set = recipients(
            vec![ContactBuilder::new("c1").with_phone("+15551112222").build()],
            vec![DeviceBuilder::new("d1").with_token("tok1").build()],
        );
        assert_eq!(
            FanOutPlan::build(&event, &set),
            FanOutPlan::build(&event, &set)
        );
    }
}
