//! 渠道分发器
//!
//! 每个分发器对一个目标做恰好一次投递尝试，传输失败一律转换为
//! `Failed` 结果返回，不会影响同一次运行中的其他收件人。

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use alert_core::errors::TransportError;
use alert_core::models::{AlertContent, Channel, DispatchResult, DispatchTarget, DispatchTask, SkipReason};
use alert_core::traits::{ChannelDispatcher, PushTransport, SmsTransport};

pub const PUSH_TITLE: &str = "Emergency Alert Activated";
pub const PUSH_BODY: &str = "Your emergency contacts have been notified. Help is on the way.";
const ANONYMOUS_SENDER: &str = "A user";

/// 发给紧急联系人的短信正文
pub fn format_sms_body(content: &AlertContent) -> String {
    let sender = content
        .sender_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS_SENDER);
    format!(
        "EMERGENCY ALERT from {}: {}. Please check on them immediately.",
        sender, content.message
    )
}

/// 规范化为 E.164 格式：去掉空格、短横线、点和括号后，`+` 加 8-15 位数字且首位非0
pub fn normalize_e164(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    let digits = cleaned.strip_prefix('+')?;
    let valid = (8..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0');
    valid.then_some(cleaned)
}

fn mismatched_target(task: &DispatchTask) -> DispatchResult {
    warn!(
        "投递目标与渠道不匹配: task_id={}, channel={}",
        task.task_id, task.channel
    );
    DispatchResult::failed(
        task,
        TransportError::invalid_target(format!("{} 渠道不支持该目标类型", task.channel)),
    )
}

/// 短信分发器
pub struct SmsDispatcher {
    transport: Arc<dyn SmsTransport>,
    sender_number: String,
}

impl SmsDispatcher {
    pub fn new(transport: Arc<dyn SmsTransport>, sender_number: impl Into<String>) -> Self {
        Self {
            transport,
            sender_number: sender_number.into(),
        }
    }
}

#[async_trait]
impl ChannelDispatcher for SmsDispatcher {
    async fn dispatch(&self, task: &DispatchTask) -> DispatchResult {
        let DispatchTarget::Phone(phone) = &task.target else {
            return mismatched_target(task);
        };

        let Some(to) = normalize_e164(phone) else {
            warn!(
                "联系人电话号码不是有效的E.164格式: task_id={}",
                task.task_id
            );
            return DispatchResult::failed(
                task,
                TransportError::invalid_target("电话号码不是有效的E.164格式"),
            );
        };

        let body = format_sms_body(&task.content);
        debug!(
            "发送紧急短信: task_id={}, transport={}",
            task.task_id,
            self.transport.name()
        );

        match self.transport.send(&self.sender_number, &to, &body).await {
            Ok(message_id) => {
                debug!("短信已接受: task_id={}, message_id={}", task.task_id, message_id);
                DispatchResult::delivered(task, message_id)
            }
            Err(e) => {
                warn!("短信发送失败: task_id={}, error={}", task.task_id, e);
                DispatchResult::failed(task, e)
            }
        }
    }

    fn channel(&self) -> Channel {
        Channel::Sms
    }
}

/// 推送分发器，发往触发用户自己的设备
///
/// 推送内容固定，不包含警报原文，避免原文出现在锁屏通知栏。
pub struct PushDispatcher {
    transport: Arc<dyn PushTransport>,
}

impl PushDispatcher {
    pub fn new(transport: Arc<dyn PushTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ChannelDispatcher for PushDispatcher {
    async fn dispatch(&self, task: &DispatchTask) -> DispatchResult {
        let DispatchTarget::PushToken(token) = &task.target else {
            return mismatched_target(task);
        };

        match self.transport.send(token, PUSH_TITLE, PUSH_BODY).await {
            Ok(receipt) => {
                debug!("推送已接受: task_id={}, receipt={}", task.task_id, receipt);
                DispatchResult::delivered(task, receipt)
            }
            Err(e) => {
                warn!("推送发送失败: task_id={}, error={}", task.task_id, e);
                DispatchResult::failed(task, e)
            }
        }
    }

    fn channel(&self) -> Channel {
        Channel::Push
    }
}

/// 邮件分发器占位实现：每个任务都记为 `Skipped(NotImplemented)`
#[derive(Debug, Default)]
pub struct EmailDispatcher;

impl EmailDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChannelDispatcher for EmailDispatcher {
    async fn dispatch(&self, task: &DispatchTask) -> DispatchResult {
        debug!("邮件渠道尚未实现，跳过: task_id={}", task.task_id);
        DispatchResult::skipped(task, SkipReason::NotImplemented)
    }

    fn channel(&self) -> Channel {
        Channel::Email
    }
}
