use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::TransportError;

/// 投递渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Sms,
    Push,
    Email,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Sms => "sms",
            Channel::Push => "push",
            Channel::Email => "email",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    Contact,
    Device,
}

impl RecipientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientKind::Contact => "contact",
            RecipientKind::Device => "device",
        }
    }
}

/// 指向联系人或设备的引用
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipientRef {
    pub kind: RecipientKind,
    pub id: String,
}

impl RecipientRef {
    pub fn contact(id: impl Into<String>) -> Self {
        Self {
            kind: RecipientKind::Contact,
            id: id.into(),
        }
    }

    pub fn device(id: impl Into<String>) -> Self {
        Self {
            kind: RecipientKind::Device,
            id: id.into(),
        }
    }
}

impl fmt::Display for RecipientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.id)
    }
}

/// 已解析好的投递地址
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DispatchTarget {
    Phone(String),
    Email(String),
    PushToken(String),
}

/// 警报内容，由各渠道自行格式化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertContent {
    pub sender_name: Option<String>,
    pub message: String,
}

/// 一次扇出运行内的单个投递任务，不持久化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTask {
    pub task_id: String,
    pub recipient: RecipientRef,
    pub channel: Channel,
    pub target: DispatchTarget,
    pub content: AlertContent,
}

impl DispatchTask {
    pub fn new(
        recipient: RecipientRef,
        channel: Channel,
        target: DispatchTarget,
        content: AlertContent,
    ) -> Self {
        Self {
            task_id: task_id_for(channel.as_str(), &recipient),
            recipient,
            channel,
            target,
            content,
        }
    }
}

/// 任务ID由渠道和收件人确定，重跑同一收件人集合得到相同ID
pub fn task_id_for(channel: &str, recipient: &RecipientRef) -> String {
    format!("{channel}:{recipient}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// 收件人没有任何可用字段
    NoChannel,
    /// 渠道尚未实现
    NotImplemented,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoChannel => "no_channel",
            SkipReason::NotImplemented => "not_implemented",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Delivered {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receipt: Option<String>,
    },
    Failed {
        error: TransportError,
    },
    Skipped {
        reason: SkipReason,
    },
}

impl DispatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Delivered { .. } => "delivered",
            DispatchOutcome::Failed { .. } => "failed",
            DispatchOutcome::Skipped { .. } => "skipped",
        }
    }
}

/// 单个任务的终态结果，产生后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub task_id: String,
    /// NoChannel 条目没有渠道
    pub channel: Option<Channel>,
    pub recipient: RecipientRef,
    pub outcome: DispatchOutcome,
    pub attempted_at: DateTime<Utc>,
}

impl DispatchResult {
    pub fn delivered(task: &DispatchTask, receipt: impl Into<String>) -> Self {
        Self::for_task(
            task,
            DispatchOutcome::Delivered {
                receipt: Some(receipt.into()),
            },
        )
    }

    pub fn failed(task: &DispatchTask, error: TransportError) -> Self {
        Self::for_task(task, DispatchOutcome::Failed { error })
    }

    pub fn skipped(task: &DispatchTask, reason: SkipReason) -> Self {
        Self::for_task(task, DispatchOutcome::Skipped { reason })
    }

    /// 没有任何可用渠道的收件人，不会产生投递尝试
    pub fn no_channel(recipient: RecipientRef) -> Self {
        Self {
            task_id: task_id_for("none", &recipient),
            channel: None,
            recipient,
            outcome: DispatchOutcome::Skipped {
                reason: SkipReason::NoChannel,
            },
            attempted_at: Utc::now(),
        }
    }

    fn for_task(task: &DispatchTask, outcome: DispatchOutcome) -> Self {
        Self {
            task_id: task.task_id.clone(),
            channel: Some(task.channel),
            recipient: task.recipient.clone(),
            outcome,
            attempted_at: Utc::now(),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Delivered { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, DispatchOutcome::Skipped { .. })
    }

    pub fn transport_error(&self) -> Option<&TransportError> {
        match &self.outcome {
            DispatchOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// 去掉回执和传输细节
    pub fn redacted(&self) -> Self {
        let outcome = match &self.outcome {
            DispatchOutcome::Delivered { .. } => DispatchOutcome::Delivered { receipt: None },
            DispatchOutcome::Failed { error } => DispatchOutcome::Failed {
                error: error.redacted(),
            },
            DispatchOutcome::Skipped { reason } => DispatchOutcome::Skipped { reason: *reason },
        };
        Self {
            outcome,
            ..self.clone()
        }
    }
}
