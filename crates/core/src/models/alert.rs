use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AlertError, AlertResult};

/// 未提供消息时使用的默认求助内容
pub const DEFAULT_ALERT_MESSAGE: &str = "I need help";

/// 触发扇出的警报事件，由上游存储创建，管道内只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub alert_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// 上游投递次数，从1开始
    #[serde(default = "first_attempt")]
    pub attempt: u32,
}

fn first_attempt() -> u32 {
    1
}

impl AlertEvent {
    pub fn new(alert_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            alert_id: alert_id.into(),
            user_id: user_id.into(),
            message: None,
            created_at: Utc::now(),
            attempt: 1,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    /// 警报正文，空白消息回退为默认内容
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_ALERT_MESSAGE)
    }

    pub fn validate(&self) -> AlertResult<()> {
        if self.alert_id.trim().is_empty() {
            return Err(AlertError::InvalidEvent("alertId 不能为空".to_string()));
        }
        if self.user_id.trim().is_empty() {
            return Err(AlertError::InvalidEvent("userId 不能为空".to_string()));
        }
        if self.attempt == 0 {
            return Err(AlertError::InvalidEvent("attempt 必须从1开始".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_defaults() {
        let event = AlertEvent::new("a1", "U1");
        assert_eq!(event.message(), DEFAULT_ALERT_MESSAGE);

        let event = AlertEvent::new("a1", "U1").with_message("   ");
        assert_eq!(event.message(), DEFAULT_ALERT_MESSAGE);

        let event = AlertEvent::new("a1", "U1").with_message("call me");
        assert_eq!(event.message(), "call me");
    }

    #[test]
    fn test_deserialize_minimal_event() {
        let event: AlertEvent =
            serde_json::from_str(r#"{"alertId":"a1","userId":"U1"}"#).unwrap();
        assert_eq!(event.alert_id, "a1");
        assert_eq!(event.user_id, "U1");
        assert_eq!(event.attempt, 1);
        assert_eq!(event.message(), "I need help");
    }

    #[test]
    fn test_validate_rejects_blank_ids() {
        assert!(AlertEvent::new("", "U1").validate().is_err());
        assert!(AlertEvent::new("a1", " ").validate().is_err());
        assert!(AlertEvent::new("a1", "U1").with_attempt(0).validate().is_err());
        assert!(AlertEvent::new("a1", "U1").validate().is_ok());
    }
}
