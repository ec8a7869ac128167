//! 警报相关实体的测试数据构建器
//!
//! 构建器自带合理的默认值，测试只需设置关心的字段。

use chrono::{DateTime, Utc};

use alert_core::models::{AlertEvent, Contact, Device, UserProfile};

/// 测试用 AlertEvent 构建器
pub struct AlertEventBuilder {
    event: AlertEvent,
}

impl AlertEventBuilder {
    pub fn new() -> Self {
        Self {
            event: AlertEvent::new("alert-1", "U1"),
        }
    }

    pub fn with_alert_id(mut self, alert_id: &str) -> Self {
        self.event.alert_id = alert_id.to_string();
        self
    }

    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.event.user_id = user_id.to_string();
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.event.message = Some(message.to_string());
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.event.attempt = attempt;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.event.created_at = created_at;
        self
    }

    pub fn build(self) -> AlertEvent {
        self.event
    }
}

impl Default for AlertEventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 测试用 Contact 构建器
///
/// 新建的构建器既没有手机号也没有邮箱，即不可触达。
pub struct ContactBuilder {
    contact: Contact,
}

impl ContactBuilder {
    pub fn new(contact_id: &str) -> Self {
        Self {
            contact: Contact {
                contact_id: contact_id.to_string(),
                name: None,
                phone: None,
                email: None,
                relationship: None,
            },
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.contact.name = Some(name.to_string());
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.contact.phone = Some(phone.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.contact.email = Some(email.to_string());
        self
    }

    pub fn with_relationship(mut self, relationship: &str) -> Self {
        self.contact.relationship = Some(relationship.to_string());
        self
    }

    pub fn build(self) -> Contact {
        self.contact
    }
}

/// 测试用 Device 构建器
pub struct DeviceBuilder {
    device: Device,
}

impl DeviceBuilder {
    pub fn new(device_id: &str) -> Self {
        Self {
            device: Device {
                device_id: device_id.to_string(),
                push_token: None,
            },
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.device.push_token = Some(token.to_string());
        self
    }

    pub fn build(self) -> Device {
        self.device
    }
}

pub fn profile(user_id: &str, display_name: Option<&str>) -> UserProfile {
    UserProfile {
        user_id: user_id.to_string(),
        display_name: display_name.map(str::to_string),
    }
}
