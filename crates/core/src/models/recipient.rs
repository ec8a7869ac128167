use serde::{Deserialize, Serialize};

/// 触发用户的资料快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> Option<&str> {
        non_blank(self.display_name.as_deref())
    }
}

/// 紧急联系人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub contact_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
}

impl Contact {
    pub fn phone(&self) -> Option<&str> {
        non_blank(self.phone.as_deref())
    }

    pub fn email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    /// 至少有一个可用渠道
    pub fn is_actionable(&self) -> bool {
        self.phone().is_some() || self.email().is_some()
    }
}

/// 用户自己注册的设备
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub push_token: Option<String>,
}

impl Device {
    pub fn push_token(&self) -> Option<&str> {
        non_blank(self.push_token.as_deref())
    }
}

/// 一次运行开始时解析出的完整收件人集合，运行期间不再变化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientSet {
    pub profile: UserProfile,
    pub contacts: Vec<Contact>,
    pub devices: Vec<Device>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_absent() {
        let contact = Contact {
            contact_id: "c1".to_string(),
            name: None,
            phone: Some("  ".to_string()),
            email: Some(String::new()),
            relationship: None,
        };
        assert_eq!(contact.phone(), None);
        assert_eq!(contact.email(), None);
        assert!(!contact.is_actionable());

        let device = Device {
            device_id: "d1".to_string(),
            push_token: Some("".to_string()),
        };
        assert_eq!(device.push_token(), None);
    }
}
