use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use alert_core::errors::{AlertError, AlertResult, StoreResult};
use alert_core::models::{Contact, Device, UserProfile};
use alert_core::traits::UserDataStore;

/// 种子文件中的一个用户
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// JSON 种子文件格式：`{"users": [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

/// 内存用户数据存储，用于本地运行和测试
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDataStore {
    users: Arc<RwLock<HashMap<String, SeedUser>>>,
}

impl InMemoryUserDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let users = seed
            .users
            .into_iter()
            .map(|user| (user.user_id.clone(), user))
            .collect();
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    pub fn from_json(content: &str) -> AlertResult<Self> {
        let seed: SeedData = serde_json::from_str(content)?;
        Ok(Self::from_seed(seed))
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> AlertResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AlertError::Configuration(format!("读取种子文件失败: {}: {e}", path.display()))
        })?;
        let store = Self::from_json(&content)?;
        info!("已从种子文件加载用户数据: {}", path.display());
        Ok(store)
    }

    /// 插入或替换一个用户
    pub async fn upsert_user(&self, user: SeedUser) {
        self.users.write().await.insert(user.user_id.clone(), user);
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserDataStore for InMemoryUserDataStore {
    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        Ok(self.users.read().await.get(user_id).map(|user| UserProfile {
            user_id: user.user_id.clone(),
            display_name: user.display_name.clone(),
        }))
    }

    async fn list_contacts(&self, user_id: &str) -> StoreResult<Vec<Contact>> {
        Ok(self
            .users
            .read()
            .await
            .get(user_id)
            .map(|user| user.contacts.clone())
            .unwrap_or_default())
    }

    async fn list_devices(&self, user_id: &str) -> StoreResult<Vec<Device>> {
        Ok(self
            .users
            .read()
            .await
            .get(user_id)
            .map(|user| user.devices.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SEED: &str = r#"{
        "users": [
            {
                "userId": "U1",
                "displayName": "Ann",
                "contacts": [
                    {"contactId": "c1", "phone": "+15551112222", "relationship": "sister"},
                    {"contactId": "c2", "email": "a@b.com"}
                ],
                "devices": [{"deviceId": "d1", "pushToken": "tok1"}]
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_seeded_store() {
        let store = InMemoryUserDataStore::from_json(SEED).unwrap();

        let profile = store.get_profile("U1").await.unwrap().unwrap();
        assert_eq!(profile.display_name(), Some("Ann"));

        let contacts = store.list_contacts("U1").await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].relationship.as_deref(), Some("sister"));
        assert_eq!(contacts[1].email(), Some("a@b.com"));

        assert_eq!(store.list_devices("U1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = InMemoryUserDataStore::new();
        assert!(store.get_profile("nobody").await.unwrap().is_none());
        assert!(store.list_contacts("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let store = InMemoryUserDataStore::from_seed_file(file.path()).unwrap();
        assert_eq!(store.user_count().await, 1);

        assert!(InMemoryUserDataStore::from_seed_file("/nonexistent/seed.json").is_err());
    }

    #[tokio::test]
    async fn test_upsert_user() {
        let store = InMemoryUserDataStore::new();
        store
            .upsert_user(SeedUser {
                user_id: "U2".to_string(),
                display_name: None,
                contacts: vec![],
                devices: vec![],
            })
            .await;
        assert!(store.get_profile("U2").await.unwrap().is_some());
    }
}
